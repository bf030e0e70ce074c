//! Push key - 20 character, lexicographically ordered child key
//!
//! Structure:
//! - Chars 0-7:  Timestamp (milliseconds since Unix epoch, base-64 alphabet)
//! - Chars 8-19: Random suffix, incremented when two keys share a millisecond
//!
//! The alphabet is ordered by ASCII value, so comparing two keys as strings
//! compares their creation order.

use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Alphabet used for push keys, in ASCII order
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIMESTAMP_LEN: usize = 8;
const RANDOM_LEN: usize = 12;

/// Server-style push key for uniquely keyed, ordered children
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PushKey(String);

impl PushKey {
    /// Total length of a generated key
    pub const LEN: usize = TIMESTAMP_LEN + RANDOM_LEN;

    /// Get the key as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the creation timestamp (milliseconds since Unix epoch)
    ///
    /// Returns `None` for keys that were not produced by a generator.
    pub fn timestamp_millis(&self) -> Option<i64> {
        if self.0.len() != Self::LEN {
            return None;
        }
        self.0.as_bytes()[..TIMESTAMP_LEN]
            .iter()
            .try_fold(0i64, |acc, byte| {
                let digit = PUSH_CHARS.iter().position(|c| c == byte)?;
                Some(acc * 64 + digit as i64)
            })
    }
}

impl fmt::Display for PushKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PushKey> for String {
    fn from(key: PushKey) -> Self {
        key.0
    }
}

impl AsRef<str> for PushKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
struct GeneratorState {
    last_millis: i64,
    random: [u8; RANDOM_LEN],
}

/// Thread-safe push key generator
///
/// Keys from one generator are strictly increasing, even when the wall clock
/// moves backwards or several keys are produced in the same millisecond.
#[derive(Debug)]
pub struct PushKeyGenerator {
    state: Mutex<GeneratorState>,
}

impl PushKeyGenerator {
    /// Create a new generator
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GeneratorState {
                last_millis: -1,
                random: [0; RANDOM_LEN],
            }),
        }
    }

    /// Generate a new unique push key
    pub fn generate(&self) -> PushKey {
        let mut state = self.state.lock();
        let mut now = Self::current_millis().max(state.last_millis);

        if now == state.last_millis {
            if !Self::increment(&mut state.random) {
                // Suffix space exhausted for this millisecond, borrow the next one
                now += 1;
                Self::reroll(&mut state.random);
            }
        } else {
            Self::reroll(&mut state.random);
        }
        state.last_millis = now;

        let mut key = [0u8; PushKey::LEN];
        let mut remaining = now;
        for slot in key[..TIMESTAMP_LEN].iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        for (slot, digit) in key[TIMESTAMP_LEN..].iter_mut().zip(state.random.iter()) {
            *slot = PUSH_CHARS[*digit as usize];
        }

        PushKey(key.iter().map(|b| char::from(*b)).collect())
    }

    fn reroll(random: &mut [u8; RANDOM_LEN]) {
        let mut rng = rand::thread_rng();
        for digit in random.iter_mut() {
            *digit = rng.gen_range(0..64);
        }
    }

    /// Add one to the suffix; returns false on overflow
    fn increment(random: &mut [u8; RANDOM_LEN]) -> bool {
        for digit in random.iter_mut().rev() {
            if *digit == 63 {
                *digit = 0;
            } else {
                *digit += 1;
                return true;
            }
        }
        false
    }

    #[inline]
    fn current_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

impl Default for PushKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
