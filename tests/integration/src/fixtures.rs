//! Test fixtures and data generators
//!
//! Provides reusable test data for integration tests.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

use messenger_service::{SaveProfileRequest, SignInRequest, SignUpRequest};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

pub const TEST_PASSWORD: &str = "secret123";

/// Email + password pair for one test account
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn unique() -> Self {
        Self {
            email: format!("user{}@example.com", unique_suffix()),
            password: TEST_PASSWORD.to_string(),
        }
    }

    pub fn sign_up(&self) -> SignUpRequest {
        SignUpRequest::new(self.email.clone(), self.password.clone())
    }

    pub fn sign_in(&self) -> SignInRequest {
        SignInRequest::new(self.email.clone(), self.password.clone())
    }
}

/// A filled-in profile form
pub fn profile_form(pseudo: &str) -> SaveProfileRequest {
    SaveProfileRequest::new(format!("Nom {pseudo}"), pseudo, "+216 71 000 000")
}

/// Raw profile node as another client would have saved it
pub fn profile_node(id: &str) -> Value {
    json!({
        "id": id,
        "nom": format!("Nom {id}"),
        "pseudo": format!("user{id}"),
        "telephone": "",
        "connectionState": "offline"
    })
}
