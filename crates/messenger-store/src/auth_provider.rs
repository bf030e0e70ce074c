//! In-memory auth provider
//!
//! Email/password accounts with Argon2 hashes. Emails are matched
//! case-insensitively; passwords follow the hosted provider's rules.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;
use validator::ValidateEmail;

use messenger_common::{hash_password, validate_password_strength, verify_password, AppError};
use messenger_core::{AuthProvider, DomainError, PortResult, User, UserId};

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password_hash: String,
}

/// Auth provider keeping accounts in memory
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
    accounts: DashMap<String, Account>,
    signed_in: DashSet<UserId>,
    failing: AtomicBool,
}

impl MemoryAuthProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account with a chosen uid, without signing it in
    pub fn register(&self, uid: UserId, email: &str, password: &str) -> PortResult<User> {
        let email_key = normalize_email(email)?;
        validate_password_strength(password).map_err(weak_password)?;

        let password_hash = hash_password(password).map_err(internal)?;
        let user = User::new(uid, email.trim());

        match self.accounts.entry(email_key) {
            Entry::Occupied(_) => Err(DomainError::EmailAlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    user: user.clone(),
                    password_hash,
                });
                tracing::debug!(user_id = %user.uid, "Account created");
                Ok(user)
            }
        }
    }

    /// Make every provider call fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::InternalError("auth provider unavailable".into()));
        }
        Ok(())
    }

    /// Whether the provider currently holds a session for `uid`
    pub fn is_signed_in(&self, uid: &UserId) -> bool {
        self.signed_in.contains(uid)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<User> {
        self.check_available()?;
        let email_key = normalize_email(email).map_err(|_| DomainError::InvalidCredentials)?;
        let account = self
            .accounts
            .get(&email_key)
            .map(|a| a.clone())
            .ok_or(DomainError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash).map_err(internal)? {
            return Err(DomainError::InvalidCredentials);
        }

        self.signed_in.insert(account.user.uid.clone());
        Ok(account.user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> PortResult<User> {
        self.check_available()?;
        let uid = UserId::new(Uuid::new_v4().simple().to_string())?;
        let user = self.register(uid, email, password)?;
        self.signed_in.insert(user.uid.clone());
        Ok(user)
    }

    async fn sign_out(&self, user: &User) -> PortResult<()> {
        self.check_available()?;
        self.signed_in.remove(&user.uid);
        Ok(())
    }
}

fn normalize_email(email: &str) -> PortResult<String> {
    let email = email.trim();
    if !email.validate_email() {
        return Err(DomainError::InvalidEmail);
    }
    Ok(email.to_lowercase())
}

fn weak_password(err: AppError) -> DomainError {
    match err {
        AppError::Validation(msg) => DomainError::WeakPassword(msg),
        other => internal(other),
    }
}

fn internal(err: AppError) -> DomainError {
    DomainError::InternalError(err.to_string())
}
