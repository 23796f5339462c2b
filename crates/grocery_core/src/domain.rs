//! crates/grocery_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

/// Numeric primary key of an account row.
pub type AccountId = i64;

/// Represents an account - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/password change - contains sensitive data
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub account_id: AccountId,
    pub email: String,
    pub password_digest: String,
}

/// Everything needed to register an account, already validated.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// One successful token issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEvent {
    pub account_id: AccountId,
    pub logged_in_at: DateTime<Utc>,
}

/// What a client presented in the credential slot of a request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Token(String),
    Password { email: String, password: String },
}

// Keep secrets out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Token(_) => f.write_str("Credential::Token(..)"),
            Credential::Password { email, .. } => f
                .debug_struct("Credential::Password")
                .field("email", email)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_hides_secrets() {
        let token = Credential::Token("secret-token".to_string());
        assert!(!format!("{:?}", token).contains("secret-token"));

        let password = Credential::Password {
            email: "a@b.com".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", password);
        assert!(rendered.contains("a@b.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
