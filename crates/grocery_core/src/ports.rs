//! crates/grocery_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Account, AccountCredentials, AccountId, LoginEvent, NewAccount};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AccountStore: Send + Sync {
    // --- Accounts ---

    /// Inserts a new account. Fails with `Conflict` if the email is taken.
    async fn create_account(
        &self,
        new_account: &NewAccount,
        password_digest: &str,
    ) -> PortResult<Account>;

    async fn get_account_by_id(&self, account_id: AccountId) -> PortResult<Account>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<AccountCredentials>;

    async fn get_credentials_by_id(&self, account_id: AccountId)
        -> PortResult<AccountCredentials>;

    async fn update_password_digest(
        &self,
        account_id: AccountId,
        password_digest: &str,
    ) -> PortResult<()>;

    // --- Login Events ---

    /// Appends one login event. Events are never updated or deleted.
    async fn record_login_event(&self, event: &LoginEvent) -> PortResult<()>;

    /// Distinct UTC calendar dates on which the account logged in, in any order.
    async fn get_login_dates(&self, account_id: AccountId) -> PortResult<Vec<NaiveDate>>;
}
