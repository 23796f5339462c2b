//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request identity.

use crate::config::Config;
use chrono::Duration;
use grocery_core::{Account, AccountStore, CredentialManager};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credentials: Arc<CredentialManager>,
}

impl AppState {
    /// Wires the credential manager to the given store using the configured
    /// signing secret and token lifetime.
    pub fn new(config: Arc<Config>, store: Arc<dyn AccountStore>) -> Self {
        let credentials = CredentialManager::new(
            store,
            config.token_secret.as_bytes(),
            Duration::seconds(config.token_ttl_secs),
        );
        Self {
            config,
            credentials: Arc::new(credentials),
        }
    }
}

//=========================================================================================
// CurrentAccount (Specific to One Request)
//=========================================================================================

/// The authenticated account, bound by `require_auth` and read by protected handlers.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);
