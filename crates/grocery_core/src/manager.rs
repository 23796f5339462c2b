//! crates/grocery_core/src/manager.rs
//!
//! The credential and token manager: the single place that hashes passwords,
//! mints and checks tokens, resolves a presented credential to an account and
//! keeps the login history behind the heatmap.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::{debug, info, warn};

use crate::domain::{Account, AccountId, Credential, LoginEvent, NewAccount};
use crate::password::{self, HashError};
use crate::ports::{AccountStore, PortError, PortResult};
use crate::token::{Claims, TokenError, TokenSigner};

/// Lifetime of a freshly issued token unless configured otherwise.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Deliberately carries no detail about which factor failed.
    #[error("authentication failed")]
    Authentication,
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error("Failed to sign token: {0}")]
    Signing(#[from] TokenError),
    #[error(transparent)]
    Port(#[from] PortError),
}

pub struct CredentialManager {
    store: Arc<dyn AccountStore>,
    signer: TokenSigner,
    ttl: Duration,
}

impl CredentialManager {
    /// The secret is read once at startup; replacing it invalidates every
    /// outstanding token.
    pub fn new(store: Arc<dyn AccountStore>, secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            store,
            signer: TokenSigner::new(secret),
            ttl,
        }
    }

    pub fn hash_password(&self, plaintext: &str) -> Result<String, HashError> {
        password::hash_password(plaintext)
    }

    pub fn verify_password(&self, plaintext: &str, digest: &str) -> bool {
        password::verify_password(plaintext, digest)
    }

    //=====================================================================================
    // Registration and password change
    //=====================================================================================

    /// Creates the account and hands back a token for it.
    ///
    /// Registration is not a login, so no login event is recorded here.
    pub async fn register(
        &self,
        new_account: &NewAccount,
    ) -> Result<(Account, String), CredentialError> {
        let digest = hash_off_runtime(&new_account.password).await?;
        let account = self.store.create_account(new_account, &digest).await?;
        let token = self.mint_token(account.id, Utc::now())?;
        info!(account_id = account.id, "Registered new account");
        Ok((account, token))
    }

    pub async fn change_password(
        &self,
        account_id: AccountId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), CredentialError> {
        let credentials = self.store.get_credentials_by_id(account_id).await?;
        if !verify_off_runtime(current_password, Some(credentials.password_digest)).await {
            debug!(account_id, "Password change refused");
            return Err(CredentialError::Authentication);
        }

        let digest = hash_off_runtime(new_password).await?;
        self.store.update_password_digest(account_id, &digest).await?;
        info!(account_id, "Password changed");
        Ok(())
    }

    //=====================================================================================
    // Tokens
    //=====================================================================================

    /// Issues a token and appends one login event.
    pub async fn issue_token(&self, account_id: AccountId) -> Result<String, CredentialError> {
        self.issue_token_at(account_id, Utc::now()).await
    }

    pub async fn issue_token_at(
        &self,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<String, CredentialError> {
        let token = self.mint_token(account_id, now)?;
        self.store
            .record_login_event(&LoginEvent {
                account_id,
                logged_in_at: now,
            })
            .await?;
        Ok(token)
    }

    fn mint_token(&self, account_id: AccountId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(account_id, now, self.ttl)?;
        self.signer.sign(&claims)
    }

    /// Resolves a token to its account. Forged, expired, malformed and orphaned
    /// tokens all come back as `None`; only store failures are errors.
    pub async fn verify_token(&self, token: &str) -> PortResult<Option<Account>> {
        self.verify_token_at(token, Utc::now()).await
    }

    pub async fn verify_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Option<Account>> {
        let claims = match self.signer.verify(token, now) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Token rejected: {}", e);
                return Ok(None);
            }
        };

        let account = found(self.store.get_account_by_id(claims.sub).await)?;
        if account.is_none() {
            debug!(account_id = claims.sub, "Token refers to a missing account");
        }
        Ok(account)
    }

    //=====================================================================================
    // Identity resolution
    //=====================================================================================

    pub async fn resolve_identity(&self, credential: &Credential) -> PortResult<Option<Account>> {
        match credential {
            Credential::Token(token) => self.verify_token(token).await,
            Credential::Password { email, password } => {
                self.authenticate_password(email, password).await
            }
        }
    }

    /// Resolves the shared credential slot: the first field is tried as a token,
    /// then, if a password came with it, as an email.
    pub async fn resolve_slot(
        &self,
        token_or_email: &str,
        password: Option<&str>,
    ) -> PortResult<Option<Account>> {
        let by_token = self
            .resolve_identity(&Credential::Token(token_or_email.to_string()))
            .await?;
        if by_token.is_some() {
            return Ok(by_token);
        }

        match password {
            Some(password) => {
                self.resolve_identity(&Credential::Password {
                    email: token_or_email.to_string(),
                    password: password.to_string(),
                })
                .await
            }
            None => Ok(None),
        }
    }

    async fn authenticate_password(
        &self,
        email: &str,
        password: &str,
    ) -> PortResult<Option<Account>> {
        let Some(credentials) = found(self.store.get_credentials_by_email(email).await)? else {
            // Same Argon2 cost as a known email with a wrong password.
            verify_off_runtime(password, None).await;
            debug!("Password login for unknown email");
            return Ok(None);
        };

        if !verify_off_runtime(password, Some(credentials.password_digest)).await {
            debug!(account_id = credentials.account_id, "Password mismatch");
            return Ok(None);
        }

        found(self.store.get_account_by_id(credentials.account_id).await)
    }

    //=====================================================================================
    // Heatmap
    //=====================================================================================

    /// Distinct days of the year (1-366, UTC) on which a token was issued.
    pub async fn login_days(&self, account_id: AccountId) -> PortResult<BTreeSet<u32>> {
        let dates = self.store.get_login_dates(account_id).await?;
        Ok(dates.into_iter().map(|date| date.ordinal()).collect())
    }
}

/// Digest of a throwaway password, checked when no account matches an email.
fn dummy_digest() -> Option<&'static str> {
    static DUMMY_DIGEST: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_DIGEST
        .get_or_init(|| password::hash_password("grocery-no-such-account").ok())
        .as_deref()
}

/// Argon2 is CPU-bound, so it runs on the blocking pool.
async fn hash_off_runtime(plaintext: &str) -> Result<String, HashError> {
    let plaintext = plaintext.to_string();
    tokio::task::spawn_blocking(move || password::hash_password(&plaintext))
        .await
        .map_err(|e| HashError(e.to_string()))?
}

/// `None` verifies against the dummy digest and always yields `false`.
async fn verify_off_runtime(plaintext: &str, digest: Option<String>) -> bool {
    let plaintext = plaintext.to_string();
    let verified = tokio::task::spawn_blocking(move || match digest {
        Some(digest) => password::verify_password(&plaintext, &digest),
        None => {
            if let Some(dummy) = dummy_digest() {
                password::verify_password(&plaintext, dummy);
            }
            false
        }
    })
    .await;

    verified.unwrap_or_else(|e| {
        warn!("Password verification task failed: {}", e);
        false
    })
}

fn found<T>(result: PortResult<T>) -> PortResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PortError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
