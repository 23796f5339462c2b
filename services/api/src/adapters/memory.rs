//! services/api/src/adapters/memory.rs
//!
//! An `AccountStore` kept entirely in process memory. Used by the test suite.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use grocery_core::domain::{Account, AccountCredentials, AccountId, LoginEvent, NewAccount};
use grocery_core::ports::{AccountStore, PortError, PortResult};
use tokio::sync::Mutex;
use tracing::debug;

struct StoredAccount {
    account: Account,
    password_digest: String,
}

#[derive(Default)]
struct MemoryData {
    accounts: HashMap<AccountId, StoredAccount>,
    login_events: Vec<LoginEvent>,
    next_account_id: AccountId,
}

/// In-memory storage implementation (useful for testing)
#[derive(Default)]
pub struct MemoryAdapter {
    data: Mutex<MemoryData>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn account_count(&self) -> usize {
        self.data.lock().await.accounts.len()
    }

    pub async fn login_event_count(&self, account_id: AccountId) -> usize {
        self.data
            .lock()
            .await
            .login_events
            .iter()
            .filter(|e| e.account_id == account_id)
            .count()
    }

    /// Removes an account and its login events.
    pub async fn delete_account(&self, account_id: AccountId) -> PortResult<()> {
        let mut data = self.data.lock().await;
        data.accounts
            .remove(&account_id)
            .ok_or_else(|| PortError::NotFound(format!("Account {} not found", account_id)))?;
        data.login_events.retain(|e| e.account_id != account_id);
        Ok(())
    }
}

fn credentials_of(stored: &StoredAccount) -> AccountCredentials {
    AccountCredentials {
        account_id: stored.account.id,
        email: stored.account.email.clone(),
        password_digest: stored.password_digest.clone(),
    }
}

#[async_trait]
impl AccountStore for MemoryAdapter {
    async fn create_account(
        &self,
        new_account: &NewAccount,
        password_digest: &str,
    ) -> PortResult<Account> {
        let mut data = self.data.lock().await;
        if data
            .accounts
            .values()
            .any(|s| s.account.email == new_account.email)
        {
            return Err(PortError::Conflict(format!(
                "Email {} is already registered",
                new_account.email
            )));
        }

        data.next_account_id += 1;
        let account = Account {
            id: data.next_account_id,
            email: new_account.email.clone(),
            first_name: new_account.first_name.clone(),
            last_name: new_account.last_name.clone(),
            created_at: Utc::now(),
        };
        data.accounts.insert(
            account.id,
            StoredAccount {
                account: account.clone(),
                password_digest: password_digest.to_string(),
            },
        );
        debug!(account_id = account.id, "Stored account in memory");
        Ok(account)
    }

    async fn get_account_by_id(&self, account_id: AccountId) -> PortResult<Account> {
        self.data
            .lock()
            .await
            .accounts
            .get(&account_id)
            .map(|s| s.account.clone())
            .ok_or_else(|| PortError::NotFound(format!("Account {} not found", account_id)))
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<AccountCredentials> {
        self.data
            .lock()
            .await
            .accounts
            .values()
            .find(|s| s.account.email == email)
            .map(credentials_of)
            .ok_or_else(|| PortError::NotFound("Account not found".to_string()))
    }

    async fn get_credentials_by_id(
        &self,
        account_id: AccountId,
    ) -> PortResult<AccountCredentials> {
        self.data
            .lock()
            .await
            .accounts
            .get(&account_id)
            .map(credentials_of)
            .ok_or_else(|| PortError::NotFound(format!("Account {} not found", account_id)))
    }

    async fn update_password_digest(
        &self,
        account_id: AccountId,
        password_digest: &str,
    ) -> PortResult<()> {
        let mut data = self.data.lock().await;
        let stored = data
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| PortError::NotFound(format!("Account {} not found", account_id)))?;
        stored.password_digest = password_digest.to_string();
        Ok(())
    }

    async fn record_login_event(&self, event: &LoginEvent) -> PortResult<()> {
        let mut data = self.data.lock().await;
        if !data.accounts.contains_key(&event.account_id) {
            return Err(PortError::NotFound(format!(
                "Account {} not found",
                event.account_id
            )));
        }
        data.login_events.push(event.clone());
        Ok(())
    }

    async fn get_login_dates(&self, account_id: AccountId) -> PortResult<Vec<NaiveDate>> {
        let data = self.data.lock().await;
        let dates: BTreeSet<NaiveDate> = data
            .login_events
            .iter()
            .filter(|e| e.account_id == account_id)
            .map(|e| e.logged_in_at.date_naive())
            .collect();
        Ok(dates.into_iter().collect())
    }
}
