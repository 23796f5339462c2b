pub mod domain;
pub mod manager;
pub mod password;
pub mod ports;
pub mod token;

pub use domain::{Account, AccountCredentials, AccountId, Credential, LoginEvent, NewAccount};
pub use manager::{CredentialError, CredentialManager, DEFAULT_TOKEN_TTL_SECS};
pub use ports::{AccountStore, PortError, PortResult};
