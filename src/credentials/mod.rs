//! Per-user OAuth credentials: storage, expiry checks and refresh.

mod manager;
mod refresh;
mod store;

pub use manager::{CredentialManager, has_scope, is_expired};
pub use refresh::{OAuthRefresher, RefreshedToken, TokenRefresher, basic_auth, parse_refresh_response};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
