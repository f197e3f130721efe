use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::types::{Credential, CredentialUpdate, ProviderId};

/// Keyed access to the per-user, per-provider OAuth credentials.
///
/// There is no locking across a read and the following write: two requests
/// refreshing the same credential concurrently both write, and the last
/// write wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, user_id: &str, provider: ProviderId) -> Result<Option<Credential>, String>;

    async fn update(
        &self,
        user_id: &str,
        provider: ProviderId,
        update: CredentialUpdate,
    ) -> Result<(), String>;
}

fn apply(credential: &mut Credential, update: CredentialUpdate) {
    credential.access_token = update.access_token;
    credential.expires_at_epoch_seconds = Some(update.expires_at_epoch_seconds);
    if update.refresh_token.is_some() {
        credential.refresh_token = update.refresh_token;
    }
    if update.scope.is_some() {
        credential.scope = update.scope;
    }
}

/// Credentials kept as a JSON array in a single file, re-read on every call.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn load(&self) -> Result<Vec<Credential>, String> {
        match async_fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| e.to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn persist(&self, credentials: &[Credential]) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(credentials).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Adds or replaces the credential for its (user, provider) pair.
    pub async fn insert(&self, credential: Credential) -> Result<(), String> {
        let mut credentials = self.load().await?;
        credentials
            .retain(|c| !(c.user_id == credential.user_id && c.provider == credential.provider));
        credentials.push(credential);
        self.persist(&credentials).await
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, user_id: &str, provider: ProviderId) -> Result<Option<Credential>, String> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|c| c.user_id == user_id && c.provider == provider))
    }

    async fn update(
        &self,
        user_id: &str,
        provider: ProviderId,
        update: CredentialUpdate,
    ) -> Result<(), String> {
        let mut credentials = self.load().await?;
        let Some(credential) = credentials
            .iter_mut()
            .find(|c| c.user_id == user_id && c.provider == provider)
        else {
            return Err(format!("no {} credential for {}", provider, user_id));
        };

        apply(credential, update);
        self.persist(&credentials).await
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<HashMap<(String, ProviderId), Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, credential: Credential) {
        let key = (credential.user_id.clone(), credential.provider);
        self.credentials.lock().await.insert(key, credential);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, user_id: &str, provider: ProviderId) -> Result<Option<Credential>, String> {
        Ok(self
            .credentials
            .lock()
            .await
            .get(&(user_id.to_string(), provider))
            .cloned())
    }

    async fn update(
        &self,
        user_id: &str,
        provider: ProviderId,
        update: CredentialUpdate,
    ) -> Result<(), String> {
        let mut credentials = self.credentials.lock().await;
        let credential = credentials
            .get_mut(&(user_id.to_string(), provider))
            .ok_or_else(|| format!("no {} credential for {}", provider, user_id))?;
        apply(credential, update);
        Ok(())
    }
}
