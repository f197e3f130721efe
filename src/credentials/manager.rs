use std::sync::Arc;

use crate::{
    credentials::{CredentialStore, TokenRefresher},
    error::{CredentialError, CredentialErrorKind},
    events::{Event, Observer},
    types::{Credential, CredentialUpdate, ProviderId},
    utils,
};

/// Hands out usable access tokens, refreshing expired ones once.
///
/// Every call re-reads the store and checks expiry against the wall clock;
/// nothing is cached here. Concurrent refreshes of the same credential are
/// not coordinated: each one writes its result and the last write wins.
pub struct CredentialManager {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    observer: Arc<dyn Observer>,
}

impl CredentialManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            store,
            refresher,
            observer,
        }
    }

    pub async fn access_token(
        &self,
        user_id: &str,
        provider: ProviderId,
    ) -> Result<String, CredentialError> {
        let fail = |kind| CredentialError::new(provider, kind);

        let credential = self
            .store
            .get(user_id, provider)
            .await
            .map_err(|_| fail(CredentialErrorKind::Store))?
            .filter(|c| !c.access_token.is_empty())
            .ok_or(fail(CredentialErrorKind::NotLinked))?;

        let credential = if is_expired(&credential, utils::now_epoch_seconds()) {
            self.refresh(user_id, credential).await?
        } else {
            credential
        };

        if let Some(scope) = provider.required_scope() {
            if !has_scope(credential.scope.as_deref(), scope) {
                return Err(fail(CredentialErrorKind::ScopeMissing));
            }
        }

        Ok(credential.access_token)
    }

    async fn refresh(
        &self,
        user_id: &str,
        credential: Credential,
    ) -> Result<Credential, CredentialError> {
        let provider = credential.provider;
        let Some(refresh_token) = credential.refresh_token.clone() else {
            return Err(CredentialError::new(provider, CredentialErrorKind::Expired));
        };

        self.observer.emit(Event::RefreshAttempted { provider });
        let refreshed = match self.refresher.refresh(provider, &refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(reason) => {
                self.observer.emit(Event::RefreshFailed { provider, reason });
                return Err(CredentialError::new(
                    provider,
                    CredentialErrorKind::RefreshFailed,
                ));
            }
        };

        let update = CredentialUpdate {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token,
            expires_at_epoch_seconds: utils::now_epoch_seconds() + refreshed.expires_in,
            scope: refreshed.scope,
        };

        if let Err(reason) = self.store.update(user_id, provider, update.clone()).await {
            self.observer.emit(Event::RefreshFailed { provider, reason });
            return Err(CredentialError::new(provider, CredentialErrorKind::Store));
        }
        self.observer.emit(Event::RefreshSucceeded { provider });

        Ok(Credential {
            access_token: update.access_token,
            refresh_token: update.refresh_token.or(credential.refresh_token),
            expires_at_epoch_seconds: Some(update.expires_at_epoch_seconds),
            scope: update.scope.or(credential.scope),
            ..credential
        })
    }
}

pub fn is_expired(credential: &Credential, now: i64) -> bool {
    credential
        .expires_at_epoch_seconds
        .is_some_and(|expires_at| expires_at < now)
}

const GOOGLE_SCOPE_PREFIX: &str = "https://www.googleapis.com/auth/";

/// Accepts `needed` granted either by its short name or as the full Google
/// scope URL. Narrower variants such as `youtube.readonly` do not count.
pub fn has_scope(granted: Option<&str>, needed: &str) -> bool {
    granted.is_some_and(|scope| {
        scope.split_whitespace().any(|s| {
            s == needed || s.strip_prefix(GOOGLE_SCOPE_PREFIX) == Some(needed)
        })
    })
}
