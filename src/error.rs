//! Error types shared by the pipeline and the HTTP surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::types::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialErrorKind {
    /// No credential row for the (user, provider) pair.
    NotLinked,
    /// Token expired and there is no refresh token to renew it with.
    Expired,
    /// The refresh exchange was attempted and failed.
    RefreshFailed,
    /// The stored grant lacks the scope the provider call needs.
    ScopeMissing,
    /// The credential store itself could not be read or written.
    Store,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{provider} credential error: {kind:?}")]
pub struct CredentialError {
    pub provider: ProviderId,
    pub kind: CredentialErrorKind,
}

impl CredentialError {
    pub fn new(provider: ProviderId, kind: CredentialErrorKind) -> Self {
        Self { provider, kind }
    }

    /// Action code telling the caller how to recover.
    pub fn action(&self) -> Option<String> {
        let account = self.provider.account().to_uppercase();
        match self.kind {
            CredentialErrorKind::NotLinked => Some(format!("CONNECT_{}", account)),
            CredentialErrorKind::Expired | CredentialErrorKind::RefreshFailed => {
                Some(format!("RECONNECT_{}", account))
            }
            CredentialErrorKind::ScopeMissing => {
                let scope = self.provider.required_scope().unwrap_or_default();
                Some(format!("RECONNECT_{}_{}", account, scope.to_uppercase()))
            }
            CredentialErrorKind::Store => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            CredentialErrorKind::NotLinked => StatusCode::NOT_FOUND,
            CredentialErrorKind::Expired | CredentialErrorKind::RefreshFailed => {
                StatusCode::UNAUTHORIZED
            }
            CredentialErrorKind::ScopeMissing => StatusCode::FORBIDDEN,
            CredentialErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        let account = capitalize(self.provider.account());
        match self.kind {
            CredentialErrorKind::NotLinked => format!(
                "No {account} account linked. Please connect your {account} account."
            ),
            CredentialErrorKind::Expired => format!(
                "{account} token expired. Please reconnect your {account} account."
            ),
            CredentialErrorKind::RefreshFailed => {
                "Failed to refresh token. Please reconnect your account.".to_string()
            }
            CredentialErrorKind::ScopeMissing => format!(
                "{} access not granted. Please reconnect with {} permissions.",
                capitalize(self.provider.as_str()),
                capitalize(self.provider.as_str())
            ),
            CredentialErrorKind::Store => "Internal server error".to_string(),
        }
    }
}

/// Failure of a single call to a provider API, internal to the adapters.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider quota exceeded")]
    QuotaExceeded,

    #[error("provider API is not enabled for this project")]
    ApiNotEnabled,

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("cannot parse playlist id from {0}")]
    InvalidUrl(String),
}

/// Request-level failures of a conversion or listing call.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{0}")]
    Input(String),

    #[error("Unsupported playlist URL format")]
    UnsupportedUrl,

    #[error("Source and target platforms are the same")]
    SamePlatform,

    #[error("Authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("{provider} API quota exceeded. Please try again later.")]
    Quota { provider: ProviderId },

    #[error("{provider} API is not enabled. Please enable it in the provider console.")]
    ApiNotEnabled { provider: ProviderId },

    #[error("Failed to extract playlist data")]
    Extraction,

    /// Provider error object forwarded verbatim by the listing endpoints.
    #[error("provider returned {status}")]
    Provider { status: u16, body: Value },

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ConvertError {
    pub fn status(&self) -> StatusCode {
        match self {
            ConvertError::Input(_)
            | ConvertError::UnsupportedUrl
            | ConvertError::SamePlatform
            | ConvertError::Extraction => StatusCode::BAD_REQUEST,
            ConvertError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ConvertError::Credential(e) => e.status(),
            ConvertError::Quota { .. } => StatusCode::TOO_MANY_REQUESTS,
            ConvertError::ApiNotEnabled { .. } => StatusCode::FORBIDDEN,
            ConvertError::Provider { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ConvertError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn action(&self) -> Option<String> {
        match self {
            ConvertError::Credential(e) => e.action(),
            ConvertError::Quota { .. } => Some("RETRY_LATER".to_string()),
            ConvertError::ApiNotEnabled { .. } => Some("ENABLE_API".to_string()),
            _ => None,
        }
    }

    /// Message safe to show to the caller. Unexpected failures never leak detail.
    pub fn public_message(&self) -> String {
        match self {
            ConvertError::Credential(e) => e.message(),
            ConvertError::Unexpected(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn body(&self) -> Value {
        if let ConvertError::Provider { body, .. } = self {
            return json!({ "error": body.get("error").cloned().unwrap_or_else(|| body.clone()) });
        }

        let mut error = json!({ "message": self.public_message() });
        if let Some(action) = self.action() {
            error["action"] = Value::String(action);
        }
        json!({ "error": error })
    }
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
