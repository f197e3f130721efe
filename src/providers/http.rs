use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ProviderError;

/// Error reasons Google APIs report under `error.errors[].reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoogleErrorReason {
    QuotaExceeded,
    AccessNotConfigured,
}

pub fn google_error_reason(body: &str) -> Option<GoogleErrorReason> {
    let json: Value = serde_json::from_str(body).ok()?;
    let errors = json["error"]["errors"].as_array()?;
    errors.iter().find_map(|e| match e["reason"].as_str() {
        Some("quotaExceeded") => Some(GoogleErrorReason::QuotaExceeded),
        Some("accessNotConfigured") => Some(GoogleErrorReason::AccessNotConfigured),
        _ => None,
    })
}

/// Passes successful responses through and turns the rest into
/// [`ProviderError`]s, recognising Google quota and API-disabled reasons.
pub async fn checked(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match google_error_reason(&body) {
        Some(GoogleErrorReason::QuotaExceeded) => ProviderError::QuotaExceeded,
        Some(GoogleErrorReason::AccessNotConfigured) => ProviderError::ApiNotEnabled,
        None => ProviderError::Status {
            status: status.as_u16(),
            body,
        },
    })
}

pub async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    let response = checked(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Malformed(e.to_string()))
}
