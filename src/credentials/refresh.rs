use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, header::AUTHORIZATION};
use serde_json::Value;

use crate::{config::Config, types::ProviderId};

/// Tokens returned by a provider's refresh grant.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedToken {
    pub access_token: String,
    /// Present only when the provider rotated the refresh token.
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub scope: Option<String>,
}

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, provider: ProviderId, refresh_token: &str)
    -> Result<RefreshedToken, String>;
}

/// Refresh grant against the providers' real OAuth token endpoints.
pub struct OAuthRefresher {
    client: Client,
    config: Config,
}

impl OAuthRefresher {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }
}

/// `Authorization: Basic` value for an OAuth client.
pub fn basic_auth(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}

#[async_trait]
impl TokenRefresher for OAuthRefresher {
    async fn refresh(
        &self,
        provider: ProviderId,
        refresh_token: &str,
    ) -> Result<RefreshedToken, String> {
        let request = match provider {
            ProviderId::Spotify => self
                .client
                .post(format!("{}/api/token", self.config.endpoints.spotify_accounts))
                .header(
                    AUTHORIZATION,
                    basic_auth(
                        &self.config.spotify.client_id,
                        &self.config.spotify.client_secret,
                    ),
                )
                .form(&[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ]),
            ProviderId::Youtube => self.client.post(&self.config.endpoints.google_token).form(&[
                ("client_id", self.config.google.client_id.as_str()),
                ("client_secret", self.config.google.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ]),
            ProviderId::Apple => return Err("apple has no token refresh endpoint".to_string()),
        };

        let res = request.send().await.map_err(|e| e.to_string())?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(format!("token endpoint returned {}: {}", status, body));
        }

        let json: Value = res.json().await.map_err(|e| e.to_string())?;
        parse_refresh_response(&json)
    }
}

pub fn parse_refresh_response(json: &Value) -> Result<RefreshedToken, String> {
    let access_token = json["access_token"]
        .as_str()
        .filter(|t| !t.is_empty())
        .ok_or("token response has no access_token")?;

    Ok(RefreshedToken {
        access_token: access_token.to_string(),
        refresh_token: json["refresh_token"].as_str().map(str::to_string),
        expires_in: json["expires_in"].as_i64().unwrap_or(3600),
        scope: json["scope"].as_str().map(str::to_string),
    })
}
