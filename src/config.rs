//! Configuration management for the playlist converter.
//!
//! This module loads configuration values from environment variables and an
//! optional `.env` file and collects them into an explicit [`Config`] value.
//! The config is built once at start-up and handed to every provider adapter
//! at construction; adapters never read the process environment themselves.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (endpoints, delays, paths)

use std::{env, path::PathBuf, time::Duration};

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the `tunebridge` data directory if it doesn't exist and loads
/// variables from `tunebridge/.env` inside it:
/// - Linux: `~/.local/share/tunebridge/.env`
/// - macOS: `~/Library/Application Support/tunebridge/.env`
/// - Windows: `%LOCALAPPDATA%/tunebridge/.env`
///
/// A missing `.env` file is not an error; the process environment is used as is.
///
/// # Errors
///
/// Returns an error string if the directory cannot be created or the file
/// exists but cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("Failed to load {}: {}", path.display(), e)),
    }
}

/// Returns the per-user data directory of the application.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("tunebridge");
    path
}

/// OAuth application credentials registered with a provider.
#[derive(Debug, Clone, Default)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Base URLs of every external service the adapters talk to.
///
/// Overridable so tests can point the adapters at a local fake server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Spotify Web API, e.g. `https://api.spotify.com/v1`
    pub spotify_api: String,
    /// Spotify accounts service, e.g. `https://accounts.spotify.com`
    pub spotify_accounts: String,
    /// YouTube Data API, e.g. `https://www.googleapis.com/youtube/v3`
    pub youtube_api: String,
    /// Google OAuth token endpoint
    pub google_token: String,
    /// Public iTunes search API
    pub itunes_api: String,
    /// Origin of the public Apple Music web pages. Only playlist URLs on
    /// this origin are fetched.
    pub apple_web: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            spotify_api: "https://api.spotify.com/v1".to_string(),
            spotify_accounts: "https://accounts.spotify.com".to_string(),
            youtube_api: "https://www.googleapis.com/youtube/v3".to_string(),
            google_token: "https://oauth2.googleapis.com/token".to_string(),
            itunes_api: "https://itunes.apple.com".to_string(),
            apple_web: "https://music.apple.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint at the same base URL. Used by tests running a
    /// single fake server that serves all providers.
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            spotify_api: format!("{}/spotify/v1", base),
            spotify_accounts: format!("{}/spotify-accounts", base),
            youtube_api: format!("{}/youtube/v3", base),
            google_token: format!("{}/google/token", base),
            itunes_api: format!("{}/itunes", base),
            apple_web: base.to_string(),
        }
    }
}

/// Runtime configuration injected into the converter and its adapters.
#[derive(Debug, Clone)]
pub struct Config {
    pub spotify: ClientCredentials,
    pub google: ClientCredentials,
    pub youtube_api_key: String,
    /// Serve video-platform searches from the deterministic mock instead of the network.
    pub youtube_mock_mode: bool,
    pub endpoints: Endpoints,
    /// Pause after every track search during matching.
    pub match_delay: Duration,
    /// Pause between single-item additions to a video-platform playlist.
    pub add_delay: Duration,
    pub http_timeout: Duration,
    pub server_addr: String,
    pub credentials_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spotify: ClientCredentials::default(),
            google: ClientCredentials::default(),
            youtube_api_key: String::new(),
            youtube_mock_mode: false,
            endpoints: Endpoints::default(),
            match_delay: Duration::from_millis(100),
            add_delay: Duration::from_millis(100),
            http_timeout: Duration::from_secs(30),
            server_addr: "127.0.0.1:8080".to_string(),
            credentials_path: data_dir().join("credentials.json"),
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// Secrets default to empty strings; a provider call made with an empty
    /// secret fails the same way a rejected one does.
    ///
    /// # Errors
    ///
    /// Returns an error when a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Config::default();
        let endpoints = Endpoints {
            spotify_api: var_or("SPOTIFY_API_URL", defaults.endpoints.spotify_api),
            spotify_accounts: var_or("SPOTIFY_ACCOUNTS_URL", defaults.endpoints.spotify_accounts),
            youtube_api: var_or("YOUTUBE_API_URL", defaults.endpoints.youtube_api),
            google_token: var_or("GOOGLE_TOKEN_URL", defaults.endpoints.google_token),
            itunes_api: var_or("ITUNES_API_URL", defaults.endpoints.itunes_api),
            apple_web: var_or("APPLE_WEB_URL", defaults.endpoints.apple_web),
        };

        Ok(Self {
            spotify: ClientCredentials {
                client_id: var_or("SPOTIFY_CLIENT_ID", String::new()),
                client_secret: var_or("SPOTIFY_CLIENT_SECRET", String::new()),
            },
            google: ClientCredentials {
                client_id: var_or("GOOGLE_CLIENT_ID", String::new()),
                client_secret: var_or("GOOGLE_CLIENT_SECRET", String::new()),
            },
            youtube_api_key: var_or("YOUTUBE_API_KEY", String::new()),
            youtube_mock_mode: env::var("YOUTUBE_MOCK_MODE").is_ok_and(|v| v == "true"),
            endpoints,
            match_delay: millis_or("MATCH_DELAY_MS", defaults.match_delay)?,
            add_delay: millis_or("ADD_DELAY_MS", defaults.add_delay)?,
            http_timeout: match env::var("HTTP_TIMEOUT_SECS") {
                Ok(v) => Duration::from_secs(
                    v.parse()
                        .map_err(|_| format!("HTTP_TIMEOUT_SECS is not a number: {}", v))?,
                ),
                Err(_) => defaults.http_timeout,
            },
            server_addr: var_or("SERVER_ADDRESS", defaults.server_addr),
            credentials_path: env::var("CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials_path),
        })
    }
}

fn var_or(name: &str, default: String) -> String {
    env::var(name).unwrap_or(default)
}

fn millis_or(name: &str, default: Duration) -> Result<Duration, String> {
    match env::var(name) {
        Ok(v) => v
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| format!("{} is not a number: {}", name, v)),
        Err(_) => Ok(default),
    }
}
