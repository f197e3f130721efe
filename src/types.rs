use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Streaming platforms a playlist can be read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Spotify,
    Youtube,
    Apple,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::Spotify, ProviderId::Youtube, ProviderId::Apple];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Spotify => "spotify",
            ProviderId::Youtube => "youtube",
            ProviderId::Apple => "apple",
        }
    }

    /// Name of the OAuth account backing this provider. YouTube access is
    /// granted through a Google account.
    pub fn account(&self) -> &'static str {
        match self {
            ProviderId::Spotify => "spotify",
            ProviderId::Youtube => "google",
            ProviderId::Apple => "apple",
        }
    }

    /// OAuth scope that must be granted before user-level calls are made.
    pub fn required_scope(&self) -> Option<&'static str> {
        match self {
            ProviderId::Youtube => Some("youtube"),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spotify" => Ok(ProviderId::Spotify),
            "youtube" => Ok(ProviderId::Youtube),
            "apple" => Ok(ProviderId::Apple),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    Partial,
}

/// A single playlist entry. Identity is its position in the source playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub name: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_track_id: Option<String>,
}

impl Track {
    pub fn new(artist: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            duration_seconds: None,
            availability: None,
            platform_track_id: None,
        }
    }

    pub fn with_duration(mut self, seconds: Option<u32>) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// Applies a search outcome. Only the matcher stage calls this.
    pub fn matched(mut self, result: TrackMatch) -> Self {
        self.availability = Some(if result.found {
            Availability::Available
        } else {
            Availability::Unavailable
        });
        self.platform_track_id = result.platform_track_id;
        self
    }

    pub fn is_available(&self) -> bool {
        self.availability == Some(Availability::Available)
    }
}

/// Outcome of a single catalog search on the destination platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMatch {
    pub found: bool,
    pub platform_track_id: Option<String>,
}

impl TrackMatch {
    pub fn found(id: Option<String>) -> Self {
        Self {
            found: true,
            platform_track_id: id,
        }
    }

    pub fn not_found() -> Self {
        Self::default()
    }
}

/// Provider-agnostic description of a source playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistDescriptor {
    pub name: String,
    pub source_provider: ProviderId,
    pub track_count: usize,
    pub cover_image_url: Option<String>,
    pub tracks: Vec<Track>,
}

impl PlaylistDescriptor {
    /// `track_count` is always the realized length of `tracks`.
    pub fn new(
        name: String,
        source_provider: ProviderId,
        cover_image_url: Option<String>,
        tracks: Vec<Track>,
    ) -> Self {
        Self {
            name,
            source_provider,
            track_count: tracks.len(),
            cover_image_url,
            tracks,
        }
    }
}

/// OAuth credentials a user linked for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub user_id: String,
    pub provider: ProviderId,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at_epoch_seconds: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// The refresh-derived fields written back after a successful token refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialUpdate {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at_epoch_seconds: i64,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub target_platform: String,
    #[serde(default)]
    pub create_playlist: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalPlaylist {
    pub name: String,
    pub platform: ProviderId,
    pub track_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub original_playlist: OriginalPlaylist,
    pub tracks: Vec<Track>,
    pub target_platform: ProviderId,
    pub match_rate: f64,
    pub created_playlist_url: Option<String>,
}

/// One of the caller's own playlists on a provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub tracks: u64,
    pub image: Option<String>,
    pub external_url: String,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub artist: String,
    pub name: String,
    pub status: String,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub tracks: u64,
    pub url: String,
}
