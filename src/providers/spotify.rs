//! Spotify Web API adapter.
//!
//! Extraction and search run on an application token from the
//! client-credentials grant, independent of any user. Playlist creation and
//! listing use the caller's own access token.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::{ClientCredentials, Config},
    credentials::basic_auth,
    error::ProviderError,
    events::{Event, Observer},
    normalize::UNKNOWN_ARTIST,
    providers::{PlaylistCreator, PlaylistExtractor, PlaylistLister, TrackMatcher, http},
    types::{PlaylistDescriptor, PlaylistSummary, ProviderId, Track, TrackMatch},
};

/// Spotify rejects larger batches on the add-items endpoint.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

const PAGE_SIZE: u32 = 50;

static PLAYLIST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"playlist/([a-zA-Z0-9]+)").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct AppToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    name: String,
    #[serde(default)]
    images: Option<Vec<Image>>,
}

#[derive(Debug, Deserialize)]
struct TracksPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<PlaylistTrack>,
}

#[derive(Debug, Deserialize)]
struct PlaylistTrack {
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
    duration_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<SearchTracks>,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    #[serde(default)]
    items: Vec<SearchTrack>,
}

#[derive(Debug, Deserialize)]
struct SearchTrack {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct UserPlaylists {
    #[serde(default)]
    items: Vec<UserPlaylist>,
}

#[derive(Debug, Deserialize)]
struct UserPlaylist {
    id: String,
    name: String,
    tracks: TrackTotal,
    #[serde(default)]
    images: Option<Vec<Image>>,
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct TrackTotal {
    total: u64,
}

pub struct SpotifyProvider {
    client: Client,
    api_url: String,
    accounts_url: String,
    app: ClientCredentials,
    observer: Arc<dyn Observer>,
}

pub fn playlist_id(url: &str) -> Option<String> {
    PLAYLIST_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

impl SpotifyProvider {
    pub fn new(client: Client, config: &Config, observer: Arc<dyn Observer>) -> Self {
        Self {
            client,
            api_url: config.endpoints.spotify_api.clone(),
            accounts_url: config.endpoints.spotify_accounts.clone(),
            app: config.spotify.clone(),
            observer,
        }
    }

    /// Application token from the client-credentials grant.
    async fn app_token(&self) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .header(
                AUTHORIZATION,
                basic_auth(&self.app.client_id, &self.app.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: AppToken = http::json(response).await?;
        Ok(token.access_token)
    }

    async fn fetch_page(&self, url: &str, token: &str) -> Result<TracksPage, ProviderError> {
        let response = self.client.get(url).bearer_auth(token).send().await?;
        http::json(response).await
    }

    async fn try_search(&self, query: &str) -> Result<TrackMatch, ProviderError> {
        let token = self.app_token().await?;
        let response = self
            .client
            .get(format!("{}/search", self.api_url))
            .query(&[("q", query.trim()), ("type", "track"), ("limit", "1")])
            .bearer_auth(token)
            .send()
            .await?;

        let result: SearchResponse = http::json(response).await?;
        Ok(
            match result.tracks.and_then(|t| t.items.into_iter().next()) {
                Some(track) => TrackMatch::found(Some(track.id)),
                None => TrackMatch::not_found(),
            },
        )
    }

    async fn try_create(
        &self,
        name: &str,
        tracks: &[Track],
        token: &str,
    ) -> Result<(String, usize), ProviderError> {
        let response = self
            .client
            .get(format!("{}/me", self.api_url))
            .bearer_auth(token)
            .send()
            .await?;
        let user: CurrentUser = http::json(response).await?;

        let response = self
            .client
            .post(format!("{}/users/{}/playlists", self.api_url, user.id))
            .bearer_auth(token)
            .json(&json!({
                "name": format!("{} (Converted)", name),
                "description": "Converted playlist",
                "public": false,
            }))
            .send()
            .await?;
        let playlist: CreatedPlaylist = http::json(response).await?;

        // One batch only; tracks past the provider limit are dropped.
        let uris: Vec<String> = tracks
            .iter()
            .filter_map(|t| t.platform_track_id.as_ref())
            .map(|id| format!("spotify:track:{}", id))
            .take(MAX_TRACKS_PER_REQUEST)
            .collect();

        let mut added = 0;
        if !uris.is_empty() {
            let result = self
                .client
                .post(format!("{}/playlists/{}/tracks", self.api_url, playlist.id))
                .bearer_auth(token)
                .json(&json!({ "uris": uris }))
                .send()
                .await;

            match result {
                Ok(response) => match http::checked(response).await {
                    Ok(_) => added = uris.len(),
                    Err(e) => self.add_failed(e),
                },
                Err(e) => self.add_failed(e.into()),
            }
        }

        Ok((playlist.external_urls.spotify, added))
    }

    fn add_failed(&self, error: ProviderError) {
        self.observer.emit(Event::TrackAddFailed {
            provider: ProviderId::Spotify,
            track: "track batch".to_string(),
            reason: error.to_string(),
        });
    }
}

#[async_trait]
impl PlaylistExtractor for SpotifyProvider {
    async fn extract(&self, url: &str) -> Result<PlaylistDescriptor, ProviderError> {
        let id = playlist_id(url).ok_or_else(|| ProviderError::InvalidUrl(url.to_string()))?;
        let token = self.app_token().await?;

        let response = self
            .client
            .get(format!("{}/playlists/{}", self.api_url, id))
            .bearer_auth(&token)
            .send()
            .await?;
        let playlist: PlaylistResponse = http::json(response).await?;

        let mut tracks = Vec::new();
        let mut next = Some(format!(
            "{}/playlists/{}/tracks?limit={}",
            self.api_url, id, PAGE_SIZE
        ));
        let mut page = 0;

        while let Some(page_url) = next.take() {
            page += 1;
            let body = match self.fetch_page(&page_url, &token).await {
                Ok(body) => body,
                Err(e) => {
                    self.observer.emit(Event::PaginationStopped {
                        provider: ProviderId::Spotify,
                        page,
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            // Removed or unavailable entries come back with a null track.
            for track in body.items.into_iter().filter_map(|item| item.track) {
                if track.name.is_empty() {
                    continue;
                }
                let artist = track
                    .artists
                    .into_iter()
                    .next()
                    .map(|a| a.name)
                    .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
                tracks.push(
                    Track::new(artist, track.name)
                        .with_duration(track.duration_ms.map(|ms| (ms / 1000) as u32)),
                );
            }

            next = body.next;
        }

        let image = playlist
            .images
            .and_then(|images| images.into_iter().next())
            .map(|i| i.url);

        Ok(PlaylistDescriptor::new(
            playlist.name,
            ProviderId::Spotify,
            image,
            tracks,
        ))
    }
}

#[async_trait]
impl TrackMatcher for SpotifyProvider {
    async fn search(&self, query: &str) -> TrackMatch {
        match self.try_search(query).await {
            Ok(result) => result,
            Err(e) => {
                self.observer.emit(Event::SearchFailed {
                    provider: ProviderId::Spotify,
                    query: query.to_string(),
                    reason: e.to_string(),
                });
                TrackMatch::not_found()
            }
        }
    }
}

#[async_trait]
impl PlaylistCreator for SpotifyProvider {
    async fn create(&self, name: &str, tracks: &[Track], access_token: &str) -> Option<String> {
        match self.try_create(name, tracks, access_token).await {
            Ok((url, added)) => {
                self.observer.emit(Event::PlaylistCreated {
                    provider: ProviderId::Spotify,
                    url: url.clone(),
                    added,
                });
                Some(url)
            }
            Err(e) => {
                self.observer.emit(Event::CreationSkipped {
                    provider: ProviderId::Spotify,
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

#[async_trait]
impl PlaylistLister for SpotifyProvider {
    async fn list(&self, access_token: &str) -> Result<Vec<PlaylistSummary>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/me/playlists", self.api_url))
            .query(&[("limit", PAGE_SIZE)])
            .bearer_auth(access_token)
            .send()
            .await?;
        let playlists: UserPlaylists = http::json(response).await?;

        Ok(playlists
            .items
            .into_iter()
            .map(|p| PlaylistSummary {
                id: p.id,
                name: p.name,
                tracks: p.tracks.total,
                image: p.images.and_then(|i| i.into_iter().next()).map(|i| i.url),
                external_url: p.external_urls.spotify,
            })
            .collect())
    }
}
