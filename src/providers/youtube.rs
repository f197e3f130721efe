//! YouTube Data API adapter.
//!
//! Public reads (playlist metadata, playlist items, search) authenticate
//! with the project API key; creation and listing use the caller's Google
//! access token. Every call spends daily quota, so a quota-exceeded answer
//! is handled as a normal outcome: searches report "not found", creation
//! stops adding tracks and keeps the playlist it already made.

use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use rand::{Rng, SeedableRng, rngs::StdRng};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::time::{Duration, sleep};

use crate::{
    config::Config,
    error::ProviderError,
    events::{Event, Observer},
    normalize::normalize,
    providers::{PlaylistCreator, PlaylistExtractor, PlaylistLister, TrackMatcher, http},
    types::{PlaylistDescriptor, PlaylistSummary, ProviderId, Track, TrackMatch},
    utils,
};

/// Placeholder titles the API returns for items that can't be played.
const UNPLAYABLE_TITLES: [&str; 2] = ["Deleted video", "Private video"];

/// The "Music" video category.
const MUSIC_CATEGORY: &str = "10";

const PAGE_SIZE: &str = "50";

static LIST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]list=([^&]+)").expect("valid regex"));

#[derive(Debug, Default, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    #[serde(default)]
    item_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistResource {
    #[serde(default)]
    id: String,
    snippet: PlaylistSnippet,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct PlaylistList {
    #[serde(default)]
    items: Vec<PlaylistResource>,
}

#[derive(Debug, Deserialize)]
struct ItemSnippet {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: Option<ItemSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoId,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
}

/// Network-free stand-in for video search.
///
/// Each query is a weighted coin flip: found with probability `hit_ratio`,
/// drawn from a seeded generator, so a fixed seed replays the same sequence
/// of outcomes. A ratio of `1.0` always finds and `0.0` never does; a NaN
/// ratio falls back to [`YoutubeMock::DEFAULT_HIT_RATIO`].
pub struct YoutubeMock {
    rng: Mutex<StdRng>,
    hit_ratio: f64,
}

impl YoutubeMock {
    pub const DEFAULT_HIT_RATIO: f64 = 0.8;

    pub fn new(seed: u64, hit_ratio: f64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            hit_ratio: if hit_ratio.is_nan() {
                Self::DEFAULT_HIT_RATIO
            } else {
                hit_ratio.clamp(0.0, 1.0)
            },
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
            hit_ratio: Self::DEFAULT_HIT_RATIO,
        }
    }

    pub fn search(&self) -> TrackMatch {
        let Ok(mut rng) = self.rng.lock() else {
            return TrackMatch::not_found();
        };

        if rng.random_bool(self.hit_ratio) {
            TrackMatch::found(Some(format!(
                "mock_video_{}",
                utils::random_alphanumeric(&mut *rng, 9)
            )))
        } else {
            TrackMatch::not_found()
        }
    }
}

pub struct YoutubeProvider {
    client: Client,
    api_url: String,
    api_key: String,
    add_delay: Duration,
    mock: Option<YoutubeMock>,
    observer: Arc<dyn Observer>,
}

pub fn playlist_id(url: &str) -> Option<String> {
    LIST_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn playlist_url(id: &str) -> String {
    format!("https://music.youtube.com/playlist?list={}", id)
}

impl YoutubeProvider {
    pub fn new(client: Client, config: &Config, observer: Arc<dyn Observer>) -> Self {
        Self {
            client,
            api_url: config.endpoints.youtube_api.clone(),
            api_key: config.youtube_api_key.clone(),
            add_delay: config.add_delay,
            mock: config.youtube_mock_mode.then(YoutubeMock::from_os_rng),
            observer,
        }
    }

    /// Replaces network search with the given mock.
    pub fn with_mock(mut self, mock: YoutubeMock) -> Self {
        self.mock = Some(mock);
        self
    }

    fn quota_exceeded(&self, phase: &'static str) {
        self.observer.emit(Event::QuotaExceeded {
            provider: ProviderId::Youtube,
            phase,
        });
    }

    async fn fetch_items(&self, id: &str, page_token: &str) -> Result<ItemsPage, ProviderError> {
        let response = self
            .client
            .get(format!("{}/playlistItems", self.api_url))
            .query(&[
                ("part", "snippet"),
                ("playlistId", id),
                ("maxResults", PAGE_SIZE),
                ("pageToken", page_token),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        http::json(response).await
    }

    async fn try_search(&self, query: &str) -> Result<TrackMatch, ProviderError> {
        let response = self
            .client
            .get(format!("{}/search", self.api_url))
            .query(&[
                ("part", "snippet"),
                ("q", query.trim()),
                ("type", "video"),
                ("videoCategoryId", MUSIC_CATEGORY),
                ("maxResults", "1"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let result: SearchResponse = http::json(response).await?;
        Ok(match result.items.into_iter().next() {
            Some(item) => TrackMatch::found(item.id.video_id),
            None => TrackMatch::not_found(),
        })
    }

    async fn add_item(&self, playlist_id: &str, video_id: &str, token: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(format!("{}/playlistItems", self.api_url))
            .query(&[("part", "snippet")])
            .bearer_auth(token)
            .json(&json!({
                "snippet": {
                    "playlistId": playlist_id,
                    "resourceId": {
                        "kind": "youtube#video",
                        "videoId": video_id,
                    },
                },
            }))
            .send()
            .await?;
        http::checked(response).await.map(|_| ())
    }

    async fn try_create(
        &self,
        name: &str,
        tracks: &[Track],
        token: &str,
    ) -> Result<(String, usize), ProviderError> {
        let response = self
            .client
            .post(format!("{}/playlists", self.api_url))
            .query(&[("part", "snippet,status")])
            .bearer_auth(token)
            .json(&json!({
                "snippet": {
                    "title": format!("{} (Converted)", name),
                    "description": "Converted playlist",
                },
                "status": { "privacyStatus": "private" },
            }))
            .send()
            .await?;
        let playlist: CreatedPlaylist = http::json(response).await?;

        // No batch endpoint: one insert per track, paced for the per-minute quota.
        let mut added = 0;
        for track in tracks {
            let Some(video_id) = track.platform_track_id.as_deref() else {
                continue;
            };

            match self.add_item(&playlist.id, video_id, token).await {
                Ok(()) => added += 1,
                Err(ProviderError::QuotaExceeded) => {
                    self.quota_exceeded("playlist creation");
                    break;
                }
                Err(e) => self.observer.emit(Event::TrackAddFailed {
                    provider: ProviderId::Youtube,
                    track: track.name.clone(),
                    reason: e.to_string(),
                }),
            }

            sleep(self.add_delay).await;
        }

        Ok((playlist_url(&playlist.id), added))
    }
}

#[async_trait]
impl PlaylistExtractor for YoutubeProvider {
    async fn extract(&self, url: &str) -> Result<PlaylistDescriptor, ProviderError> {
        let id = playlist_id(url).ok_or_else(|| ProviderError::InvalidUrl(url.to_string()))?;

        let response = self
            .client
            .get(format!("{}/playlists", self.api_url))
            .query(&[
                ("part", "snippet,contentDetails"),
                ("id", id.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let playlist = match http::json::<PlaylistList>(response).await {
            Ok(list) => list
                .items
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::Malformed(format!("playlist {} not found", id)))?,
            Err(ProviderError::QuotaExceeded) => {
                self.quota_exceeded("extraction");
                return Err(ProviderError::QuotaExceeded);
            }
            Err(e) => return Err(e),
        };

        let mut tracks = Vec::new();
        let mut page_token = String::new();
        let mut page = 0;

        loop {
            page += 1;
            let body = match self.fetch_items(&id, &page_token).await {
                Ok(body) => body,
                Err(e) => {
                    if matches!(e, ProviderError::QuotaExceeded) {
                        self.quota_exceeded("extraction");
                    }
                    self.observer.emit(Event::PaginationStopped {
                        provider: ProviderId::Youtube,
                        page,
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            for title in body
                .items
                .into_iter()
                .filter_map(|item| item.snippet.and_then(|s| s.title))
                .filter(|title| !title.is_empty() && !UNPLAYABLE_TITLES.contains(&title.as_str()))
            {
                let parts = normalize(&title);
                tracks.push(Track::new(parts.artist, parts.name));
            }

            match body.next_page_token {
                Some(token) if !token.is_empty() => page_token = token,
                _ => break,
            }
        }

        let image = playlist.snippet.thumbnails.medium.map(|t| t.url);
        Ok(PlaylistDescriptor::new(
            playlist.snippet.title,
            ProviderId::Youtube,
            image,
            tracks,
        ))
    }
}

#[async_trait]
impl TrackMatcher for YoutubeProvider {
    async fn search(&self, query: &str) -> TrackMatch {
        if let Some(mock) = &self.mock {
            return mock.search();
        }

        match self.try_search(query).await {
            Ok(result) => result,
            Err(ProviderError::QuotaExceeded) => {
                self.quota_exceeded("matching");
                TrackMatch::not_found()
            }
            Err(e) => {
                self.observer.emit(Event::SearchFailed {
                    provider: ProviderId::Youtube,
                    query: query.to_string(),
                    reason: e.to_string(),
                });
                TrackMatch::not_found()
            }
        }
    }
}

#[async_trait]
impl PlaylistCreator for YoutubeProvider {
    async fn create(&self, name: &str, tracks: &[Track], access_token: &str) -> Option<String> {
        match self.try_create(name, tracks, access_token).await {
            Ok((url, added)) => {
                self.observer.emit(Event::PlaylistCreated {
                    provider: ProviderId::Youtube,
                    url: url.clone(),
                    added,
                });
                Some(url)
            }
            Err(e) => {
                if matches!(e, ProviderError::QuotaExceeded) {
                    self.quota_exceeded("playlist creation");
                }
                self.observer.emit(Event::CreationSkipped {
                    provider: ProviderId::Youtube,
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

#[async_trait]
impl PlaylistLister for YoutubeProvider {
    async fn list(&self, access_token: &str) -> Result<Vec<PlaylistSummary>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/playlists", self.api_url))
            .query(&[
                ("part", "snippet,contentDetails,status"),
                ("mine", "true"),
                ("maxResults", PAGE_SIZE),
            ])
            .bearer_auth(access_token)
            .send()
            .await?;
        let playlists: PlaylistList = http::json(response).await?;

        Ok(playlists
            .items
            .into_iter()
            .map(|p| {
                let Thumbnails { medium, default } = p.snippet.thumbnails;
                PlaylistSummary {
                    external_url: format!("https://www.youtube.com/playlist?list={}", p.id),
                    id: p.id,
                    name: p.snippet.title,
                    tracks: p.content_details.item_count,
                    image: medium.or(default).map(|t| t.url),
                }
            })
            .collect())
    }
}
