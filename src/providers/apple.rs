//! Apple Music adapter.
//!
//! There is no public API for reading a playlist's tracks, so extraction
//! only scrapes the page title for the playlist name and returns no tracks.
//! Pages are fetched only from the configured Apple Music web origin.
//! Matching uses the unauthenticated iTunes search API. Apple playlists
//! cannot be created or listed.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url, header::USER_AGENT};
use serde::Deserialize;

use crate::{
    config::Config,
    error::ProviderError,
    events::{Event, Observer},
    providers::{PlaylistExtractor, TrackMatcher, http},
    types::{PlaylistDescriptor, ProviderId, TrackMatch},
};

const FALLBACK_NAME: &str = "Apple Music Playlist";

const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title[^>]*>([^<]+)</title>").expect("valid regex"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    track_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

pub struct AppleProvider {
    client: Client,
    search_url: String,
    web_origin: String,
    observer: Arc<dyn Observer>,
}

/// Playlist name from a page's `<title>`, which reads "Name - by ... - Apple Music".
pub fn playlist_name(html: &str) -> String {
    TITLE
        .captures(html)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().split(" - ").next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

impl AppleProvider {
    pub fn new(client: Client, config: &Config, observer: Arc<dyn Observer>) -> Self {
        Self {
            client,
            search_url: format!("{}/search", config.endpoints.itunes_api),
            web_origin: config.endpoints.apple_web.clone(),
            observer,
        }
    }

    /// Parses `url` and accepts it only when its scheme, host and port are
    /// those of the Apple Music web origin.
    fn page_url(&self, url: &str) -> Result<Url, ProviderError> {
        let invalid = || ProviderError::InvalidUrl(url.to_string());
        let origin = Url::parse(&self.web_origin).map_err(|_| invalid())?;
        let page = Url::parse(url).map_err(|_| invalid())?;

        if page.scheme() != origin.scheme()
            || page.host_str().is_none()
            || page.host_str() != origin.host_str()
            || page.port_or_known_default() != origin.port_or_known_default()
        {
            return Err(invalid());
        }
        Ok(page)
    }

    async fn try_search(&self, query: &str) -> Result<TrackMatch, ProviderError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("term", query),
                ("media", "music"),
                ("entity", "song"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let result: SearchResponse = http::json(response).await?;
        Ok(match result.results.into_iter().next() {
            Some(song) => TrackMatch::found(song.track_id.map(|id| id.to_string())),
            None => TrackMatch::not_found(),
        })
    }
}

#[async_trait]
impl PlaylistExtractor for AppleProvider {
    async fn extract(&self, url: &str) -> Result<PlaylistDescriptor, ProviderError> {
        let page = self.page_url(url)?;
        let response = self
            .client
            .get(page)
            .header(USER_AGENT, BROWSER_AGENT)
            .send()
            .await?;
        let html = http::checked(response).await?.text().await?;

        Ok(PlaylistDescriptor::new(
            playlist_name(&html),
            ProviderId::Apple,
            None,
            Vec::new(),
        ))
    }
}

#[async_trait]
impl TrackMatcher for AppleProvider {
    async fn search(&self, query: &str) -> TrackMatch {
        match self.try_search(query).await {
            Ok(result) => result,
            Err(e) => {
                self.observer.emit(Event::SearchFailed {
                    provider: ProviderId::Apple,
                    query: query.to_string(),
                    reason: e.to_string(),
                });
                TrackMatch::not_found()
            }
        }
    }
}
