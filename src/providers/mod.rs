//! # Provider adapters
//!
//! Every streaming platform is integrated through the same four capability
//! traits:
//!
//! - [`PlaylistExtractor`] - read a playlist and its tracks from a URL
//! - [`TrackMatcher`] - find one track in the platform catalog
//! - [`PlaylistCreator`] - create a playlist for the user and fill it
//! - [`PlaylistLister`] - list the user's own playlists
//!
//! Each platform module provides one type implementing the capabilities the
//! platform supports, and [`Providers`] is the single lookup table keyed by
//! [`ProviderId`]. Adding a platform means adding a module and registering
//! it in [`Providers::from_config`]; no caller branches on the platform.
//!
//! | Platform | Extract | Match | Create | List |
//! |----------|---------|-------|--------|------|
//! | spotify  | yes     | yes   | yes    | yes  |
//! | youtube  | yes     | yes   | yes    | yes  |
//! | apple    | name only, no tracks | yes | no | no |
//!
//! The Apple extractor only scrapes the public page title and always
//! returns an empty track list. It is a known, deliberate limitation.

pub mod apple;
mod http;
pub mod spotify;
pub mod youtube;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::Config,
    error::ProviderError,
    events::Observer,
    types::{PlaylistDescriptor, PlaylistSummary, ProviderId, Track, TrackMatch},
};

pub use apple::AppleProvider;
pub use http::{GoogleErrorReason, google_error_reason};
pub use spotify::SpotifyProvider;
pub use youtube::{YoutubeMock, YoutubeProvider};

#[async_trait]
pub trait PlaylistExtractor: Send + Sync {
    /// Reads the playlist behind `url`.
    ///
    /// Fails only when the playlist id cannot be parsed or the initial
    /// metadata fetch fails; a failing page mid-pagination ends the track
    /// list early instead.
    async fn extract(&self, url: &str) -> Result<PlaylistDescriptor, ProviderError>;
}

#[async_trait]
pub trait TrackMatcher: Send + Sync {
    /// Searches the catalog for `query` and takes the first result.
    ///
    /// Never fails: transport, parse and quota errors count as not found.
    async fn search(&self, query: &str) -> TrackMatch;
}

#[async_trait]
pub trait PlaylistCreator: Send + Sync {
    /// Creates a private playlist named after `name` and adds every track
    /// carrying a platform track id. Returns the playlist URL, or `None`
    /// when the playlist itself could not be created.
    async fn create(&self, name: &str, tracks: &[Track], access_token: &str) -> Option<String>;
}

#[async_trait]
pub trait PlaylistLister: Send + Sync {
    async fn list(&self, access_token: &str) -> Result<Vec<PlaylistSummary>, ProviderError>;
}

/// Adapter lookup table keyed by platform.
#[derive(Clone, Default)]
pub struct Providers {
    extractors: HashMap<ProviderId, Arc<dyn PlaylistExtractor>>,
    matchers: HashMap<ProviderId, Arc<dyn TrackMatcher>>,
    creators: HashMap<ProviderId, Arc<dyn PlaylistCreator>>,
    listers: HashMap<ProviderId, Arc<dyn PlaylistLister>>,
}

/// Builds the HTTP client shared by every adapter.
pub fn http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires the real adapters for every platform.
    pub fn from_config(client: Client, config: &Config, observer: Arc<dyn Observer>) -> Self {
        let spotify = Arc::new(SpotifyProvider::new(
            client.clone(),
            config,
            Arc::clone(&observer),
        ));
        let youtube = Arc::new(YoutubeProvider::new(
            client.clone(),
            config,
            Arc::clone(&observer),
        ));
        let apple = Arc::new(AppleProvider::new(client, config, observer));

        Self::new()
            .with_extractor(ProviderId::Spotify, spotify.clone())
            .with_matcher(ProviderId::Spotify, spotify.clone())
            .with_creator(ProviderId::Spotify, spotify.clone())
            .with_lister(ProviderId::Spotify, spotify)
            .with_extractor(ProviderId::Youtube, youtube.clone())
            .with_matcher(ProviderId::Youtube, youtube.clone())
            .with_creator(ProviderId::Youtube, youtube.clone())
            .with_lister(ProviderId::Youtube, youtube)
            .with_extractor(ProviderId::Apple, apple.clone())
            .with_matcher(ProviderId::Apple, apple)
    }

    pub fn with_extractor(mut self, id: ProviderId, adapter: Arc<dyn PlaylistExtractor>) -> Self {
        self.extractors.insert(id, adapter);
        self
    }

    pub fn with_matcher(mut self, id: ProviderId, adapter: Arc<dyn TrackMatcher>) -> Self {
        self.matchers.insert(id, adapter);
        self
    }

    pub fn with_creator(mut self, id: ProviderId, adapter: Arc<dyn PlaylistCreator>) -> Self {
        self.creators.insert(id, adapter);
        self
    }

    pub fn with_lister(mut self, id: ProviderId, adapter: Arc<dyn PlaylistLister>) -> Self {
        self.listers.insert(id, adapter);
        self
    }

    pub fn extractor(&self, id: ProviderId) -> Option<Arc<dyn PlaylistExtractor>> {
        self.extractors.get(&id).cloned()
    }

    pub fn matcher(&self, id: ProviderId) -> Option<Arc<dyn TrackMatcher>> {
        self.matchers.get(&id).cloned()
    }

    pub fn creator(&self, id: ProviderId) -> Option<Arc<dyn PlaylistCreator>> {
        self.creators.get(&id).cloned()
    }

    pub fn lister(&self, id: ProviderId) -> Option<Arc<dyn PlaylistLister>> {
        self.listers.get(&id).cloned()
    }
}
