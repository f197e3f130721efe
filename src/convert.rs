//! Conversion pipeline.
//!
//! A conversion walks through the stages
//! `Idle -> Validating -> Detecting -> Extracting -> Matching -> Creating -> Done`;
//! any stage can end in `Failed`. Per-track failures never fail the request
//! and neither does playlist creation: a conversion that got as far as
//! matching always returns a [`ConversionResult`].
//!
//! Matching is sequential: every search is followed by a fixed pause
//! (`match_delay`) to stay under the destination's per-minute limits.

use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use tokio::time::sleep;

use crate::{
    config::Config,
    credentials::{CredentialManager, FileCredentialStore, OAuthRefresher},
    detect::detect,
    error::{ConvertError, ProviderError},
    events::{Event, Observer, Stage},
    providers::{self, Providers},
    types::{
        ConversionResult, ConvertRequest, OriginalPlaylist, PlaylistDescriptor, PlaylistSummary,
        ProviderId, Track, TrackMatch,
    },
    utils,
};

pub struct Converter {
    providers: Providers,
    credentials: Arc<CredentialManager>,
    observer: Arc<dyn Observer>,
    match_delay: Duration,
}

impl Converter {
    pub fn new(
        providers: Providers,
        credentials: Arc<CredentialManager>,
        observer: Arc<dyn Observer>,
        match_delay: Duration,
    ) -> Self {
        Self {
            providers,
            credentials,
            observer,
            match_delay,
        }
    }

    /// Wires the real adapters, the file credential store and the OAuth
    /// refresher from `config`.
    pub fn from_config(config: &Config, observer: Arc<dyn Observer>) -> Result<Self, reqwest::Error> {
        let client = providers::http_client(config)?;
        let credentials = CredentialManager::new(
            Arc::new(FileCredentialStore::new(config.credentials_path.clone())),
            Arc::new(OAuthRefresher::new(client.clone(), config.clone())),
            Arc::clone(&observer),
        );

        Ok(Self::new(
            Providers::from_config(client, config, Arc::clone(&observer)),
            Arc::new(credentials),
            observer,
            config.match_delay,
        ))
    }

    fn enter(&self, stage: Stage) {
        self.observer.emit(Event::StageChanged(stage));
    }

    /// Runs one conversion. `caller` is the authenticated user, if any; it is
    /// only required when `request.create_playlist` is set.
    pub async fn convert(
        &self,
        request: &ConvertRequest,
        caller: Option<&str>,
    ) -> Result<ConversionResult, ConvertError> {
        self.enter(Stage::Idle);
        match self.run(request, caller).await {
            Ok(result) => {
                self.enter(Stage::Done);
                Ok(result)
            }
            Err(e) => {
                self.enter(Stage::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &ConvertRequest,
        caller: Option<&str>,
    ) -> Result<ConversionResult, ConvertError> {
        self.enter(Stage::Validating);
        let url = request.url.trim();
        if url.is_empty() || request.target_platform.is_empty() {
            return Err(ConvertError::Input(
                "URL and target platform are required".to_string(),
            ));
        }
        let target: ProviderId = request.target_platform.parse().map_err(|_| {
            ConvertError::Input(format!(
                "Unsupported target platform: {}",
                request.target_platform
            ))
        })?;
        let caller = caller.filter(|c| !c.is_empty());
        if request.create_playlist && caller.is_none() {
            return Err(ConvertError::Unauthenticated);
        }

        self.enter(Stage::Detecting);
        let source = detect(url).ok_or(ConvertError::UnsupportedUrl)?;
        if source == target {
            return Err(ConvertError::SamePlatform);
        }

        self.enter(Stage::Extracting);
        let playlist = self.extract(url, source).await?;

        self.enter(Stage::Matching);
        let tracks = self.match_tracks(playlist.tracks, target).await;
        let match_rate = utils::match_rate(&tracks);

        let mut created_playlist_url = None;
        if let (true, Some(user)) = (request.create_playlist, caller) {
            self.enter(Stage::Creating);
            created_playlist_url = self
                .create(user, &playlist.name, &tracks, target)
                .await;
        }

        Ok(ConversionResult {
            original_playlist: OriginalPlaylist {
                name: playlist.name,
                platform: source,
                track_count: playlist.track_count,
                image: playlist.cover_image_url,
            },
            tracks,
            target_platform: target,
            match_rate,
            created_playlist_url,
        })
    }

    async fn extract(
        &self,
        url: &str,
        source: ProviderId,
    ) -> Result<PlaylistDescriptor, ConvertError> {
        let extractor = self
            .providers
            .extractor(source)
            .ok_or(ConvertError::Extraction)?;

        self.observer.emit(Event::ExtractionStarted {
            provider: source,
            url: url.to_string(),
        });
        let playlist = extractor.extract(url).await.map_err(|e| match e {
            ProviderError::QuotaExceeded => ConvertError::Quota { provider: source },
            _ => ConvertError::Extraction,
        })?;
        self.observer.emit(Event::ExtractionCompleted {
            provider: source,
            tracks: playlist.track_count,
        });

        Ok(playlist)
    }

    /// Searches every track on `target`, in order, pausing after each search.
    pub async fn match_tracks(&self, tracks: Vec<Track>, target: ProviderId) -> Vec<Track> {
        let matcher = self.providers.matcher(target);
        let mut matched = Vec::with_capacity(tracks.len());

        for (index, track) in tracks.into_iter().enumerate() {
            let query = utils::search_query(&track);
            let result = match &matcher {
                Some(matcher) => matcher.search(&query).await,
                None => TrackMatch::not_found(),
            };

            self.observer.emit(Event::TrackMatched {
                index,
                query,
                found: result.found,
            });
            matched.push(track.matched(result));

            sleep(self.match_delay).await;
        }

        matched
    }

    async fn create(
        &self,
        user: &str,
        name: &str,
        tracks: &[Track],
        target: ProviderId,
    ) -> Option<String> {
        let skip = |reason: String| {
            self.observer.emit(Event::CreationSkipped {
                provider: target,
                reason,
            });
            None
        };

        let Some(creator) = self.providers.creator(target) else {
            return skip(format!("{} playlists cannot be created", target));
        };

        let token = match self.credentials.access_token(user, target).await {
            Ok(token) => token,
            Err(e) => return skip(ConvertError::from(e).public_message()),
        };

        let available: Vec<Track> = tracks
            .iter()
            .filter(|t| t.is_available() && t.platform_track_id.is_some())
            .cloned()
            .collect();

        creator.create(name, &available, &token).await
    }

    /// Lists the caller's own playlists on `provider`.
    pub async fn list_playlists(
        &self,
        user: &str,
        provider: ProviderId,
    ) -> Result<Vec<PlaylistSummary>, ConvertError> {
        let lister = self.providers.lister(provider).ok_or_else(|| {
            ConvertError::Input(format!("Listing {} playlists is not supported", provider))
        })?;

        let token = self.credentials.access_token(user, provider).await?;

        lister.list(&token).await.map_err(|e| match e {
            ProviderError::QuotaExceeded => {
                self.observer.emit(Event::QuotaExceeded {
                    provider,
                    phase: "listing",
                });
                ConvertError::Quota { provider }
            }
            ProviderError::ApiNotEnabled => ConvertError::ApiNotEnabled { provider },
            ProviderError::Status { status, body } => ConvertError::Provider {
                status,
                body: serde_json::from_str::<Value>(&body)
                    .unwrap_or_else(|_| json!({ "error": { "message": body } })),
            },
            other => ConvertError::Unexpected(other.to_string()),
        })
    }
}
