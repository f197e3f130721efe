//! Structured events emitted by the conversion pipeline.
//!
//! Pipeline code never prints. It hands [`Event`] values to an injected
//! [`Observer`], and the embedding program decides what to do with them:
//! the CLI prints them with the coloured macros and drives a progress bar,
//! tests record them, the HTTP service prints warnings and errors only.

use std::sync::Mutex;

use crate::{info, success, types::ProviderId, warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Orchestrator state, see [`crate::convert::Converter::convert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    Detecting,
    Extracting,
    Matching,
    Creating,
    Done,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StageChanged(Stage),
    ExtractionStarted {
        provider: ProviderId,
        url: String,
    },
    ExtractionCompleted {
        provider: ProviderId,
        tracks: usize,
    },
    /// A page fetch failed mid-pagination; the tracks read so far are kept.
    PaginationStopped {
        provider: ProviderId,
        page: usize,
        reason: String,
    },
    TrackMatched {
        index: usize,
        query: String,
        found: bool,
    },
    SearchFailed {
        provider: ProviderId,
        query: String,
        reason: String,
    },
    QuotaExceeded {
        provider: ProviderId,
        phase: &'static str,
    },
    TrackAddFailed {
        provider: ProviderId,
        track: String,
        reason: String,
    },
    RefreshAttempted {
        provider: ProviderId,
    },
    RefreshSucceeded {
        provider: ProviderId,
    },
    RefreshFailed {
        provider: ProviderId,
        reason: String,
    },
    PlaylistCreated {
        provider: ProviderId,
        url: String,
        added: usize,
    },
    CreationSkipped {
        provider: ProviderId,
        reason: String,
    },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Event::StageChanged(Stage::Failed(_)) => Level::Error,
            Event::StageChanged(_) | Event::TrackMatched { .. } | Event::RefreshAttempted { .. } => {
                Level::Debug
            }
            Event::ExtractionStarted { .. }
            | Event::ExtractionCompleted { .. }
            | Event::RefreshSucceeded { .. }
            | Event::PlaylistCreated { .. } => Level::Info,
            Event::PaginationStopped { .. }
            | Event::SearchFailed { .. }
            | Event::QuotaExceeded { .. }
            | Event::TrackAddFailed { .. }
            | Event::RefreshFailed { .. }
            | Event::CreationSkipped { .. } => Level::Warn,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Event::StageChanged(stage) => format!("stage: {:?}", stage),
            Event::ExtractionStarted { provider, url } => {
                format!("Extracting {} playlist {}", provider, url)
            }
            Event::ExtractionCompleted { provider, tracks } => {
                format!("Extracted {} tracks from {}", tracks, provider)
            }
            Event::PaginationStopped {
                provider,
                page,
                reason,
            } => format!(
                "Stopped reading {} playlist at page {}: {}",
                provider, page, reason
            ),
            Event::TrackMatched {
                index,
                query,
                found,
            } => format!(
                "#{} \"{}\" {}",
                index + 1,
                query,
                if *found { "found" } else { "not found" }
            ),
            Event::SearchFailed {
                provider,
                query,
                reason,
            } => format!("Search for \"{}\" on {} failed: {}", query, provider, reason),
            Event::QuotaExceeded { provider, phase } => {
                format!("{} quota exceeded during {}", provider, phase)
            }
            Event::TrackAddFailed {
                provider,
                track,
                reason,
            } => format!("Adding {} to {} playlist failed: {}", track, provider, reason),
            Event::RefreshAttempted { provider } => format!("Refreshing {} token", provider),
            Event::RefreshSucceeded { provider } => format!("Refreshed {} token", provider),
            Event::RefreshFailed { provider, reason } => {
                format!("Refreshing {} token failed: {}", provider, reason)
            }
            Event::PlaylistCreated {
                provider,
                url,
                added,
            } => format!("Created {} playlist with {} tracks: {}", provider, added, url),
            Event::CreationSkipped { provider, reason } => {
                format!("Skipped {} playlist creation: {}", provider, reason)
            }
        }
    }
}

pub trait Observer: Send + Sync {
    fn emit(&self, event: Event);
}

/// Prints events at or above `min_level` with the coloured terminal macros.
pub struct ConsoleObserver {
    min_level: Level,
}

impl ConsoleObserver {
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }
}

impl Observer for ConsoleObserver {
    fn emit(&self, event: Event) {
        let level = event.level();
        if level < self.min_level {
            return;
        }

        match (level, &event) {
            (_, Event::PlaylistCreated { .. }) => success!("{}", event.message()),
            (Level::Warn | Level::Error, _) => warning!("{}", event.message()),
            _ => info!("{}", event.message()),
        }
    }
}

pub struct NullObserver;

impl Observer for NullObserver {
    fn emit(&self, _event: Event) {}
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl Observer for RecordingObserver {
    fn emit(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
