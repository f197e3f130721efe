use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};

use crate::{
    normalize::UNKNOWN_ARTIST,
    types::{Availability, Track, TrackTableRow},
};

/// Builds the catalog search query for a track. Tracks whose artist is the
/// unknown sentinel are searched by name alone.
pub fn search_query(track: &Track) -> String {
    if track.artist == UNKNOWN_ARTIST {
        track.name.trim().to_string()
    } else {
        format!("{} {}", track.artist, track.name).trim().to_string()
    }
}

/// Percentage of available tracks, rounded to two decimals. An empty track
/// list has a match rate of 0.
pub fn match_rate(tracks: &[Track]) -> f64 {
    if tracks.is_empty() {
        return 0.0;
    }

    let available = tracks.iter().filter(|t| t.is_available()).count();
    let rate = available as f64 * 100.0 / tracks.len() as f64;
    (rate * 100.0).round() / 100.0
}

pub fn now_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

pub fn random_alphanumeric<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
        .collect()
}

pub fn track_table_rows(tracks: &[Track]) -> Vec<TrackTableRow> {
    tracks
        .iter()
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            position: i + 1,
            artist: t.artist.clone(),
            name: t.name.clone(),
            status: match t.availability {
                Some(Availability::Available) => "available".to_string(),
                Some(Availability::Partial) => "partial".to_string(),
                Some(Availability::Unavailable) => "unavailable".to_string(),
                None => "-".to_string(),
            },
        })
        .collect()
}
