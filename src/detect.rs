use crate::types::ProviderId;

/// URL fragments that mark a playlist link on each platform.
const PLAYLIST_MARKERS: [(ProviderId, &[&str]); 3] = [
    (ProviderId::Spotify, &["open.spotify.com/playlist/"]),
    (
        ProviderId::Youtube,
        &["music.youtube.com/playlist", "youtube.com/playlist"],
    ),
    (ProviderId::Apple, &["music.apple.com/"]),
];

/// Classifies a playlist URL by its source platform.
///
/// Matching is a case-sensitive substring test on known playlist path
/// markers; the marker sets are disjoint, so the order they are tried in
/// does not matter. Returns `None` for anything unrecognized.
pub fn detect(url: &str) -> Option<ProviderId> {
    PLAYLIST_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| url.contains(m)))
        .map(|(provider, _)| *provider)
}
