use tunebridge::detect::detect;
use tunebridge::types::ProviderId;

#[test]
fn test_detect_spotify_playlist() {
    assert_eq!(
        detect("https://open.spotify.com/playlist/abc123"),
        Some(ProviderId::Spotify)
    );
}

#[test]
fn test_detect_youtube_music_playlist() {
    assert_eq!(
        detect("https://music.youtube.com/playlist?list=XYZ"),
        Some(ProviderId::Youtube)
    );
    assert_eq!(
        detect("https://www.youtube.com/playlist?list=PL123"),
        Some(ProviderId::Youtube)
    );
}

#[test]
fn test_detect_apple_music_playlist() {
    assert_eq!(
        detect("https://music.apple.com/us/playlist/x/pl.u-1"),
        Some(ProviderId::Apple)
    );
}

#[test]
fn test_detect_unrecognized_url() {
    assert_eq!(detect("https://example.com/foo"), None);
    assert_eq!(detect(""), None);
}

#[test]
fn test_detect_non_playlist_links() {
    // Track and album links are not playlists
    assert_eq!(detect("https://open.spotify.com/track/abc123"), None);
    assert_eq!(detect("https://www.youtube.com/watch?v=abc"), None);
}

#[test]
fn test_detect_is_case_sensitive() {
    assert_eq!(detect("https://OPEN.SPOTIFY.COM/PLAYLIST/abc"), None);
}
