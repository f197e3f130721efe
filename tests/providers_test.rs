use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tunebridge::config::{Config, Endpoints};
use tunebridge::convert::Converter;
use tunebridge::credentials::{CredentialManager, MemoryCredentialStore, OAuthRefresher};
use tunebridge::error::ProviderError;
use tunebridge::events::{Event, RecordingObserver};
use tunebridge::providers::{
    AppleProvider, PlaylistCreator, PlaylistExtractor, PlaylistLister, Providers, SpotifyProvider,
    TrackMatcher, YoutubeMock, YoutubeProvider, apple, spotify, youtube,
};
use tunebridge::types::{ConvertRequest, Credential, ProviderId, Track, TrackMatch};
use tunebridge::utils::now_epoch_seconds;

#[derive(Default)]
struct Fake {
    base: String,
    spotify_batches: Mutex<Vec<usize>>,
    youtube_adds: AtomicUsize,
    apple_pages: AtomicUsize,
}

type Shared = Arc<Fake>;

fn quota_body() -> Value {
    json!({
        "error": {
            "code": 403,
            "errors": [{ "domain": "youtube.quota", "reason": "quotaExceeded" }]
        }
    })
}

async fn spotify_token() -> Json<Value> {
    Json(json!({ "access_token": "app-token", "token_type": "Bearer", "expires_in": 3600 }))
}

async fn spotify_playlist(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "id": id,
        "name": "Road Trip",
        "images": [{ "url": "https://i.scdn.co/image/cover" }]
    }))
}

async fn spotify_tracks(
    State(fake): State<Shared>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if query.contains_key("offset") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    Json(json!({
        "items": [
            { "track": { "name": "One More Time", "artists": [{ "name": "Daft Punk" }], "duration_ms": 320357 } },
            { "track": null },
            { "track": { "name": "Nameless Artist Song", "artists": [], "duration_ms": 1000 } },
            { "track": { "name": "", "artists": [{ "name": "Ghost" }] } },
            { "track": { "name": "Around the World", "artists": [{ "name": "Daft Punk" }], "duration_ms": 429000 } }
        ],
        "next": format!("{}/spotify/v1/playlists/{}/tracks?offset=50&limit=50", fake.base, id)
    }))
    .into_response()
}

async fn spotify_add_tracks(State(fake): State<Shared>, Json(body): Json<Value>) -> Response {
    let uris = body["uris"].as_array().map(Vec::len).unwrap_or_default();
    fake.spotify_batches.lock().unwrap().push(uris);
    (StatusCode::CREATED, Json(json!({ "snapshot_id": "snap" }))).into_response()
}

async fn spotify_me() -> Json<Value> {
    Json(json!({ "id": "user1" }))
}

async fn spotify_create(Path(user): Path<String>) -> Response {
    assert_eq!(user, "user1");
    (
        StatusCode::CREATED,
        Json(json!({
            "id": "p1",
            "external_urls": { "spotify": "https://open.spotify.com/playlist/p1" }
        })),
    )
        .into_response()
}

async fn spotify_search(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let items = if query.get("q").is_some_and(|q| q.contains("Daft Punk")) {
        json!([{ "id": "4PTG3Z6ehGkBFwjybzWkR8" }])
    } else {
        json!([])
    };
    Json(json!({ "tracks": { "items": items } }))
}

async fn youtube_playlists() -> Json<Value> {
    Json(json!({
        "items": [{
            "id": "PLroad",
            "snippet": {
                "title": "Road Trip",
                "thumbnails": { "medium": { "url": "https://i.ytimg.com/medium.jpg" } }
            },
            "contentDetails": { "itemCount": 4 }
        }]
    }))
}

async fn youtube_items(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    match query.get("pageToken").map(String::as_str) {
        Some("page2") => Json(json!({
            "items": [
                { "snippet": { "title": "Some Song (Official Music Video)" } },
                { "snippet": { "title": "Private video" } }
            ]
        })),
        _ => Json(json!({
            "items": [
                { "snippet": { "title": "Daft Punk - One More Time" } },
                { "snippet": { "title": "Deleted video" } }
            ],
            "nextPageToken": "page2"
        })),
    }
}

async fn youtube_create() -> Json<Value> {
    Json(json!({ "id": "PLnew" }))
}

async fn youtube_add(State(fake): State<Shared>) -> Response {
    // The first insert succeeds, then the daily quota runs out
    if fake.youtube_adds.fetch_add(1, Ordering::SeqCst) == 0 {
        Json(json!({ "id": "item1" })).into_response()
    } else {
        (StatusCode::FORBIDDEN, Json(quota_body())).into_response()
    }
}

async fn youtube_search() -> Response {
    (StatusCode::FORBIDDEN, Json(quota_body())).into_response()
}

async fn itunes_search(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(query.get("entity").map(String::as_str), Some("song"));
    Json(json!({ "resultCount": 1, "results": [{ "trackId": 1440857781u64 }] }))
}

async fn spotify_my_playlists(Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("limit").map(String::as_str) != Some("50") {
        return (StatusCode::BAD_REQUEST, "expected limit=50").into_response();
    }
    Json(json!({
        "items": [{
            "id": "p1",
            "name": "Mine",
            "tracks": { "total": 12 },
            "images": null,
            "external_urls": { "spotify": "https://open.spotify.com/playlist/p1" }
        }]
    }))
    .into_response()
}

async fn apple_page(State(fake): State<Shared>) -> Html<&'static str> {
    fake.apple_pages.fetch_add(1, Ordering::SeqCst);
    Html("<html><head><title>Chill Mix - Playlist - Apple Music</title></head><body></body></html>")
}

async fn start() -> (Config, Shared) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let fake = Arc::new(Fake {
        base: base.clone(),
        ..Default::default()
    });

    let app = Router::new()
        .route("/spotify-accounts/api/token", post(spotify_token))
        .route("/spotify/v1/playlists/{id}", get(spotify_playlist))
        .route(
            "/spotify/v1/playlists/{id}/tracks",
            get(spotify_tracks).post(spotify_add_tracks),
        )
        .route("/spotify/v1/me", get(spotify_me))
        .route("/spotify/v1/me/playlists", get(spotify_my_playlists))
        .route("/spotify/v1/users/{user}/playlists", post(spotify_create))
        .route("/spotify/v1/search", get(spotify_search))
        .route(
            "/youtube/v3/playlists",
            get(youtube_playlists).post(youtube_create),
        )
        .route(
            "/youtube/v3/playlistItems",
            get(youtube_items).post(youtube_add),
        )
        .route("/youtube/v3/search", get(youtube_search))
        .route("/itunes/search", get(itunes_search))
        .route("/apple/us/playlist/chill/pl.u-1", get(apple_page))
        .with_state(fake.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config {
        endpoints: Endpoints::all_at(&base),
        youtube_api_key: "key".to_string(),
        match_delay: Duration::ZERO,
        add_delay: Duration::ZERO,
        ..Default::default()
    };
    (config, fake)
}

fn matched(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| {
            Track::new("Artist", format!("Song {}", i))
                .matched(TrackMatch::found(Some(format!("id{}", i))))
        })
        .collect()
}

#[tokio::test]
async fn test_spotify_extract_paginates_and_stops_on_failure() {
    let (config, _fake) = start().await;
    let observer = Arc::new(RecordingObserver::new());
    let provider = SpotifyProvider::new(reqwest::Client::new(), &config, observer.clone());

    let playlist = provider
        .extract("https://open.spotify.com/playlist/abc123?si=x")
        .await
        .unwrap();

    assert_eq!(playlist.name, "Road Trip");
    assert_eq!(playlist.source_provider, ProviderId::Spotify);
    assert_eq!(
        playlist.cover_image_url.as_deref(),
        Some("https://i.scdn.co/image/cover")
    );
    assert_eq!(playlist.track_count, 3);
    assert_eq!(playlist.tracks[0].artist, "Daft Punk");
    assert_eq!(playlist.tracks[0].name, "One More Time");
    assert_eq!(playlist.tracks[0].duration_seconds, Some(320));
    assert_eq!(playlist.tracks[1].artist, "unknown");
    assert_eq!(playlist.tracks[2].name, "Around the World");

    let stopped: Vec<Event> = observer
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::PaginationStopped { .. }))
        .collect();
    assert_eq!(stopped.len(), 1);
    assert!(matches!(stopped[0], Event::PaginationStopped { page: 2, .. }));
}

#[tokio::test]
async fn test_spotify_extract_invalid_url() {
    let (config, _fake) = start().await;
    let provider = SpotifyProvider::new(
        reqwest::Client::new(),
        &config,
        Arc::new(RecordingObserver::new()),
    );

    assert!(provider.extract("https://open.spotify.com/").await.is_err());
}

#[tokio::test]
async fn test_spotify_search() {
    let (config, _fake) = start().await;
    let provider = SpotifyProvider::new(
        reqwest::Client::new(),
        &config,
        Arc::new(RecordingObserver::new()),
    );

    let hit = provider.search("Daft Punk One More Time").await;
    assert!(hit.found);
    assert_eq!(hit.platform_track_id.as_deref(), Some("4PTG3Z6ehGkBFwjybzWkR8"));

    assert!(!provider.search("Nobody Nothing").await.found);
}

#[tokio::test]
async fn test_spotify_create_caps_batch() {
    let (config, fake) = start().await;
    let observer = Arc::new(RecordingObserver::new());
    let provider = SpotifyProvider::new(reqwest::Client::new(), &config, observer.clone());

    let url = provider.create("Road Trip", &matched(150), "user-token").await;

    assert_eq!(url.as_deref(), Some("https://open.spotify.com/playlist/p1"));
    assert_eq!(
        *fake.spotify_batches.lock().unwrap(),
        vec![spotify::MAX_TRACKS_PER_REQUEST]
    );
    assert!(observer.events().contains(&Event::PlaylistCreated {
        provider: ProviderId::Spotify,
        url: "https://open.spotify.com/playlist/p1".to_string(),
        added: 100,
    }));
}

#[tokio::test]
async fn test_spotify_list_reads_first_page_of_fifty() {
    let (config, _fake) = start().await;
    let provider = SpotifyProvider::new(
        reqwest::Client::new(),
        &config,
        Arc::new(RecordingObserver::new()),
    );

    let playlists = provider.list("user-token").await.unwrap();

    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0].name, "Mine");
    assert_eq!(playlists[0].tracks, 12);
    assert_eq!(playlists[0].external_url, "https://open.spotify.com/playlist/p1");
}

#[tokio::test]
async fn test_youtube_extract_skips_unplayable_items() {
    let (config, _fake) = start().await;
    let provider = YoutubeProvider::new(
        reqwest::Client::new(),
        &config,
        Arc::new(RecordingObserver::new()),
    );

    let playlist = provider
        .extract("https://music.youtube.com/playlist?list=PLroad")
        .await
        .unwrap();

    assert_eq!(playlist.name, "Road Trip");
    assert_eq!(
        playlist.cover_image_url.as_deref(),
        Some("https://i.ytimg.com/medium.jpg")
    );
    assert_eq!(playlist.track_count, 2);
    assert_eq!(playlist.tracks[0].artist, "Daft Punk");
    assert_eq!(playlist.tracks[0].name, "One More Time");
    assert_eq!(playlist.tracks[1].artist, "unknown");
    assert_eq!(playlist.tracks[1].name, "Some Song");
}

#[tokio::test]
async fn test_youtube_search_quota_is_not_found() {
    let (config, _fake) = start().await;
    let observer = Arc::new(RecordingObserver::new());
    let provider = YoutubeProvider::new(reqwest::Client::new(), &config, observer.clone());

    let result = provider.search("Daft Punk One More Time").await;

    assert_eq!(result, TrackMatch::not_found());
    assert!(observer.events().contains(&Event::QuotaExceeded {
        provider: ProviderId::Youtube,
        phase: "matching",
    }));
}

#[tokio::test]
async fn test_youtube_create_keeps_playlist_on_quota() {
    let (config, fake) = start().await;
    let observer = Arc::new(RecordingObserver::new());
    let provider = YoutubeProvider::new(reqwest::Client::new(), &config, observer.clone());

    let url = provider.create("Road Trip", &matched(3), "google-token").await;

    assert_eq!(
        url.as_deref(),
        Some("https://music.youtube.com/playlist?list=PLnew")
    );
    // One success, one quota failure, then no more attempts
    assert_eq!(fake.youtube_adds.load(Ordering::SeqCst), 2);
    assert_eq!(
        observer.count(|e| matches!(e, Event::PlaylistCreated { added: 1, .. })),
        1
    );
}

#[tokio::test]
async fn test_youtube_mock_is_controllable() {
    let config = Config::default();
    let observer = Arc::new(RecordingObserver::new());

    let always = YoutubeProvider::new(reqwest::Client::new(), &config, observer.clone())
        .with_mock(YoutubeMock::new(7, 1.0));
    let hit = always.search("same query").await;
    assert!(hit.found);
    let id = hit.platform_track_id.unwrap();
    assert!(id.starts_with("mock_video_"));
    assert_eq!(id.len(), "mock_video_".len() + 9);

    let never = YoutubeProvider::new(reqwest::Client::new(), &config, observer.clone())
        .with_mock(YoutubeMock::new(7, 0.0));
    assert!(!never.search("same query").await.found);

    // A fixed seed replays the same outcomes for repeated identical queries
    let a = YoutubeMock::new(11, 0.5);
    let b = YoutubeMock::new(11, 0.5);
    let outcomes: Vec<bool> = (0..50).map(|_| a.search().found).collect();
    let replay: Vec<bool> = (0..50).map(|_| b.search().found).collect();
    assert_eq!(outcomes, replay);
    assert!(outcomes.contains(&true));
    assert!(outcomes.contains(&false));

    assert!(observer.events().is_empty());
}

#[test]
fn test_youtube_mock_nan_ratio_does_not_panic() {
    let mock = YoutubeMock::new(1, f64::NAN);
    for _ in 0..20 {
        mock.search();
    }

    // Out-of-range ratios clamp
    assert!(YoutubeMock::new(1, f64::INFINITY).search().found);
    assert!(!YoutubeMock::new(1, -3.0).search().found);
}

#[tokio::test]
async fn test_convert_creates_youtube_playlist_despite_quota() {
    let (config, fake) = start().await;
    let client = reqwest::Client::new();
    let observer = Arc::new(RecordingObserver::new());

    let spotify = Arc::new(SpotifyProvider::new(client.clone(), &config, observer.clone()));
    let youtube = Arc::new(
        YoutubeProvider::new(client.clone(), &config, observer.clone())
            .with_mock(YoutubeMock::new(3, 1.0)),
    );
    let providers = Providers::new()
        .with_extractor(ProviderId::Spotify, spotify)
        .with_matcher(ProviderId::Youtube, youtube.clone())
        .with_creator(ProviderId::Youtube, youtube);

    let store = Arc::new(MemoryCredentialStore::new());
    store
        .insert(Credential {
            user_id: "alice".to_string(),
            provider: ProviderId::Youtube,
            access_token: "google-token".to_string(),
            refresh_token: None,
            expires_at_epoch_seconds: Some(now_epoch_seconds() + 3600),
            scope: Some("https://www.googleapis.com/auth/youtube".to_string()),
        })
        .await;
    let credentials = CredentialManager::new(
        store,
        Arc::new(OAuthRefresher::new(client, config.clone())),
        observer.clone(),
    );
    let converter = Converter::new(
        providers,
        Arc::new(credentials),
        observer.clone(),
        Duration::ZERO,
    );

    let result = converter
        .convert(
            &ConvertRequest {
                url: "https://open.spotify.com/playlist/abc123".to_string(),
                target_platform: "youtube".to_string(),
                create_playlist: true,
            },
            Some("alice"),
        )
        .await
        .unwrap();

    assert_eq!(result.tracks.len(), 3);
    assert_eq!(result.match_rate, 100.0);
    assert_eq!(
        result.created_playlist_url.as_deref(),
        Some("https://music.youtube.com/playlist?list=PLnew")
    );
    // One insert succeeded, the second hit the quota, the third was never tried
    assert_eq!(fake.youtube_adds.load(Ordering::SeqCst), 2);
    assert_eq!(
        observer.count(|e| matches!(e, Event::PlaylistCreated { added: 1, .. })),
        1
    );
}

#[tokio::test]
async fn test_apple_extract_scrapes_name_only() {
    let (config, fake) = start().await;
    let provider = AppleProvider::new(
        reqwest::Client::new(),
        &config,
        Arc::new(RecordingObserver::new()),
    );

    let playlist = provider
        .extract(&format!("{}/apple/us/playlist/chill/pl.u-1", fake.base))
        .await
        .unwrap();

    assert_eq!(playlist.name, "Chill Mix");
    assert_eq!(playlist.source_provider, ProviderId::Apple);
    assert!(playlist.tracks.is_empty());
    assert_eq!(playlist.track_count, 0);
}

#[tokio::test]
async fn test_apple_extract_rejects_foreign_hosts() {
    let (config, fake) = start().await;
    let provider = AppleProvider::new(
        reqwest::Client::new(),
        &config,
        Arc::new(RecordingObserver::new()),
    );
    let port = fake.base.rsplit(':').next().unwrap();

    for url in [
        format!("http://localhost:{}/apple/us/playlist/chill/pl.u-1", port),
        format!("http://localhost:{}/internal?ref=music.apple.com/", port),
        "https://evil.example/?ref=music.apple.com/".to_string(),
        "not a url".to_string(),
    ] {
        let result = provider.extract(&url).await;
        assert!(
            matches!(result, Err(ProviderError::InvalidUrl(_))),
            "{}",
            url
        );
    }
    assert_eq!(fake.apple_pages.load(Ordering::SeqCst), 0);
}

#[test]
fn test_apple_default_origin_is_https_music_apple_com() {
    let provider = AppleProvider::new(
        reqwest::Client::new(),
        &Config::default(),
        Arc::new(RecordingObserver::new()),
    );

    let rt = tokio::runtime::Runtime::new().unwrap();
    for url in [
        "http://music.apple.com/us/playlist/x/pl.u-1",
        "https://music.apple.com.evil.example/us/playlist/x/pl.u-1",
        "https://evil.example/?ref=music.apple.com/",
    ] {
        let result = rt.block_on(provider.extract(url));
        assert!(
            matches!(result, Err(ProviderError::InvalidUrl(_))),
            "{}",
            url
        );
    }
}

#[tokio::test]
async fn test_apple_search() {
    let (config, _fake) = start().await;
    let provider = AppleProvider::new(
        reqwest::Client::new(),
        &config,
        Arc::new(RecordingObserver::new()),
    );

    let hit = provider.search("Daft Punk One More Time").await;
    assert!(hit.found);
    assert_eq!(hit.platform_track_id.as_deref(), Some("1440857781"));
}

#[test]
fn test_playlist_id_parsing() {
    assert_eq!(
        spotify::playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc"),
        Some("37i9dQZF1DXcBWIGoYBM5M".to_string())
    );
    assert_eq!(spotify::playlist_id("https://open.spotify.com/"), None);
    assert_eq!(
        youtube::playlist_id("https://music.youtube.com/playlist?list=PL123&si=x"),
        Some("PL123".to_string())
    );
    assert_eq!(
        youtube::playlist_id("https://www.youtube.com/watch?v=a&list=PL9"),
        Some("PL9".to_string())
    );
    assert_eq!(youtube::playlist_id("https://music.youtube.com/playlist"), None);
}

#[test]
fn test_apple_playlist_name_fallback() {
    assert_eq!(apple::playlist_name("<html></html>"), "Apple Music Playlist");
    assert_eq!(
        apple::playlist_name("<title>Focus - Playlist - Apple Music</title>"),
        "Focus"
    );
}
