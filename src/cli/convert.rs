use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    config::Config,
    convert::Converter,
    error,
    events::{Event, Level, Observer},
    info, success,
    types::ConvertRequest,
    utils, warning,
};

/// Drives a spinner while the source playlist is read and a bar while its
/// tracks are matched. Warnings are printed above the bar.
struct ProgressObserver {
    pb: ProgressBar,
}

impl ProgressObserver {
    fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        Self { pb }
    }

    fn start_matching(&self, tracks: usize) {
        self.pb.set_length(tracks as u64);
        self.pb.set_position(0);
        self.pb.set_style(
            ProgressStyle::with_template("{spinner:.blue} [{bar:30.blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
    }
}

impl Observer for ProgressObserver {
    fn emit(&self, event: Event) {
        match &event {
            Event::ExtractionStarted { .. } => self.pb.set_message(event.message()),
            Event::ExtractionCompleted { tracks, .. } => {
                self.pb.suspend(|| info!("{}", event.message()));
                self.start_matching(*tracks);
            }
            Event::TrackMatched { query, .. } => {
                self.pb.inc(1);
                self.pb.set_message(query.clone());
            }
            Event::PlaylistCreated { .. } => self.pb.suspend(|| success!("{}", event.message())),
            _ if event.level() >= Level::Warn => {
                self.pb.suspend(|| warning!("{}", event.message()))
            }
            _ => {}
        }
    }
}

pub async fn convert(
    config: &Config,
    url: String,
    target: String,
    create_playlist: bool,
    user: Option<String>,
) {
    let observer = Arc::new(ProgressObserver::new());
    let converter = match Converter::from_config(config, observer.clone()) {
        Ok(c) => c,
        Err(e) => error!("Cannot build HTTP client. Err: {}", e),
    };

    let request = ConvertRequest {
        url,
        target_platform: target,
        create_playlist,
    };

    let result = converter.convert(&request, user.as_deref()).await;
    observer.pb.finish_and_clear();

    let result = match result {
        Ok(r) => r,
        Err(e) => match e.action() {
            Some(action) => error!("{} ({})", e.public_message(), action),
            None => error!("{}", e.public_message()),
        },
    };

    println!("{}", Table::new(utils::track_table_rows(&result.tracks)));

    let available = result.tracks.iter().filter(|t| t.is_available()).count();
    info!(
        "{} ({}): {}/{} tracks found on {}, match rate {:.2}%",
        result.original_playlist.name,
        result.original_playlist.platform,
        available,
        result.tracks.len(),
        result.target_platform,
        result.match_rate
    );

    match (create_playlist, result.created_playlist_url) {
        (true, Some(url)) => success!("Playlist created: {}", url),
        (true, None) => warning!("Playlist was not created"),
        _ => {}
    }
}
