use std::sync::Arc;

use tabled::Table;

use crate::{
    config::Config,
    convert::Converter,
    error,
    events::{ConsoleObserver, Level},
    info,
    types::{PlaylistTableRow, ProviderId},
};

pub async fn playlists(config: &Config, provider: String, user: String) {
    let provider: ProviderId = match provider.parse() {
        Ok(p) => p,
        Err(e) => error!("{}", e),
    };

    let converter = match Converter::from_config(config, Arc::new(ConsoleObserver::new(Level::Warn))) {
        Ok(c) => c,
        Err(e) => error!("Cannot build HTTP client. Err: {}", e),
    };

    match converter.list_playlists(&user, provider).await {
        Ok(playlists) => {
            info!("{} playlists on {}", playlists.len(), provider);
            let rows: Vec<PlaylistTableRow> = playlists
                .into_iter()
                .map(|p| PlaylistTableRow {
                    name: p.name,
                    tracks: p.tracks,
                    url: p.external_url,
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        Err(e) => match e.action() {
            Some(action) => error!("{} ({})", e.public_message(), action),
            None => error!("{}", e.public_message()),
        },
    }
}
