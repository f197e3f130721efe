use std::sync::Arc;

use crate::{
    api::AppState,
    config::Config,
    convert::Converter,
    error,
    events::{ConsoleObserver, Level},
    server,
};

pub async fn serve(config: &Config) {
    let converter = match Converter::from_config(config, Arc::new(ConsoleObserver::new(Level::Warn))) {
        Ok(c) => c,
        Err(e) => error!("Cannot build HTTP client. Err: {}", e),
    };

    let state = Arc::new(AppState { converter });
    if let Err(e) = server::start_api_server(&config.server_addr, state).await {
        error!("Server stopped. Err: {}", e);
    }
}
