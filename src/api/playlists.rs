use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde_json::{Value, json};

use crate::{
    api::{AppState, caller},
    error::ConvertError,
    types::ProviderId,
    warning,
};

pub async fn playlists(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ConvertError> {
    let provider: ProviderId = provider.parse().map_err(ConvertError::Input)?;
    let user = caller(&headers).ok_or(ConvertError::Unauthenticated)?;

    match state.converter.list_playlists(user, provider).await {
        Ok(playlists) => Ok(Json(json!({
            "total": playlists.len(),
            "playlists": playlists,
            "source": provider,
        }))),
        Err(e) => {
            if let ConvertError::Unexpected(detail) = &e {
                warning!("{} playlist listing error: {}", provider, detail);
            }
            Err(e)
        }
    }
}
