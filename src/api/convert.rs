use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};

use crate::{
    api::{AppState, caller},
    error::ConvertError,
    types::{ConversionResult, ConvertRequest},
    warning,
};

pub async fn convert(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<ConversionResult>, ConvertError> {
    let Json(request) = payload.map_err(|e| ConvertError::Input(e.body_text()))?;

    match state.converter.convert(&request, caller(&headers)).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            if let ConvertError::Unexpected(detail) = &e {
                warning!("Conversion error: {}", detail);
            }
            Err(e)
        }
    }
}
