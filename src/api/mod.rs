//! # API Module
//!
//! HTTP endpoints of the conversion service, built on
//! [Axum](https://docs.rs/axum).
//!
//! ## Endpoints
//!
//! - `POST /api/convert` - [`convert`] runs one conversion and returns the
//!   matched tracks, the match rate and, when requested, the URL of the
//!   created playlist.
//! - `GET /api/playlists/{provider}` - [`playlists`] lists the caller's own
//!   playlists on a provider, refreshing the stored token when needed.
//! - `GET /health` - [`health`] returns status and version.
//!
//! ## Caller identity
//!
//! Sessions are established by the surrounding application. It passes the
//! authenticated user id in the `x-user-id` header; requests without it are
//! anonymous.
//!
//! ## Errors
//!
//! Every failure is rendered as `{ "error": { "message", "action"? } }` with
//! a status code for its category, see [`crate::error::ConvertError`].

mod convert;
mod health;
mod playlists;

use axum::http::HeaderMap;

pub use convert::convert;
pub use health::health;
pub use playlists::playlists;

use crate::convert::Converter;

pub const CALLER_HEADER: &str = "x-user-id";

pub struct AppState {
    pub converter: Converter,
}

pub fn caller(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
