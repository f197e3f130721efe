//! # CLI Module
//!
//! Command-line front end of the converter. Every command loads the
//! [`crate::config::Config`] built in `main`, wires a
//! [`crate::convert::Converter`] with an observer suited to the terminal and
//! prints its results with the coloured output macros and tables.
//!
//! ## Commands
//!
//! - [`convert`] - Converts a playlist URL to another platform, showing a
//!   progress bar while tracks are matched and a result table afterwards
//! - [`detect`] - Prints the platform a playlist URL belongs to
//! - [`playlists`] - Lists a user's own playlists on a platform
//! - [`serve`] - Runs the HTTP conversion service
//!
//! ## Usage
//!
//! ```bash
//! tunebridge detect https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M
//! tunebridge convert https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M --to youtube
//! tunebridge convert <url> --to spotify --create --user alice
//! tunebridge playlists spotify --user alice
//! tunebridge serve
//! ```

mod convert;
mod detect;
mod playlists;
mod serve;

pub use convert::convert;
pub use detect::detect;
pub use playlists::playlists;
pub use serve::serve;
