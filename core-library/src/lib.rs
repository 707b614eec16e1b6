//! # Library Module
//!
//! The set of playable tracks, as enumerated from the host media library.
//!
//! ## Overview
//!
//! - [`Track`] / [`TrackId`]: immutable domain model built from host assets
//! - [`LibraryService`]: permission request plus one-shot enumeration
//! - [`display`]: time formatting shared by the song list and the player

pub mod display;
pub mod error;
pub mod models;
pub mod service;

pub use display::format_time;
pub use error::{LibraryError, Result};
pub use models::{Track, TrackId};
pub use service::{LibraryService, LibrarySnapshot};
