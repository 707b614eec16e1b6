//! # Playback Session Module
//!
//! Drives the single playback session of the player screen.
//!
//! ## Overview
//!
//! This module handles:
//! - The [`Session`] aggregate and its [`Phase`] lifecycle
//! - [`SessionController`], which serializes user intents into port commands
//! - Stale status filtering and superseded-load cleanup
//! - Conversion of port failures into [`PlaybackError`]

pub mod controller;
pub mod error;
pub mod session;

pub use controller::{SessionController, TrackFinishedHook};
pub use error::{PlaybackCommand, PlaybackError, Result, SessionErrorKind};
pub use session::{Phase, Session, SessionError, SessionSnapshot, MIN_SLIDER_MAX};
