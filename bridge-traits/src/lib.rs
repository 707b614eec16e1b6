//! # Host Bridge Traits
//!
//! Capability traits the host platform implements for the player core.
//!
//! ## Traits
//!
//! - [`PlaybackAdapter`](playback::PlaybackAdapter) - native audio engine (load, play, pause, seek, unload)
//! - [`MediaLibrary`](library::MediaLibrary) - permissioned enumeration of on-device audio
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Provides |
//! |----------|---------------------|----------|
//! | Desktop  | `bridge-desktop`    | `MediaLibrary` |
//! | iOS      | host app            | all |
//! | Android  | host app            | all |
//!
//! ## Error Handling
//!
//! All bridge traits report [`BridgeError`](error::BridgeError). The core maps
//! these into its own error kinds at the controller boundary; a bridge error
//! is never fatal to the player.
//!
//! ## Thread Safety
//!
//! Bridges are shared behind `Arc` and must be `Send + Sync`. Status callbacks
//! may be invoked from any thread.

pub mod error;
pub mod library;
pub mod logging;
pub mod playback;

pub use error::BridgeError;

pub use library::{MediaAsset, MediaLibrary, PermissionStatus};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    AudioMode, PlaybackAdapter, PlaybackOptions, PlaybackRequest, PlaybackSessionId,
    PlaybackStatus, StatusCallback,
};
