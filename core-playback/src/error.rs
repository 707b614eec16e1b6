//! # Playback Error Types
//!
//! Every failure reported by the playback port or the library is converted
//! into a [`PlaybackError`] at the controller boundary. None of them is fatal
//! to the session: the worst case is `Idle` with an error flag, recoverable
//! through a fresh track selection.

use bridge_traits::PlaybackSessionId;
use core_library::{LibraryError, TrackId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Port command that can be rejected without ending the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Resume,
    Seek,
}

impl fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackCommand::Play => "play",
            PlaybackCommand::Pause => "pause",
            PlaybackCommand::Resume => "resume",
            PlaybackCommand::Seek => "seek",
        };
        f.write_str(name)
    }
}

/// Coarse classification surfaced on the session snapshot and in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionErrorKind {
    TrackNotFound,
    PermissionDenied,
    LoadFailure,
    TransientPlaybackError,
    ReleaseFailure,
    LibraryUnavailable,
}

impl SessionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionErrorKind::TrackNotFound => "TrackNotFound",
            SessionErrorKind::PermissionDenied => "PermissionDenied",
            SessionErrorKind::LoadFailure => "LoadFailure",
            SessionErrorKind::TransientPlaybackError => "TransientPlaybackError",
            SessionErrorKind::ReleaseFailure => "ReleaseFailure",
            SessionErrorKind::LibraryUnavailable => "LibraryUnavailable",
        }
    }
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while driving the playback session.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The requested track is not part of the known track set.
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// The host refused access to the media library.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A handle could not be created for the track.
    #[error("Failed to load track {track_id}: {message}")]
    LoadFailure { track_id: TrackId, message: String },

    /// The port rejected a play, pause, resume or seek command.
    #[error("Playback {command} rejected: {message}")]
    TransientPlaybackError {
        command: PlaybackCommand,
        message: String,
    },

    /// Releasing a handle failed or did not finish in time.
    #[error("Failed to release playback session {session}: {message}")]
    ReleaseFailure {
        session: PlaybackSessionId,
        message: String,
    },

    /// The library could not be enumerated.
    #[error("Library error: {0}")]
    Library(LibraryError),
}

impl From<LibraryError> for PlaybackError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::PermissionDenied(msg) => PlaybackError::PermissionDenied(msg),
            other => PlaybackError::Library(other),
        }
    }
}

impl PlaybackError {
    pub(crate) fn load_timeout(track_id: TrackId, timeout: Duration) -> Self {
        PlaybackError::LoadFailure {
            track_id,
            message: format!("load did not complete within {}ms", timeout.as_millis()),
        }
    }

    pub(crate) fn command_timeout(command: PlaybackCommand, timeout: Duration) -> Self {
        PlaybackError::TransientPlaybackError {
            command,
            message: format!("no response within {}ms", timeout.as_millis()),
        }
    }

    pub fn kind(&self) -> SessionErrorKind {
        match self {
            PlaybackError::TrackNotFound(_) => SessionErrorKind::TrackNotFound,
            PlaybackError::PermissionDenied(_) => SessionErrorKind::PermissionDenied,
            PlaybackError::LoadFailure { .. } => SessionErrorKind::LoadFailure,
            PlaybackError::TransientPlaybackError { .. } => {
                SessionErrorKind::TransientPlaybackError
            }
            PlaybackError::ReleaseFailure { .. } => SessionErrorKind::ReleaseFailure,
            PlaybackError::Library(_) => SessionErrorKind::LibraryUnavailable,
        }
    }

    /// Returns `true` if the session stays usable after this error.
    ///
    /// Only a library that cannot be enumerated at all needs a reload.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PlaybackError::Library(_))
    }

    /// Returns `true` if the error leaves the session in its previous phase.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::TransientPlaybackError { .. } | PlaybackError::ReleaseFailure { .. }
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::BridgeError;

    #[test]
    fn test_library_denial_maps_to_permission_denied() {
        let err = PlaybackError::from(LibraryError::PermissionDenied("refused".into()));
        assert_eq!(err.kind(), SessionErrorKind::PermissionDenied);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_library_failure_is_not_recoverable() {
        let err = PlaybackError::from(LibraryError::from(BridgeError::NotAvailable(
            "media store".into(),
        )));
        assert_eq!(err.kind(), SessionErrorKind::LibraryUnavailable);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_transient_classification() {
        let err = PlaybackError::command_timeout(PlaybackCommand::Seek, Duration::from_secs(5));
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Playback seek rejected: no response within 5000ms");

        let err = PlaybackError::load_timeout(TrackId::new("3"), Duration::from_secs(15));
        assert!(!err.is_transient());
        assert_eq!(err.kind(), SessionErrorKind::LoadFailure);
    }
}
