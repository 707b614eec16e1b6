//! Playback bridge traits and supporting types.
//!
//! These abstractions let the session controller drive the host's native
//! audio engine (AVPlayer, ExoPlayer, a desktop mixer) without knowing which
//! one it is talking to. Every call is async and may suspend; status updates
//! flow back through the [`StatusCallback`] handed to
//! [`PlaybackAdapter::load`].

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Opaque handle for one loaded audio resource inside a host adapter.
///
/// The controller reserves the identifier before calling
/// [`PlaybackAdapter::load`] and passes it in the [`PlaybackRequest`];
/// adapters adopt it as the handle of the resource they create so status
/// updates can be attributed even while the load is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host audio-session behaviour applied once when the player mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMode {
    /// Keep the microphone route closed.
    pub allows_recording: bool,
    /// Keep playing when the device's silent switch is on.
    pub plays_in_silent_mode: bool,
    /// Keep the audio session active when the app is backgrounded.
    pub stays_active_in_background: bool,
    /// Lower other apps' volume instead of stopping them.
    pub should_duck_others: bool,
}

impl Default for AudioMode {
    fn default() -> Self {
        Self {
            allows_recording: false,
            plays_in_silent_mode: true,
            stays_active_in_background: true,
            should_duck_others: true,
        }
    }
}

/// Options supplied alongside a load request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    /// Initial playback position.
    pub start_position: Duration,
    /// Initial volume (0.0 = muted, 1.0 = unity gain).
    pub initial_volume: f32,
    /// Suggested interval between status callbacks.
    pub status_interval: Duration,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            start_position: Duration::ZERO,
            initial_volume: 1.0,
            status_interval: Duration::from_millis(500),
        }
    }
}

/// Request describing the resource a host adapter should load.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    /// Handle reserved by the caller for the resource about to be created.
    pub session: PlaybackSessionId,
    /// Platform locator of the audio asset (file path, `content://`, `ph://`).
    pub uri: String,
    /// Display title forwarded to platform now-playing surfaces.
    pub title: Option<String>,
    pub options: PlaybackOptions,
}

impl PlaybackRequest {
    /// Construct a request for `uri` under the reserved `session` handle.
    pub fn new(session: PlaybackSessionId, uri: impl Into<String>) -> Self {
        Self {
            session,
            uri: uri.into(),
            title: None,
            options: PlaybackOptions::default(),
        }
    }

    /// Attach a display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach playback options.
    pub fn with_options(mut self, options: PlaybackOptions) -> Self {
        self.options = options;
        self
    }
}

/// Status report emitted by an adapter for one loaded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStatus {
    /// Handle of the resource this update originates from.
    pub session: PlaybackSessionId,
    /// Current playback position.
    pub position: Duration,
    /// Total duration, once the engine knows it.
    pub duration: Option<Duration>,
    /// Set on the update that reports natural end of the resource.
    pub did_just_finish: bool,
}

impl PlaybackStatus {
    pub fn new(session: PlaybackSessionId, position: Duration, duration: Option<Duration>) -> Self {
        Self {
            session,
            position,
            duration,
            did_just_finish: false,
        }
    }

    /// Mark this update as the end-of-resource report.
    pub fn finished(mut self) -> Self {
        self.did_just_finish = true;
        self
    }
}

/// Callback adapters invoke for every status update of a loaded resource.
///
/// Adapters may call it zero or more times per handle lifetime, from any
/// thread, including after the handle has been unloaded.
pub type StatusCallback = Arc<dyn Fn(PlaybackStatus) + Send + Sync>;

/// Trait for platform-specific playback adapters that drive native audio engines.
#[async_trait::async_trait]
pub trait PlaybackAdapter: Send + Sync {
    /// Apply host audio-session settings. Adapters without such a concept
    /// keep the default no-op.
    async fn configure_audio_mode(&self, _mode: AudioMode) -> Result<()> {
        Ok(())
    }

    /// Load the requested resource without starting it and return its handle.
    ///
    /// Implementations should adopt `request.session` as the handle and report
    /// progress through `on_status`.
    async fn load(
        &self,
        request: PlaybackRequest,
        on_status: StatusCallback,
    ) -> Result<PlaybackSessionId>;

    /// Begin or resume playback.
    async fn play(&self, session: PlaybackSessionId) -> Result<()>;

    /// Pause playback without releasing the resource.
    async fn pause(&self, session: PlaybackSessionId) -> Result<()>;

    /// Seek to an absolute position.
    async fn seek(&self, session: PlaybackSessionId, position: Duration) -> Result<()>;

    /// Release the resource. Unknown handles should yield
    /// [`BridgeError::UnknownSession`].
    async fn unload(&self, session: PlaybackSessionId) -> Result<()>;
}

/// Convenience result type alias for playback operations.
pub type PlaybackResult<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_options_default_values() {
        let opts = PlaybackOptions::default();
        assert_eq!(opts.start_position, Duration::ZERO);
        assert_eq!(opts.initial_volume, 1.0);
        assert_eq!(opts.status_interval, Duration::from_millis(500));
    }

    #[test]
    fn session_id_is_unique() {
        let a = PlaybackSessionId::new();
        let b = PlaybackSessionId::new();
        assert_ne!(a, b);
        assert_eq!(a, PlaybackSessionId::from_uuid(*a.as_uuid()));
    }

    #[test]
    fn audio_mode_defaults_match_player_setup() {
        let mode = AudioMode::default();
        assert!(!mode.allows_recording);
        assert!(mode.plays_in_silent_mode);
        assert!(mode.stays_active_in_background);
        assert!(mode.should_duck_others);
    }

    #[test]
    fn request_builder_keeps_reserved_session() {
        let session = PlaybackSessionId::new();
        let request = PlaybackRequest::new(session, "file:///music/a.mp3").with_title("a.mp3");
        assert_eq!(request.session, session);
        assert_eq!(request.title.as_deref(), Some("a.mp3"));
    }

    #[test]
    fn status_finished_flag() {
        let session = PlaybackSessionId::new();
        let status = PlaybackStatus::new(session, Duration::from_secs(3), None);
        assert!(!status.did_just_finish);
        assert!(status.finished().did_just_finish);
    }
}
