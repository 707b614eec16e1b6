//! # Playback Session
//!
//! The single mutable aggregate behind the player screen.
//!
//! [`Session`] is owned by the [`SessionController`](crate::SessionController)
//! and only changes through its operations. The view layer reads it through
//! [`SessionSnapshot`], which never exposes the live handle itself.
//!
//! Invariants kept by every transition:
//! - `phase == Idle` exactly when no handle is live
//! - no current track implies `Idle`
//! - `position <= duration` whenever the duration is known

use bridge_traits::{PlaybackSessionId, PlaybackStatus};
use core_library::display::format_time;
use core_library::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, SessionErrorKind};

/// Slider upper bound when no duration is known yet.
pub const MIN_SLIDER_MAX: Duration = Duration::from_millis(1);

/// Discrete playback lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
}

impl Phase {
    /// Returns `true` for phases that own a live handle.
    pub fn has_handle(&self) -> bool {
        !matches!(self, Phase::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Playing => "playing",
            Phase::Paused => "paused",
        }
    }
}

/// Error flag kept on the session until the next successful start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
    pub track_id: Option<TrackId>,
    pub recoverable: bool,
}

impl SessionError {
    pub fn from_error(error: &PlaybackError, track_id: Option<TrackId>) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            track_id,
            recoverable: error.is_recoverable(),
        }
    }
}

/// What a status update did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StatusOutcome {
    /// Originated from a handle that is no longer live.
    Stale,
    Applied { track_id: TrackId },
    /// The track reached its end; the session is now paused at the end.
    Finished { track: Track },
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    current_track: Option<Track>,
    phase: Phase,
    position: Duration,
    duration: Duration,
    handle: Option<PlaybackSessionId>,
    last_error: Option<SessionError>,
    tracks: Vec<Track>,
    library_notice: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn find_track(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|track| &track.id == id)
    }

    pub(crate) fn handle(&self) -> Option<PlaybackSessionId> {
        self.handle
    }

    pub(crate) fn position(&self) -> Duration {
        self.position
    }

    pub(crate) fn duration(&self) -> Duration {
        self.duration
    }

    /// Replace the known track set.
    ///
    /// The first track is preselected (without starting playback) when
    /// nothing is current yet.
    pub(crate) fn set_library(&mut self, tracks: Vec<Track>, notice: Option<String>) {
        self.tracks = tracks;
        self.library_notice = notice;

        if self.current_track.is_none() {
            if let Some(first) = self.tracks.first().cloned() {
                self.reset_for(first);
            }
        }
    }

    /// Make `track` current with zeroed progress. Any handle must already
    /// have been taken out with [`take_handle`](Self::take_handle).
    pub(crate) fn reset_for(&mut self, track: Track) {
        self.current_track = Some(track);
        self.phase = Phase::Idle;
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;
        self.handle = None;
        self.last_error = None;
    }

    pub(crate) fn begin_load(&mut self, handle: PlaybackSessionId) {
        self.handle = Some(handle);
        self.phase = Phase::Loading;
    }

    /// Adopt the id the port actually returned for the load in flight.
    pub(crate) fn rebind_handle(&mut self, handle: PlaybackSessionId) {
        if self.handle.is_some() {
            self.handle = Some(handle);
        }
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        debug_assert!(phase.has_handle() == self.handle.is_some());
        self.phase = phase;
    }

    /// Detach the live handle and fall back to `Idle`.
    pub(crate) fn take_handle(&mut self) -> Option<PlaybackSessionId> {
        self.phase = Phase::Idle;
        self.handle.take()
    }

    pub(crate) fn is_live(&self, handle: PlaybackSessionId) -> bool {
        self.handle == Some(handle)
    }

    /// Move the playhead without touching the port. Clamped to the duration.
    pub(crate) fn preview_position(&mut self, target: Duration) -> Duration {
        self.position = self.clamp(target);
        self.position
    }

    pub(crate) fn clamp(&self, position: Duration) -> Duration {
        if self.duration.is_zero() {
            position
        } else {
            position.min(self.duration)
        }
    }

    pub(crate) fn apply_status(&mut self, status: &PlaybackStatus) -> StatusOutcome {
        if !self.is_live(status.session) {
            return StatusOutcome::Stale;
        }
        let Some(track) = self.current_track.clone() else {
            return StatusOutcome::Stale;
        };

        if let Some(duration) = status.duration.filter(|d| !d.is_zero()) {
            self.duration = duration;
        }
        self.position = self.clamp(status.position);

        if status.did_just_finish {
            if !self.duration.is_zero() {
                self.position = self.duration;
            }
            self.phase = Phase::Paused;
            return StatusOutcome::Finished { track };
        }

        StatusOutcome::Applied { track_id: track.id }
    }

    pub(crate) fn record_error(&mut self, error: SessionError) {
        self.last_error = Some(error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_track: self.current_track.clone(),
            phase: self.phase,
            position: self.position,
            duration: self.duration,
            has_handle: self.handle.is_some(),
            last_error: self.last_error.clone(),
            tracks: self.tracks.clone(),
            library_notice: self.library_notice.clone(),
        }
    }
}

/// Read-only view of the session for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub current_track: Option<Track>,
    pub phase: Phase,
    pub position: Duration,
    /// Zero until the engine or the library reports one.
    pub duration: Duration,
    pub has_handle: bool,
    pub last_error: Option<SessionError>,
    pub tracks: Vec<Track>,
    /// Set when the library list is empty because access was refused.
    pub library_notice: Option<String>,
}

impl SessionSnapshot {
    /// Duration reported by the engine, else the one known from the library.
    pub fn effective_duration(&self) -> Duration {
        if !self.duration.is_zero() {
            return self.duration;
        }
        self.current_track
            .as_ref()
            .and_then(|track| track.duration)
            .unwrap_or(Duration::ZERO)
    }

    pub fn position_label(&self) -> String {
        format_time(self.position)
    }

    pub fn duration_label(&self) -> String {
        format_time(self.effective_duration())
    }

    pub fn slider_max(&self) -> Duration {
        let duration = self.effective_duration();
        if duration.is_zero() {
            MIN_SLIDER_MAX
        } else {
            duration
        }
    }

    /// Whether `id` is the highlighted track in the song list.
    pub fn is_current(&self, id: &TrackId) -> bool {
        self.current_track
            .as_ref()
            .map(|track| &track.id == id)
            .unwrap_or(false)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// First broken session invariant, if any.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if (self.phase == Phase::Idle) == self.has_handle {
            return Some("phase is Idle exactly when no handle is live");
        }
        if self.current_track.is_none() && self.phase != Phase::Idle {
            return Some("no current track implies Idle");
        }
        if !self.duration.is_zero() && self.position > self.duration {
            return Some("position must not exceed duration");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, ms: u64) -> Track {
        Track::new(id, format!("{id}.mp3"), format!("file:///{id}.mp3"))
            .with_duration(Duration::from_millis(ms))
    }

    fn loaded_session() -> (Session, PlaybackSessionId) {
        let mut session = Session::new();
        session.set_library(vec![track("1", 200_000), track("2", 150_000)], None);
        let handle = PlaybackSessionId::new();
        session.begin_load(handle);
        session.set_phase(Phase::Playing);
        (session, handle)
    }

    #[test]
    fn test_library_preselects_first_track() {
        let mut session = Session::new();
        session.set_library(vec![track("1", 200_000), track("2", 150_000)], None);

        let snapshot = session.snapshot();
        assert!(snapshot.is_current(&TrackId::new("1")));
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(!snapshot.has_handle);
        assert_eq!(snapshot.invariant_violation(), None);
    }

    #[test]
    fn test_empty_library_keeps_notice() {
        let mut session = Session::new();
        session.set_library(Vec::new(), Some("no access".into()));

        let snapshot = session.snapshot();
        assert!(snapshot.current_track.is_none());
        assert_eq!(snapshot.library_notice.as_deref(), Some("no access"));
        assert_eq!(snapshot.slider_max(), MIN_SLIDER_MAX);
    }

    #[test]
    fn test_status_from_live_handle_applies() {
        let (mut session, handle) = loaded_session();
        let status = PlaybackStatus::new(
            handle,
            Duration::from_millis(1_000),
            Some(Duration::from_millis(200_000)),
        );

        assert!(matches!(
            session.apply_status(&status),
            StatusOutcome::Applied { .. }
        ));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.position, Duration::from_millis(1_000));
        assert_eq!(snapshot.duration, Duration::from_millis(200_000));
        assert_eq!(snapshot.position_label(), "0:01");
        assert_eq!(snapshot.duration_label(), "3:20");
    }

    #[test]
    fn test_stale_status_is_ignored() {
        let (mut session, _handle) = loaded_session();
        let before = session.snapshot();
        let stale = PlaybackStatus::new(
            PlaybackSessionId::new(),
            Duration::from_millis(9_000),
            Some(Duration::from_millis(10_000)),
        );

        assert_eq!(session.apply_status(&stale), StatusOutcome::Stale);
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_position_clamped_to_duration() {
        let (mut session, handle) = loaded_session();
        let status = PlaybackStatus::new(
            handle,
            Duration::from_millis(250_000),
            Some(Duration::from_millis(200_000)),
        );
        session.apply_status(&status);
        assert_eq!(session.position(), Duration::from_millis(200_000));

        assert_eq!(
            session.preview_position(Duration::from_secs(500)),
            Duration::from_millis(200_000)
        );
        assert_eq!(session.snapshot().invariant_violation(), None);
    }

    #[test]
    fn test_finished_pauses_at_end() {
        let (mut session, handle) = loaded_session();
        let status = PlaybackStatus::new(
            handle,
            Duration::from_millis(199_500),
            Some(Duration::from_millis(200_000)),
        )
        .finished();

        match session.apply_status(&status) {
            StatusOutcome::Finished { track } => assert_eq!(track.id, TrackId::new("1")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Paused);
        assert_eq!(snapshot.position, snapshot.duration);
        assert!(snapshot.has_handle);
    }

    #[test]
    fn test_reset_zeroes_progress() {
        let (mut session, handle) = loaded_session();
        session.apply_status(&PlaybackStatus::new(
            handle,
            Duration::from_millis(5_000),
            Some(Duration::from_millis(200_000)),
        ));

        assert_eq!(session.take_handle(), Some(handle));
        session.reset_for(track("2", 150_000));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.position, Duration::ZERO);
        assert_eq!(snapshot.duration, Duration::ZERO);
        assert_eq!(snapshot.phase, Phase::Idle);
        // Library duration stands in until the engine reports one.
        assert_eq!(snapshot.duration_label(), "2:30");
    }

    #[test]
    fn test_invariant_violation_detected() {
        let snapshot = SessionSnapshot {
            phase: Phase::Playing,
            has_handle: false,
            ..Default::default()
        };
        assert!(snapshot.invariant_violation().is_some());
    }
}
