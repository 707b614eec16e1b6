//! # Session Controller
//!
//! Serializes user intents into an ordered sequence of playback port
//! commands and session transitions.
//!
//! ## Ordering
//!
//! Every operation that touches the live handle (`select_track`,
//! `toggle_play_pause`, `commit_seek`, `unmount`, library reloads) runs under
//! one async operation lock, so later intents queue behind the one in flight
//! in arrival order. Track switches and unmount additionally bump an epoch
//! before queueing. A load that resumes under an outdated epoch is discarded
//! and its handle released, so a superseded selection can never become
//! current again.
//!
//! The session itself sits behind a short synchronous lock that is never held
//! across an await. Snapshots and status callbacks therefore stay responsive
//! while a port call is outstanding.
//!
//! ## Handles
//!
//! The controller reserves the handle id before calling
//! [`PlaybackAdapter::load`], so the session owns a handle for the whole
//! `Loading` phase and status callbacks can be matched against it.

use bridge_traits::{
    AudioMode, MediaLibrary, PlaybackAdapter, PlaybackOptions, PlaybackRequest,
    PlaybackSessionId, PlaybackStatus, StatusCallback,
};
use core_library::{LibraryService, Track, TrackId};
use core_runtime::config::{CoreConfig, PlaybackSettings};
use core_runtime::events::{CoreEvent, EventBus, EventStream, LibraryEvent, PlaybackEvent};
use core_runtime::logging::strip_path;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{PlaybackCommand, PlaybackError, Result};
use crate::session::{Phase, Session, SessionError, SessionSnapshot, StatusOutcome};

/// Called when the current track plays to its end.
///
/// Invoked after the session has moved to `Paused` at the end of the track,
/// outside of any controller lock. Advancing to another track is left to the
/// implementor.
pub trait TrackFinishedHook: Send + Sync {
    fn on_track_finished(&self, track: &Track);
}

struct Inner {
    adapter: Arc<dyn PlaybackAdapter>,
    library: LibraryService,
    settings: PlaybackSettings,
    audio_mode: AudioMode,
    events: EventBus,
    session: Mutex<Session>,
    op_lock: tokio::sync::Mutex<()>,
    epoch: AtomicU64,
    finish_hook: RwLock<Option<Arc<dyn TrackFinishedHook>>>,
}

/// Owner of the playback session. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(
        adapter: Arc<dyn PlaybackAdapter>,
        library: Arc<dyn MediaLibrary>,
        settings: PlaybackSettings,
        events: EventBus,
    ) -> Self {
        Self::build(adapter, library, settings, AudioMode::default(), events)
    }

    pub fn from_config(config: &CoreConfig, events: EventBus) -> Self {
        Self::build(
            Arc::clone(&config.playback_adapter),
            Arc::clone(&config.media_library),
            config.playback,
            config.audio_mode,
            events,
        )
    }

    fn build(
        adapter: Arc<dyn PlaybackAdapter>,
        library: Arc<dyn MediaLibrary>,
        settings: PlaybackSettings,
        audio_mode: AudioMode,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                adapter,
                library: LibraryService::new(library),
                settings,
                audio_mode,
                events,
                session: Mutex::new(Session::new()),
                op_lock: tokio::sync::Mutex::new(()),
                epoch: AtomicU64::new(0),
                finish_hook: RwLock::new(None),
            }),
        }
    }

    pub fn with_finish_hook(self, hook: Arc<dyn TrackFinishedHook>) -> Self {
        *self.inner.finish_hook.write() = Some(hook);
        self
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.lock().snapshot()
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.inner.session.lock().tracks().to_vec()
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.inner.events.subscribe())
    }

    /// Screen mount: apply the audio mode, then load the library.
    ///
    /// A rejected audio mode is logged and does not stop the mount.
    pub async fn mount(&self) -> Result<SessionSnapshot> {
        let mode = self.inner.audio_mode;
        match timeout(
            self.inner.settings.command_timeout,
            self.inner.adapter.configure_audio_mode(mode),
        )
        .await
        {
            Ok(Ok(())) => debug!(?mode, "Audio mode configured"),
            Ok(Err(e)) => warn!(error = %e, "Failed to configure audio mode"),
            Err(_) => warn!("Audio mode configuration timed out"),
        }

        self.load_library().await?;
        Ok(self.snapshot())
    }

    /// Enumerate the library and replace the known track set.
    ///
    /// The first track becomes current when nothing is selected yet. A
    /// refused permission leaves an empty list and a notice on the snapshot.
    #[instrument(skip(self))]
    pub async fn load_library(&self) -> Result<usize> {
        let _guard = self.inner.op_lock.lock().await;

        let loaded = match self.inner.library.load().await {
            Ok(loaded) => loaded,
            Err(e) => {
                let error = PlaybackError::from(e);
                warn!(error = %error, "Library load failed");
                self.inner
                    .publish_library(LibraryEvent::LoadFailed {
                        message: error.to_string(),
                    });
                self.inner
                    .session
                    .lock()
                    .record_error(SessionError::from_error(&error, None));
                return Err(error);
            }
        };

        let count = loaded.tracks.len();
        match loaded.notice.clone() {
            Some(message) => self
                .inner
                .publish_library(LibraryEvent::PermissionDenied { message }),
            None => self
                .inner
                .publish_library(LibraryEvent::TracksLoaded { count }),
        }

        let preselected = {
            let mut session = self.inner.session.lock();
            let had_track = session.current_track().is_some();
            session.set_library(loaded.tracks, loaded.notice);
            if had_track {
                None
            } else {
                session.current_track().cloned()
            }
        };
        if let Some(track) = preselected {
            debug!(track_id = %track.id, "Preselected first track");
            self.inner.publish(PlaybackEvent::TrackSelected {
                track_id: track.id.to_string(),
                title: track.title,
            });
        }

        info!(count, "Library ready");
        Ok(count)
    }

    /// Make `id` the current track and start playing it.
    ///
    /// The previous handle is released, bounded by the release timeout,
    /// before a new one is created. Returns `Ok(())` without loading when a
    /// later selection or unmount supersedes this one.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::TrackNotFound`] when `id` is not in the track set
    /// - [`PlaybackError::LoadFailure`] when the track cannot be loaded; the
    ///   track stays current in `Idle`
    #[instrument(skip(self, id), fields(track_id = %id))]
    pub async fn select_track(&self, id: &TrackId) -> Result<()> {
        let track = self
            .inner
            .session
            .lock()
            .find_track(id)
            .cloned()
            .ok_or_else(|| PlaybackError::TrackNotFound(id.clone()))?;

        let epoch = self.inner.next_epoch();
        let _guard = self.inner.op_lock.lock().await;
        if self.inner.is_superseded(epoch) {
            debug!(epoch, "Selection superseded before it started");
            return Ok(());
        }

        self.inner.release_current().await;

        self.inner.session.lock().reset_for(track.clone());
        self.inner.publish(PlaybackEvent::TrackSelected {
            track_id: track.id.to_string(),
            title: track.title.clone(),
        });

        self.inner.start_playback(epoch).await
    }

    /// Idle starts (or retries) the current track, Playing pauses, Paused
    /// resumes. Does nothing without a current track.
    ///
    /// A rejected pause or resume keeps the previous phase.
    #[instrument(skip(self))]
    pub async fn toggle_play_pause(&self) -> Result<()> {
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        let _guard = self.inner.op_lock.lock().await;
        if self.inner.is_superseded(epoch) {
            debug!(epoch, "Toggle superseded by a later selection");
            return Ok(());
        }

        let (phase, handle, has_track) = {
            let session = self.inner.session.lock();
            (
                session.phase(),
                session.handle(),
                session.current_track().is_some(),
            )
        };

        match (phase, handle) {
            (Phase::Idle, _) if has_track => self.inner.start_playback(epoch).await,
            (Phase::Playing, Some(handle)) => self.inner.pause(handle).await,
            (Phase::Paused, Some(handle)) => self.inner.resume(handle).await,
            _ => {
                trace!(phase = phase.as_str(), "Toggle ignored");
                Ok(())
            }
        }
    }

    /// Apply a status update from the port.
    ///
    /// Returns `false` when the update came from a handle that is no longer
    /// live; such updates leave the session untouched.
    pub fn on_status_update(&self, status: PlaybackStatus) -> bool {
        self.inner.apply_status(status)
    }

    /// Scrubber drag: move the playhead without issuing a command.
    pub fn seek_to(&self, target: Duration) -> Duration {
        let mut session = self.inner.session.lock();
        if session.current_track().is_none() {
            return Duration::ZERO;
        }
        session.preview_position(target)
    }

    /// Scrubber release: seek the live handle. The phase is unchanged.
    #[instrument(skip(self, target), fields(position_ms = millis(target)))]
    pub async fn commit_seek(&self, target: Duration) -> Result<()> {
        let _guard = self.inner.op_lock.lock().await;

        let (handle, target) = {
            let mut session = self.inner.session.lock();
            let Some(handle) = session.handle() else {
                trace!("Seek ignored without a live handle");
                return Ok(());
            };
            (handle, session.preview_position(target))
        };

        let outcome = timeout(
            self.inner.settings.command_timeout,
            self.inner.adapter.seek(handle, target),
        )
        .await;

        match outcome {
            Ok(Ok(())) => {
                let track_id = {
                    let mut session = self.inner.session.lock();
                    if session.is_live(handle) {
                        session.preview_position(target);
                    }
                    session.current_track().map(|t| t.id.to_string())
                };
                if let Some(track_id) = track_id {
                    self.inner.publish(PlaybackEvent::Seeked {
                        track_id,
                        position_ms: millis(target),
                    });
                }
                Ok(())
            }
            Ok(Err(e)) => Err(self.inner.transient(PlaybackCommand::Seek, e.to_string())),
            Err(_) => Err(self.inner.transient_timeout(PlaybackCommand::Seek)),
        }
    }

    /// Screen unmount: release the live handle and return to `Idle`.
    ///
    /// Any queued selection is superseded.
    #[instrument(skip(self))]
    pub async fn unmount(&self) {
        self.inner.next_epoch();
        let _guard = self.inner.op_lock.lock().await;
        self.inner.release_current().await;
        debug!("Session torn down");
    }
}

/// Whole milliseconds for events and log fields; saturates past `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.inner.session.lock().phase())
            .field("epoch", &self.inner.epoch.load(Ordering::SeqCst))
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl Inner {
    fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_superseded(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) != epoch
    }

    fn publish(&self, event: PlaybackEvent) {
        self.events.publish(CoreEvent::Playback(event));
    }

    fn publish_library(&self, event: LibraryEvent) {
        self.events.publish(CoreEvent::Library(event));
    }

    fn status_callback(self: &Arc<Self>) -> StatusCallback {
        let weak: Weak<Inner> = Arc::downgrade(self);
        Arc::new(move |status| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_status(status);
            }
        })
    }

    fn current_track_id(&self) -> Option<TrackId> {
        self.session.lock().current_track().map(|t| t.id.clone())
    }

    /// Record an error on the session and report it.
    fn report(&self, error: &PlaybackError, track_id: Option<TrackId>) {
        self.session
            .lock()
            .record_error(SessionError::from_error(error, track_id.clone()));
        self.publish(PlaybackEvent::Error {
            track_id: track_id.map(|id| id.to_string()),
            kind: error.kind().to_string(),
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
    }

    fn transient(&self, command: PlaybackCommand, message: String) -> PlaybackError {
        let error = PlaybackError::TransientPlaybackError { command, message };
        warn!(%command, error = %error, "Playback command rejected");
        self.report(&error, self.current_track_id());
        error
    }

    fn transient_timeout(&self, command: PlaybackCommand) -> PlaybackError {
        let error = PlaybackError::command_timeout(command, self.settings.command_timeout);
        warn!(%command, error = %error, "Playback command timed out");
        self.report(&error, self.current_track_id());
        error
    }

    /// Detach and release the live handle, if any. Must hold `op_lock`.
    async fn release_current(&self) {
        let released = {
            let mut session = self.session.lock();
            session
                .take_handle()
                .map(|handle| (handle, session.current_track().map(|t| t.id.clone())))
        };

        if let Some((handle, track_id)) = released {
            self.release_handle(handle).await;
            if let Some(track_id) = track_id {
                self.publish(PlaybackEvent::Stopped {
                    track_id: track_id.to_string(),
                });
            }
        }
    }

    /// Unload a handle that is no longer owned by the session.
    ///
    /// Failures are logged only. After `release_timeout` the handle is
    /// treated as released.
    async fn release_handle(&self, handle: PlaybackSessionId) {
        let error = match timeout(self.settings.release_timeout, self.adapter.unload(handle)).await
        {
            Ok(Ok(())) => {
                debug!(session = %handle, "Released playback session");
                return;
            }
            Ok(Err(e)) => PlaybackError::ReleaseFailure {
                session: handle,
                message: e.to_string(),
            },
            Err(_) => PlaybackError::ReleaseFailure {
                session: handle,
                message: format!(
                    "forced after {}ms",
                    self.settings.release_timeout.as_millis()
                ),
            },
        };

        warn!(session = %handle, error = %error, "Playback session release failed");
        self.publish(PlaybackEvent::Error {
            track_id: None,
            kind: error.kind().to_string(),
            message: error.to_string(),
            recoverable: true,
        });
    }

    /// Create a handle for the current track and start it. Must hold
    /// `op_lock`; the session must be `Idle`.
    async fn start_playback(self: &Arc<Self>, epoch: u64) -> Result<()> {
        let (track, reserved) = {
            let mut session = self.session.lock();
            let Some(track) = session.current_track().cloned() else {
                return Ok(());
            };
            let reserved = PlaybackSessionId::new();
            session.begin_load(reserved);
            (track, reserved)
        };

        debug!(
            track_id = %track.id,
            session = %reserved,
            uri = strip_path(&track.uri),
            epoch,
            "Loading track"
        );
        self.publish(PlaybackEvent::Loading {
            track_id: track.id.to_string(),
        });

        let request = PlaybackRequest::new(reserved, track.uri.clone())
            .with_title(track.title.clone())
            .with_options(PlaybackOptions {
                status_interval: self.settings.status_interval,
                ..PlaybackOptions::default()
            });

        let loaded = timeout(
            self.settings.load_timeout,
            self.adapter.load(request, self.status_callback()),
        )
        .await;

        let handle = match loaded {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                let error = PlaybackError::LoadFailure {
                    track_id: track.id.clone(),
                    message: e.to_string(),
                };
                return Err(self.fail_load(&track, error, None).await);
            }
            Err(_) => {
                let error =
                    PlaybackError::load_timeout(track.id.clone(), self.settings.load_timeout);
                // The port may still complete the abandoned load later.
                return Err(self.fail_load(&track, error, Some(reserved)).await);
            }
        };

        if handle != reserved {
            warn!(reserved = %reserved, returned = %handle, "Adapter returned a different session id");
        }

        // A newer selection or unmount is waiting: drop this load.
        if self.is_superseded(epoch) || !self.session.lock().is_live(reserved) {
            debug!(track_id = %track.id, epoch, "Discarding superseded load");
            {
                let mut session = self.session.lock();
                if session.is_live(reserved) {
                    session.take_handle();
                }
            }
            self.release_handle(handle).await;
            return Ok(());
        }
        let still_loading = {
            let mut session = self.session.lock();
            session.rebind_handle(handle);
            session.phase() == Phase::Loading
        };
        // A finish reported during the load already paused the session.
        if !still_loading {
            debug!(track_id = %track.id, session = %handle, "Track finished while loading");
            return Ok(());
        }

        match timeout(self.settings.command_timeout, self.adapter.play(handle)).await {
            Ok(Ok(())) => {
                let started = {
                    let mut session = self.session.lock();
                    session.clear_error();
                    let loading = session.is_live(handle) && session.phase() == Phase::Loading;
                    if loading {
                        session.set_phase(Phase::Playing);
                    }
                    loading
                };
                if started {
                    info!(track_id = %track.id, session = %handle, "Playback started");
                    self.publish(PlaybackEvent::Started {
                        track_id: track.id.to_string(),
                        title: track.title,
                    });
                }
                Ok(())
            }
            outcome => {
                // Loaded but not playing: last known-good state is paused.
                self.session.lock().set_phase(Phase::Paused);
                Err(match outcome {
                    Ok(Err(e)) => self.transient(PlaybackCommand::Play, e.to_string()),
                    _ => self.transient_timeout(PlaybackCommand::Play),
                })
            }
        }
    }

    /// Back to `Idle` with the track kept current so the load can be retried.
    async fn fail_load(
        &self,
        track: &Track,
        error: PlaybackError,
        abandoned: Option<PlaybackSessionId>,
    ) -> PlaybackError {
        self.session.lock().take_handle();

        warn!(track_id = %track.id, error = %error, "Track load failed");
        self.report(&error, Some(track.id.clone()));

        if let Some(handle) = abandoned {
            self.release_handle(handle).await;
        }
        error
    }

    async fn pause(&self, handle: PlaybackSessionId) -> Result<()> {
        match timeout(self.settings.command_timeout, self.adapter.pause(handle)).await {
            Ok(Ok(())) => {
                let event = {
                    let mut session = self.session.lock();
                    if !session.is_live(handle) {
                        return Ok(());
                    }
                    session.set_phase(Phase::Paused);
                    session.current_track().map(|t| PlaybackEvent::Paused {
                        track_id: t.id.to_string(),
                        position_ms: millis(session.position()),
                    })
                };
                if let Some(event) = event {
                    self.publish(event);
                }
                Ok(())
            }
            Ok(Err(e)) => Err(self.transient(PlaybackCommand::Pause, e.to_string())),
            Err(_) => Err(self.transient_timeout(PlaybackCommand::Pause)),
        }
    }

    async fn resume(&self, handle: PlaybackSessionId) -> Result<()> {
        match timeout(self.settings.command_timeout, self.adapter.play(handle)).await {
            Ok(Ok(())) => {
                let event = {
                    let mut session = self.session.lock();
                    if !session.is_live(handle) {
                        return Ok(());
                    }
                    session.set_phase(Phase::Playing);
                    session.clear_error();
                    session.current_track().map(|t| PlaybackEvent::Resumed {
                        track_id: t.id.to_string(),
                        position_ms: millis(session.position()),
                    })
                };
                if let Some(event) = event {
                    self.publish(event);
                }
                Ok(())
            }
            Ok(Err(e)) => Err(self.transient(PlaybackCommand::Resume, e.to_string())),
            Err(_) => Err(self.transient_timeout(PlaybackCommand::Resume)),
        }
    }

    fn apply_status(&self, status: PlaybackStatus) -> bool {
        let (outcome, position, duration) = {
            let mut session = self.session.lock();
            let outcome = session.apply_status(&status);
            (outcome, session.position(), session.duration())
        };

        match outcome {
            StatusOutcome::Stale => {
                trace!(session = %status.session, "Discarding stale status update");
                false
            }
            StatusOutcome::Applied { track_id } => {
                self.publish(PlaybackEvent::PositionChanged {
                    track_id: track_id.to_string(),
                    position_ms: millis(position),
                    duration_ms: millis(duration),
                });
                true
            }
            StatusOutcome::Finished { track } => {
                info!(track_id = %track.id, "Track finished");
                self.publish(PlaybackEvent::Completed {
                    track_id: track.id.to_string(),
                });
                let hook = self.finish_hook.read().clone();
                if let Some(hook) = hook {
                    hook.on_track_finished(&track);
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_truncates_and_saturates() {
        assert_eq!(millis(Duration::from_micros(1_999)), 1);
        assert_eq!(millis(Duration::from_secs(200)), 200_000);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
