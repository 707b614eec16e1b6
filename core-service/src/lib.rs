//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided capabilities (a playback adapter and a
//! media library) into the player core and owns the mount/unmount lifecycle
//! of the playback session. Desktop hosts typically enable the
//! `desktop-shims` feature, which lets [`CoreConfig`] fall back to a
//! directory-backed media library when a music directory is configured.

pub mod error;

pub use error::{CoreError, Result};

pub use bridge_traits;
pub use core_library;
pub use core_playback;
pub use core_runtime;

pub use core_library::{Track, TrackId};
pub use core_playback::{Phase, SessionController, SessionSnapshot, TrackFinishedHook};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder, PlaybackSettings};
pub use core_runtime::events::{CoreEvent, EventBus, EventStream};

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub use bridge_desktop::DirectoryMediaLibrary;

use std::time::Duration;
use tracing::{debug, info};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    controller: SessionController,
    events: EventBus,
}

impl CoreService {
    /// Create a service from a validated configuration. Nothing is mounted yet.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let events = EventBus::new(config.event_buffer_size);
        let controller = SessionController::from_config(&config, events.clone());
        debug!(?config, "Core service created");
        Ok(Self { controller, events })
    }

    /// Mount the player screen: audio mode setup and library load.
    pub async fn mount(&self) -> Result<SessionSnapshot> {
        let snapshot = self.controller.mount().await?;
        info!(
            tracks = snapshot.tracks.len(),
            denied = snapshot.library_notice.is_some(),
            "Player mounted"
        );
        Ok(snapshot)
    }

    /// Unmount the player screen, releasing the live handle.
    pub async fn unmount(&self) {
        self.controller.unmount().await;
        info!("Player unmounted");
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub async fn select_track(&self, id: &TrackId) -> Result<()> {
        Ok(self.controller.select_track(id).await?)
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        Ok(self.controller.toggle_play_pause().await?)
    }

    pub fn seek_to(&self, target: Duration) -> Duration {
        self.controller.seek_to(target)
    }

    pub async fn commit_seek(&self, target: Duration) -> Result<()> {
        Ok(self.controller.commit_seek(target).await?)
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("controller", &self.controller)
            .field("events", &self.events)
            .finish()
    }
}

/// Build a service from `config` and mount it.
///
/// ```ignore
/// let config = CoreConfig::builder()
///     .playback_adapter(Arc::new(MyAdapter))
///     .music_dir("/home/me/Music")
///     .build()?;
/// let core = core_service::bootstrap(config).await?;
/// core.toggle_play_pause().await?;
/// ```
pub async fn bootstrap(config: CoreConfig) -> Result<CoreService> {
    let service = CoreService::new(config)?;
    service.mount().await?;
    Ok(service)
}
