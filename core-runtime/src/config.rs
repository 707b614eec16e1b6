//! # Core Configuration Module
//!
//! Configuration for the player core.
//!
//! ## Overview
//!
//! A [`CoreConfig`] bundles the host capabilities the session controller needs
//! (a [`PlaybackAdapter`] and a [`MediaLibrary`]) together with timing
//! settings and the audio mode applied at mount. It is built through
//! [`CoreConfigBuilder`], which fails fast when a required capability is
//! missing.
//!
//! When the `desktop-shims` feature is enabled and a music directory is set,
//! a `DirectoryMediaLibrary` is injected automatically if no library is
//! provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .playback_adapter(Arc::new(MyAdapter))
//!     .media_library(Arc::new(MyLibrary))
//!     .release_timeout(Duration::from_secs(1))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AudioMode, MediaLibrary, PlaybackAdapter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Timing policy applied at the playback port boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Upper bound for creating a handle. Elapsed loads count as load failures.
    pub load_timeout: Duration,
    /// Upper bound for play, pause and seek commands.
    pub command_timeout: Duration,
    /// Upper bound for releasing a handle. After it elapses the handle is
    /// considered released and the controller moves on.
    pub release_timeout: Duration,
    /// Suggested interval between adapter status callbacks.
    pub status_interval: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(15),
            command_timeout: Duration::from_secs(5),
            release_timeout: Duration::from_secs(2),
            status_interval: Duration::from_millis(500),
        }
    }
}

impl PlaybackSettings {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("load_timeout", self.load_timeout),
            ("command_timeout", self.command_timeout),
            ("release_timeout", self.release_timeout),
            ("status_interval", self.status_interval),
        ] {
            if value.is_zero() {
                return Err(Error::Config(format!("{name} must be greater than zero")));
            }
        }

        if self.release_timeout > self.load_timeout {
            return Err(Error::Config(
                "release_timeout must not exceed load_timeout".to_string(),
            ));
        }

        Ok(())
    }
}

/// Player core configuration. Use [`CoreConfig::builder`] to construct.
#[derive(Clone)]
pub struct CoreConfig {
    /// Native audio engine (required)
    pub playback_adapter: Arc<dyn PlaybackAdapter>,

    /// Device media library (required)
    pub media_library: Arc<dyn MediaLibrary>,

    /// Directory scanned by the desktop library shim, when used
    pub music_dir: Option<PathBuf>,

    pub playback: PlaybackSettings,

    /// Audio session behaviour applied at mount
    pub audio_mode: AudioMode,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("playback_adapter", &"PlaybackAdapter { ... }")
            .field("media_library", &"MediaLibrary { ... }")
            .field("music_dir", &self.music_dir)
            .field("playback", &self.playback)
            .field("audio_mode", &self.audio_mode)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates timing and buffer settings.
    pub fn validate(&self) -> Result<()> {
        self.playback.validate()?;

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if let Some(dir) = &self.music_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config("Music directory cannot be empty".to_string()));
            }
        }

        Ok(())
    }
}

fn playback_adapter_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PlaybackAdapter".to_string(),
        message: "PlaybackAdapter implementation is required to play audio. \
                 Mobile: inject the platform audio engine (AVPlayer/ExoPlayer). \
                 Desktop: inject an adapter over the host mixer."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_media_library(_music_dir: Option<&PathBuf>) -> Result<Arc<dyn MediaLibrary>> {
    Err(Error::CapabilityMissing {
        capability: "MediaLibrary".to_string(),
        message: "MediaLibrary implementation is required to enumerate tracks. \
                 Desktop: enable the 'desktop-shims' feature and set music_dir. \
                 Mobile: inject the platform media store."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_media_library(music_dir: Option<&PathBuf>) -> Result<Arc<dyn MediaLibrary>> {
    use bridge_desktop::DirectoryMediaLibrary;

    let dir = music_dir.ok_or_else(|| Error::CapabilityMissing {
        capability: "MediaLibrary".to_string(),
        message: "The desktop library scans a directory. Use .music_dir() to set it \
                 or inject a MediaLibrary implementation."
            .to_string(),
    })?;

    let library: Arc<dyn MediaLibrary> = Arc::new(DirectoryMediaLibrary::new(dir.clone()));
    Ok(library)
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    playback_adapter: Option<Arc<dyn PlaybackAdapter>>,
    media_library: Option<Arc<dyn MediaLibrary>>,
    music_dir: Option<PathBuf>,
    playback: PlaybackSettings,
    audio_mode: AudioMode,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    pub fn playback_adapter(mut self, adapter: Arc<dyn PlaybackAdapter>) -> Self {
        self.playback_adapter = Some(adapter);
        self
    }

    pub fn media_library(mut self, library: Arc<dyn MediaLibrary>) -> Self {
        self.media_library = Some(library);
        self
    }

    /// Directory the desktop library shim scans.
    pub fn music_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.music_dir = Some(dir.into());
        self
    }

    pub fn playback_settings(mut self, settings: PlaybackSettings) -> Self {
        self.playback = settings;
        self
    }

    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.playback.load_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.playback.command_timeout = timeout;
        self
    }

    pub fn release_timeout(mut self, timeout: Duration) -> Self {
        self.playback.release_timeout = timeout;
        self
    }

    pub fn status_interval(mut self, interval: Duration) -> Self {
        self.playback.status_interval = interval;
        self
    }

    pub fn audio_mode(mut self, mode: AudioMode) -> Self {
        self.audio_mode = mode;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when no playback adapter was supplied, or
    ///   no media library was supplied and no default can be provided
    /// - [`Error::Config`] when settings fail validation
    pub fn build(self) -> Result<CoreConfig> {
        let playback_adapter = self
            .playback_adapter
            .ok_or_else(playback_adapter_missing_error)?;

        let media_library = match self.media_library {
            Some(library) => library,
            None => provide_default_media_library(self.music_dir.as_ref())?,
        };

        let config = CoreConfig {
            playback_adapter,
            media_library,
            music_dir: self.music_dir,
            playback: self.playback,
            audio_mode: self.audio_mode,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
