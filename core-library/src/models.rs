//! Domain models for the track library

use bridge_traits::library::MediaAsset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::display::format_optional_time;
use crate::error::{LibraryError, Result};

// =============================================================================
// ID Types
// =============================================================================

/// Host-assigned identifier for a track
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// Playable track. Immutable once obtained from the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    /// Display name (the file name for device media)
    pub title: String,
    /// Locator handed to the playback adapter
    pub uri: String,
    /// Duration reported by the library, when known
    pub duration: Option<Duration>,
}

impl Track {
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            uri: uri.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Validate track data
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "id".to_string(),
                message: "Track id cannot be empty".to_string(),
            });
        }

        if self.uri.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "uri".to_string(),
                message: format!("Track {} has no locator", self.id),
            });
        }

        Ok(())
    }

    /// Duration label for the song list (`0:00` when unknown).
    pub fn duration_label(&self) -> String {
        format_optional_time(self.duration)
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<MediaAsset> for Track {
    fn from(asset: MediaAsset) -> Self {
        Self {
            id: TrackId(asset.id),
            title: asset.filename,
            uri: asset.uri,
            duration: asset.duration.filter(|d| !d.is_zero()),
        }
    }
}
