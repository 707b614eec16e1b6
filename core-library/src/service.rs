//! Library service wrapping the host [`MediaLibrary`].

use bridge_traits::library::{MediaLibrary, PermissionStatus};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{LibraryError, Result};
use crate::models::Track;

/// Notice surfaced to the user when media access is refused.
pub const PERMISSION_NOTICE: &str =
    "Allow access to your music library to see your songs.";

/// Result of a library load, ready for the view layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySnapshot {
    pub tracks: Vec<Track>,
    /// User-visible notice when the list is empty because of a refusal.
    pub notice: Option<String>,
}

impl LibrarySnapshot {
    pub fn is_denied(&self) -> bool {
        self.notice.is_some()
    }
}

/// One-shot track enumeration through the host media library.
#[derive(Clone)]
pub struct LibraryService {
    library: Arc<dyn MediaLibrary>,
}

impl LibraryService {
    pub fn new(library: Arc<dyn MediaLibrary>) -> Self {
        Self { library }
    }

    /// Request permission and enumerate playable tracks.
    ///
    /// Assets that fail validation or repeat an earlier id are skipped.
    ///
    /// # Errors
    ///
    /// [`LibraryError::PermissionDenied`] when the host refuses access, either
    /// at the prompt or during enumeration.
    pub async fn list_tracks(&self) -> Result<Vec<Track>> {
        let status = self.library.request_permission().await?;
        if status != PermissionStatus::Granted {
            return Err(LibraryError::PermissionDenied(format!(
                "media library access {:?}",
                status
            )));
        }

        let assets = self.library.list_audio_assets().await?;
        let mut seen = HashSet::with_capacity(assets.len());
        let mut tracks = Vec::with_capacity(assets.len());

        for asset in assets {
            let track = Track::from(asset);
            if let Err(e) = track.validate() {
                warn!(track_id = %track.id, error = %e, "Skipping invalid library asset");
                continue;
            }
            if !seen.insert(track.id.clone()) {
                debug!(track_id = %track.id, "Skipping duplicate library asset");
                continue;
            }
            tracks.push(track);
        }

        info!(count = tracks.len(), "Loaded library tracks");
        Ok(tracks)
    }

    /// Like [`list_tracks`](Self::list_tracks), but a refusal becomes an
    /// empty list plus a notice instead of an error.
    pub async fn load(&self) -> Result<LibrarySnapshot> {
        match self.list_tracks().await {
            Ok(tracks) => Ok(LibrarySnapshot {
                tracks,
                notice: None,
            }),
            Err(LibraryError::PermissionDenied(reason)) => {
                warn!(reason = %reason, "Media library permission denied");
                Ok(LibrarySnapshot {
                    tracks: Vec::new(),
                    notice: Some(PERMISSION_NOTICE.to_string()),
                })
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for LibraryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryService")
            .field("library", &"MediaLibrary { ... }")
            .finish()
    }
}
