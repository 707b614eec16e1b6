//! Device media-library bridge.
//!
//! Hosts expose the audio assets they can see (MediaStore, MPMediaLibrary, a
//! scanned directory) through [`MediaLibrary`]. Enumeration is one-shot: the
//! core asks again only when the library is explicitly reloaded.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a media-library permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user dismissed the prompt without answering.
    Undetermined,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Audio asset as reported by the host library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Host-stable asset identifier.
    pub id: String,
    /// File name shown in the song list.
    pub filename: String,
    /// Locator the playback adapter understands.
    pub uri: String,
    /// Duration when the host already knows it.
    pub duration: Option<Duration>,
}

impl MediaAsset {
    pub fn new(id: impl Into<String>, filename: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            uri: uri.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Host media library capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Ask the host for read access to audio media.
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Enumerate every audio asset visible to the app.
    ///
    /// Returns [`BridgeError::PermissionDenied`](crate::BridgeError::PermissionDenied)
    /// when access was revoked between the permission request and the query.
    async fn list_audio_assets(&self) -> Result<Vec<MediaAsset>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BridgeError;

    #[test]
    fn permission_status_granted() {
        assert!(PermissionStatus::Granted.is_granted());
        assert!(!PermissionStatus::Denied.is_granted());
        assert!(!PermissionStatus::Undetermined.is_granted());
    }

    #[tokio::test]
    async fn mocked_library_reports_denial() {
        let mut library = MockMediaLibrary::new();
        library
            .expect_request_permission()
            .returning(|| Ok(PermissionStatus::Granted));
        library
            .expect_list_audio_assets()
            .returning(|| Err(BridgeError::PermissionDenied("revoked".into())));

        assert!(library.request_permission().await.unwrap().is_granted());
        let err = library.list_audio_assets().await.unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[test]
    fn asset_builder() {
        let asset = MediaAsset::new("1", "song.mp3", "file:///music/song.mp3")
            .with_duration(Duration::from_millis(200_000));
        assert_eq!(asset.duration, Some(Duration::from_millis(200_000)));
    }
}
