//! Media library backed by a directory on disk.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    library::{MediaAsset, MediaLibrary, PermissionStatus},
};
use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

/// File extensions treated as audio when no explicit list is configured.
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "flac", "ogg", "opus", "wav"];

/// Scans a music directory recursively.
///
/// - Asset ids are paths relative to the root, so they survive rescans
/// - Assets are ordered by relative path
/// - Durations are probed from the container when `probe_durations` is set
pub struct DirectoryMediaLibrary {
    root: PathBuf,
    extensions: Vec<String>,
    probe_durations: bool,
}

impl DirectoryMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_AUDIO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            probe_durations: true,
        }
    }

    /// Replace the accepted extensions (case-insensitive, without the dot).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.into().to_lowercase())
            .collect();
        self
    }

    pub fn with_duration_probe(mut self, enabled: bool) -> Self {
        self.probe_durations = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_audio(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }

    fn map_io_error(&self, path: &Path, e: std::io::Error) -> BridgeError {
        match e.kind() {
            ErrorKind::PermissionDenied => BridgeError::PermissionDenied(path.display().to_string()),
            ErrorKind::NotFound => BridgeError::NotFound(path.display().to_string()),
            _ => BridgeError::Io(e),
        }
    }

    async fn collect_audio_files(&self) -> Result<Vec<PathBuf>> {
        let mut pending = vec![self.root.clone()];
        let mut files = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                // An unreadable root is fatal, an unreadable subfolder is skipped
                Err(e) if dir == self.root => return Err(self.map_io_error(&dir, e)),
                Err(e) => {
                    warn!(path = ?dir, error = %e, "Skipping unreadable directory");
                    continue;
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| self.map_io_error(&dir, e))?
            {
                let path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        debug!(path = ?path, error = %e, "Skipping entry without file type");
                        continue;
                    }
                };

                if file_type.is_dir() {
                    pending.push(path);
                } else if self.is_audio(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn asset_for(&self, path: &Path, duration: Option<Duration>) -> MediaAsset {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut asset = MediaAsset::new(
            relative.to_string_lossy().replace('\\', "/"),
            filename,
            path.to_string_lossy(),
        );
        asset.duration = duration;
        asset
    }
}

fn probe_duration(path: &Path) -> Option<Duration> {
    let tagged_file = Probe::open(path)
        .and_then(|probe| Ok(probe.guess_file_type()?))
        .and_then(|probe| probe.read());

    match tagged_file {
        Ok(file) => {
            let duration = file.properties().duration();
            (!duration.is_zero()).then_some(duration)
        }
        Err(e) => {
            debug!(path = ?path, error = %e, "Duration probe failed");
            None
        }
    }
}

#[async_trait]
impl MediaLibrary for DirectoryMediaLibrary {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        match fs::metadata(&self.root).await {
            Ok(metadata) if metadata.is_dir() => Ok(PermissionStatus::Granted),
            Ok(_) => Err(BridgeError::NotAvailable(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => Ok(PermissionStatus::Denied),
            Err(e) => Err(self.map_io_error(&self.root, e)),
        }
    }

    async fn list_audio_assets(&self) -> Result<Vec<MediaAsset>> {
        let files = self.collect_audio_files().await?;
        let mut assets = Vec::with_capacity(files.len());

        for path in files {
            let duration = if self.probe_durations {
                let probe_path = path.clone();
                tokio::task::spawn_blocking(move || probe_duration(&probe_path))
                    .await
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "Duration probe task failed");
                        None
                    })
            } else {
                None
            };

            assets.push(self.asset_for(&path, duration));
        }

        debug!(root = ?self.root, count = assets.len(), "Scanned music directory");
        Ok(assets)
    }
}
