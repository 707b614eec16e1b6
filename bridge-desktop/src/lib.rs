//! # Desktop Bridge Implementations
//!
//! Desktop implementations of the bridge traits (macOS, Windows, Linux).
//!
//! - `MediaLibrary` using a recursive scan of a music directory with
//!   `tokio::fs`, with durations probed by `lofty`
//!
//! Desktop hosts still supply their own `PlaybackAdapter`.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::DirectoryMediaLibrary;
//! use bridge_traits::MediaLibrary;
//!
//! let library = DirectoryMediaLibrary::new("/home/me/Music");
//! let assets = library.list_audio_assets().await?;
//! ```

mod library;

pub use library::{DirectoryMediaLibrary, DEFAULT_AUDIO_EXTENSIONS};
