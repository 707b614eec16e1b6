//! Workspace umbrella crate.
//!
//! Exposes the feature flags that map onto the individual workspace crates so
//! a host application can depend on `player-workspace` alone. With
//! `desktop-shims` enabled the desktop directory scanner is wired in as the
//! default media library.

#[cfg(any(feature = "core", feature = "desktop-shims"))]
pub use core_service::*;
