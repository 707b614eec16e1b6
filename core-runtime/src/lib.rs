//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the player crates:
//! - Logging and tracing setup
//! - Configuration and capability injection
//! - Event bus for library and playback notifications

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
