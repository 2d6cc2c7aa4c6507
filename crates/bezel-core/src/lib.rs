//! Bezel Core - Foundation crate for the Bezel listing harvester.
//!
//! This crate provides the shared types, error handling and configuration
//! management that the other Bezel crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Configuration error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared types (`ListingRecord`, `ChallengeSignal`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserSettings, HarvestSettings};
pub use error::{ConfigError, ConfigResult};
pub use types::{ChallengeSignal, ListingRecord};
