//! Configuration management for Bezel.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
///
/// Loaded from `~/.config/bezel/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser automation settings
    pub browser: BrowserSettings,
    /// Harvest pipeline settings
    pub harvest: HarvestSettings,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if the config directory cannot be determined, or the
    /// file exists but cannot be read or parsed.
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `BEZEL_HEADLESS`: Override browser headless mode (true/false)
    /// - `BEZEL_BASE_URL`: Override the marketplace base URL
    /// - `BEZEL_RESULTS_PATH`: Override the result artifact path
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides to an already-loaded config.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("BEZEL_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("BEZEL_BASE_URL") {
            tracing::debug!("Override harvest.base_url from env: {}", val);
            self.harvest.base_url = val;
        }

        if let Ok(val) = std::env::var("BEZEL_RESULTS_PATH") {
            tracing::debug!("Override harvest.results_path from env: {}", val);
            self.harvest.results_path = PathBuf::from(val);
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/bezel/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "bezel", "bezel").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Browser automation settings.
///
/// The browser is headful by default: a human must be able to solve an
/// anti-bot challenge in the live window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
}

impl BrowserSettings {
    /// Navigation timeout as a [`Duration`].
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1280,
            window_height: 800,
            navigation_timeout_secs: 30,
        }
    }
}

/// Harvest pipeline settings.
///
/// Every bounded wait in the pipeline is independently configurable here;
/// the challenge poll is the only unbounded wait by design.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    /// Marketplace base URL
    pub base_url: String,
    /// Path of the persisted JSON result artifact
    pub results_path: PathBuf,
    /// Interval between challenge-signal polls, in seconds
    pub challenge_poll_secs: u64,
    /// Bounded wait for the post-challenge DOM marker, in seconds
    pub post_challenge_wait_secs: u64,
    /// Bounded wait for the home-page search box, in seconds
    pub search_box_wait_secs: u64,
    /// Settle delay after submitting a search, in seconds
    pub search_settle_secs: u64,
    /// Settle delay after switching result views, in seconds
    pub view_settle_secs: u64,
    /// Bounded wait for listing cards to render, in seconds
    pub card_wait_secs: u64,
    /// Bounded wait for listing-page detail markers, in seconds
    pub listing_wait_secs: u64,
}

impl HarvestSettings {
    /// Challenge-signal poll interval as a [`Duration`].
    #[must_use]
    pub fn challenge_poll(&self) -> Duration {
        Duration::from_secs(self.challenge_poll_secs)
    }

    /// Post-challenge marker wait as a [`Duration`].
    #[must_use]
    pub fn post_challenge_wait(&self) -> Duration {
        Duration::from_secs(self.post_challenge_wait_secs)
    }

    /// Search box wait as a [`Duration`].
    #[must_use]
    pub fn search_box_wait(&self) -> Duration {
        Duration::from_secs(self.search_box_wait_secs)
    }

    /// Search settle delay as a [`Duration`].
    #[must_use]
    pub fn search_settle(&self) -> Duration {
        Duration::from_secs(self.search_settle_secs)
    }

    /// View-switch settle delay as a [`Duration`].
    #[must_use]
    pub fn view_settle(&self) -> Duration {
        Duration::from_secs(self.view_settle_secs)
    }

    /// Card-render wait as a [`Duration`].
    #[must_use]
    pub fn card_wait(&self) -> Duration {
        Duration::from_secs(self.card_wait_secs)
    }

    /// Listing-marker wait as a [`Duration`].
    #[must_use]
    pub fn listing_wait(&self) -> Duration {
        Duration::from_secs(self.listing_wait_secs)
    }
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            base_url: "https://everywatch.com".to_string(),
            results_path: PathBuf::from("results.json"),
            challenge_poll_secs: 2,
            post_challenge_wait_secs: 15,
            search_box_wait_secs: 15,
            search_settle_secs: 5,
            view_settle_secs: 3,
            card_wait_secs: 10,
            listing_wait_secs: 10,
        }
    }
}
