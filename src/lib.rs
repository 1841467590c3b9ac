//! Mood-based music search via browser automation
//!
//! Drives the MusicByMood web UI in headless Chromium: applies a validated
//! mood/energy/happiness/genre query through UI interactions and extracts
//! song recommendations from the rendered results.
//!
//! The one entry point is [`search_music_by_mood`]. Only query validation and
//! session acquisition can fail it; scrape-level problems degrade to partial
//! or empty results because the target site's markup is not under our
//! control.

pub mod apply;
mod browser;
mod error;
pub mod extract;
pub mod query;
pub mod search;
pub mod session;
pub mod song;

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use browser::{download_managed_browser, find_browser_executable, launch_browser};
pub use error::{SearchError, SearchResult, ValidationError};
pub use query::{Genre, Mood, MusicQuery};
pub use search::{search_music_by_mood, SearchOptions};
pub use session::MoodSession;
pub use song::Song;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target site entry point.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// How long to wait for the site's banner to render after navigation.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// How long to wait for the results heading after submitting.
    #[serde(default = "default_results_timeout_ms")]
    pub results_timeout_ms: u64,

    /// Extra settle time once the results heading appeared.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Single longer delay used when the heading never appeared.
    #[serde(default = "default_fallback_delay_ms")]
    pub fallback_delay_ms: u64,

    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode. Used when the caller does not override
    /// headlessness per search (see `SearchOptions`).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

fn default_base_url() -> String {
    "https://www.musicbymood.com/".to_string()
}
fn default_navigation_timeout_ms() -> u64 {
    30_000
}
fn default_results_timeout_ms() -> u64 {
    10_000
}
fn default_settle_delay_ms() -> u64 {
    3_000
}
fn default_fallback_delay_ms() -> u64 {
    5_000
}
fn default_headless() -> bool {
    true
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    900
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            results_timeout_ms: default_results_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            fallback_delay_ms: default_fallback_delay_ms(),
            browser: BrowserConfig::default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

/// Load config from config.yaml in the package root, falling back to
/// defaults when the file is absent.
pub fn load_yaml_config() -> anyhow::Result<Config> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.yaml");

    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_timings() {
        let config = Config::default();
        assert_eq!(config.navigation_timeout_ms, 30_000);
        assert_eq!(config.results_timeout_ms, 10_000);
        assert_eq!(config.settle_delay_ms, 3_000);
        assert_eq!(config.fallback_delay_ms, 5_000);
        assert!(config.browser.headless);
        assert_eq!(config.browser.window.width, 1280);
        assert_eq!(config.browser.window.height, 900);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: Config = serde_yaml::from_str("base_url: http://localhost:8080/\n").unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/");
        assert_eq!(config.navigation_timeout_ms, 30_000);
    }
}
