//! Chromium launching and lifecycle plumbing
//!
//! The search core owns one browser process per search session. This module
//! finds (or downloads) a Chromium executable and launches it with a
//! throwaway profile directory.

mod setup;

pub use setup::{download_managed_browser, find_browser_executable, launch_browser};
