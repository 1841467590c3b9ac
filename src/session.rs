//! Page driver: one browser session per search
//!
//! A [`MoodSession`] owns the Chromium process, its CDP handler task and a
//! single page navigated to the target site. Teardown is explicit and
//! ordered (page, then browser, then handler task, then profile dir) so a
//! failure in one step never masks the step before it.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::launch_browser;
use crate::error::{SearchError, SearchResult};
use crate::Config;

/// Text that identifies the target site's main UI. If it never renders,
/// navigation is considered failed.
pub const BANNER_TEXT: &str = "MusicByMood";

/// An exclusive browser session against the target site.
///
/// Never shared between searches; call [`MoodSession::close`] on every exit
/// path. Dropping without closing leaks the Chrome process until the handler
/// abort catches up and orphans the profile directory.
pub struct MoodSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: Option<PathBuf>,
    page: Option<Page>,
    closed: bool,
}

impl MoodSession {
    /// Launch a browser and navigate to the site's base URL.
    ///
    /// Fails with [`SearchError::Launch`] if no browser could be started and
    /// [`SearchError::Navigation`] if the identifying banner text does not
    /// appear within `config.navigation_timeout_ms`. The half-built session
    /// is torn down before either error is returned.
    pub async fn open(config: &Config, headless: bool) -> SearchResult<MoodSession> {
        let (browser, handler, profile_dir) = launch_browser(headless, &config.browser.window)
            .await
            .map_err(|e| SearchError::Launch(e.to_string()))?;

        let mut session = MoodSession {
            browser,
            handler,
            profile_dir: Some(profile_dir),
            page: None,
            closed: false,
        };

        match session.navigate(config).await {
            Ok(()) => Ok(session),
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    async fn navigate(&mut self, config: &Config) -> SearchResult<()> {
        let url = Url::parse(&config.base_url)
            .map_err(|e| SearchError::Navigation(format!("bad base URL {}: {e}", config.base_url)))?;
        info!("Navigating to {}", url);

        let page = self
            .browser
            .new_page(url.as_str())
            .await
            .map_err(|e| SearchError::Navigation(format!("{url}: {e}")))?;

        wait_for_text(
            &page,
            BANNER_TEXT,
            Duration::from_millis(config.navigation_timeout_ms),
        )
        .await
        .map_err(SearchError::Navigation)?;

        self.page = Some(page);
        Ok(())
    }

    /// The navigated page. `None` only before navigation succeeded.
    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    /// Release everything: page, browser process, handler task, profile dir.
    ///
    /// Runs [`TEARDOWN_SEQUENCE`] in order. Each secondary failure is logged
    /// and swallowed so the first error is not masked. Safe to call more
    /// than once.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        for step in TEARDOWN_SEQUENCE {
            self.run_teardown_step(step).await;
        }

        debug!("Session closed");
    }

    async fn run_teardown_step(&mut self, step: TeardownStep) {
        match step {
            TeardownStep::ClosePage => {
                if let Some(page) = self.page.take() {
                    if let Err(e) = page.close().await {
                        warn!("Failed to close page: {}", e);
                    }
                }
            }
            TeardownStep::CloseBrowser => {
                if let Err(e) = self.browser.close().await {
                    warn!("Failed to close browser cleanly: {}", e);
                }
                if let Err(e) = self.browser.wait().await {
                    warn!("Failed to wait for browser exit: {}", e);
                }
            }
            TeardownStep::AbortHandler => {
                self.handler.abort();
            }
            TeardownStep::RemoveProfileDir => {
                if let Some(dir) = self.profile_dir.take() {
                    if let Err(e) = std::fs::remove_dir_all(&dir) {
                        warn!("Failed to remove profile dir {}: {}", dir.display(), e);
                    }
                }
            }
        }
    }
}

/// One step of session teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    ClosePage,
    CloseBrowser,
    AbortHandler,
    RemoveProfileDir,
}

/// Teardown order: page, then browser process (close + wait), then the CDP
/// handler task, then the profile directory. The browser must have exited
/// before the profile directory is removed or Chrome may still hold file
/// handles in it.
pub const TEARDOWN_SEQUENCE: [TeardownStep; 4] = [
    TeardownStep::ClosePage,
    TeardownStep::CloseBrowser,
    TeardownStep::AbortHandler,
    TeardownStep::RemoveProfileDir,
];

impl Drop for MoodSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                "MoodSession dropped without close(); Chrome process and profile \
                 directory may be orphaned"
            );
            self.handler.abort();
        }
    }
}

/// Poll until `document.body.innerText` contains `needle`.
///
/// Polls with exponential backoff (100ms doubling up to 1s) because the site
/// renders its UI client-side after the load event fires.
pub async fn wait_for_text(page: &Page, needle: &str, timeout: Duration) -> Result<(), String> {
    let expr = format!(
        "Boolean(document.body && document.body.innerText.includes({needle:?}))"
    );

    let start = std::time::Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let max_interval = Duration::from_secs(1);

    loop {
        let found = match page.evaluate(expr.as_str()).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(e) => {
                debug!("Text poll evaluation failed: {}", e);
                false
            }
        };
        if found {
            return Ok(());
        }

        if start.elapsed() >= timeout {
            return Err(format!(
                "text {:?} did not appear within {}ms",
                needle,
                timeout.as_millis()
            ));
        }

        tokio::time::sleep(poll_interval).await;
        poll_interval = (poll_interval * 2).min(max_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_releases_page_before_browser_and_profile_dir_last() {
        assert_eq!(
            TEARDOWN_SEQUENCE,
            [
                TeardownStep::ClosePage,
                TeardownStep::CloseBrowser,
                TeardownStep::AbortHandler,
                TeardownStep::RemoveProfileDir,
            ]
        );
    }
}
