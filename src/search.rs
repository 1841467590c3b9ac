//! Search orchestrator: the crate's one entry point
//!
//! Composes session acquisition, query application and result extraction
//! into a single call. The session is released on every exit path before
//! the call returns.

use tracing::{debug, info};

use crate::error::SearchResult;
use crate::extract;
use crate::query::MusicQuery;
use crate::session::MoodSession;
use crate::song::Song;
use crate::{apply, Config};

pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Per-search knobs. `headless` overrides the config's `browser.headless`
/// when set; turn it off to watch the browser while debugging selector
/// drift.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub headless: Option<bool>,
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            headless: None,
            limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl SearchOptions {
    /// Effective headless mode: the per-search override when present, the
    /// config's `browser.headless` otherwise.
    pub fn resolved_headless(&self, config: &Config) -> bool {
        self.headless.unwrap_or(config.browser.headless)
    }
}

/// Search MusicByMood for songs matching `query`.
///
/// Acquires an exclusive browser session, applies the query through UI
/// interactions, extracts results and tears the session down
/// unconditionally. Only session acquisition (launch or navigation) fails
/// this call; interaction and extraction problems degrade to a shorter or
/// empty song list, which is a valid "no matches found" outcome.
pub async fn search_music_by_mood(
    query: &MusicQuery,
    options: &SearchOptions,
) -> SearchResult<Vec<Song>> {
    search_with_config(query, options, &crate::load_yaml_config().unwrap_or_default()).await
}

/// Like [`search_music_by_mood`] with an explicit [`Config`] instead of the
/// config.yaml lookup.
pub async fn search_with_config(
    query: &MusicQuery,
    options: &SearchOptions,
    config: &Config,
) -> SearchResult<Vec<Song>> {
    info!(
        "Starting music search (mood: {:?}, genres: {})",
        query.mood().map(|m| m.label()),
        query.genres().len()
    );

    let mut session = MoodSession::open(config, options.resolved_headless(config)).await?;

    // Infallible from here on; close must still run before returning.
    let songs = run_search(&session, query, options.limit, config).await;
    session.close().await;

    info!("Search finished with {} songs", songs.len());
    Ok(songs)
}

async fn run_search(
    session: &MoodSession,
    query: &MusicQuery,
    limit: usize,
    config: &Config,
) -> Vec<Song> {
    let Some(page) = session.page() else {
        debug!("Session has no page, returning empty result");
        return Vec::new();
    };

    apply::apply(page, query, config).await;
    extract::extract(page, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_defaults_to_config_setting() {
        let mut config = Config::default();
        let options = SearchOptions::default();
        assert!(options.resolved_headless(&config));

        config.browser.headless = false;
        assert!(!options.resolved_headless(&config));
    }

    #[test]
    fn per_search_override_beats_config() {
        let mut config = Config::default();
        config.browser.headless = false;

        let options = SearchOptions {
            headless: Some(true),
            ..SearchOptions::default()
        };
        assert!(options.resolved_headless(&config));
    }
}
