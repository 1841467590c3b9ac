//! Result extractor: rendered results page -> song records
//!
//! Three tiers tried in order, first non-empty output wins:
//!
//! 1. [`StructuredGrouping`]: read the results container's text and parse
//!    it line by line (title / artist / genre tags / duration).
//! 2. [`LinkHarvest`]: collect Spotify track anchors, falling back to
//!    "<title>by <artist>" card blocks inside the container.
//! 3. [`GenericScan`]: site-wide scan of short "X by Y" texts.
//!
//! The text-classification heuristics are coupled to one site's current
//! rendering on purpose; they live behind the [`ExtractTier`] trait so a
//! markup change means swapping a tier, not touching the orchestration.
//! Extraction never errors: any internal failure degrades to an empty or
//! partial result.

use std::collections::HashSet;

use async_trait::async_trait;
use chromiumoxide::page::Page;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::song::Song;

/// Substring of the heading rendered above search results.
pub const RESULTS_HEADING: &str = "Recommended";

/// Candidate results-container selectors, most specific first. The first two
/// are the site's current Tailwind layout classes.
const CONTAINER_SELECTORS: &[&str] = &[
    ".order-1.md\\:order-2",
    ".md\\:order-2",
    "main",
    "body",
];

/// Combined container locator used by the link-harvesting tier.
const CONTAINER_LOCATOR: &str = ".order-1.md\\:order-2, .md\\:order-2";

/// Track links on the results page point at this external music service.
const TRACK_LINK_MARKER: &str = "open.spotify.com/track";

const FALLBACK_TITLE: &str = "Unknown Title";

/// A container shorter than this is assumed to be an empty shell.
const MIN_CONTAINER_TEXT_LEN: usize = 40;

/// Upper bound on elements inspected by the generic scan.
const GENERIC_SCAN_CAP: usize = 200;

/// "X by Y" texts longer than this are prose, not song entries.
const GENERIC_MAX_TEXT_LEN: usize = 160;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}$").expect("duration pattern is valid"));

/// One strategy in the extraction fallback chain.
#[async_trait]
pub trait ExtractTier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the strategy. Never errors; failures come back as an empty Vec.
    async fn run(&self, page: &Page, limit: usize) -> Vec<Song>;
}

/// The standard tier chain, in priority order.
pub fn default_tiers() -> Vec<Box<dyn ExtractTier>> {
    vec![
        Box::new(StructuredGrouping),
        Box::new(LinkHarvest),
        Box::new(GenericScan),
    ]
}

/// Extract up to `limit` songs using the default tier chain.
pub async fn extract(page: &Page, limit: usize) -> Vec<Song> {
    extract_with(page, limit, &default_tiers()).await
}

/// Extract using a caller-supplied tier chain. First tier producing at least
/// one record short-circuits the rest; all tiers empty is a valid outcome,
/// not an error.
pub async fn extract_with(page: &Page, limit: usize, tiers: &[Box<dyn ExtractTier>]) -> Vec<Song> {
    for tier in tiers {
        let mut songs = tier.run(page, limit).await;
        if !songs.is_empty() {
            debug!("Tier {:?} produced {} songs", tier.name(), songs.len());
            songs.truncate(limit);
            return songs;
        }
        trace!("Tier {:?} produced nothing, falling through", tier.name());
    }
    debug!("All extraction tiers came up empty");
    Vec::new()
}

// ---------------------------------------------------------------------------
// Tier 1: structured grouping

pub struct StructuredGrouping;

#[async_trait]
impl ExtractTier for StructuredGrouping {
    fn name(&self) -> &'static str {
        "structured-grouping"
    }

    async fn run(&self, page: &Page, limit: usize) -> Vec<Song> {
        let Some(text) = results_container_text(page).await else {
            return Vec::new();
        };
        parse_song_lines(&text, limit)
    }
}

/// Read the text of the best results-container candidate: the first whose
/// text contains the results heading and is long enough to hold entries,
/// else the first candidate with any text at all.
async fn results_container_text(page: &Page) -> Option<String> {
    let mut fallback: Option<String> = None;

    for selector in CONTAINER_SELECTORS {
        let Ok(el) = page.find_element(*selector).await else {
            continue;
        };
        let Ok(Some(text)) = el.inner_text().await else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        if text.contains(RESULTS_HEADING) && text.len() > MIN_CONTAINER_TEXT_LEN {
            return Some(text);
        }
        fallback.get_or_insert(text);
    }

    fallback
}

fn is_duration_line(line: &str) -> bool {
    DURATION_RE.is_match(line)
}

/// Genre tags render entirely lower-case ("pop", "classic rock").
fn is_genre_like(line: &str) -> bool {
    line.chars().any(|c| c.is_alphabetic()) && !line.chars().any(|c| c.is_uppercase())
}

/// Titles are the lines that are neither durations nor genre tags and carry
/// at least one upper-case character.
fn is_title_candidate(line: &str) -> bool {
    !is_duration_line(line) && !is_genre_like(line) && line.chars().any(|c| c.is_uppercase())
}

struct PendingEntry {
    title: String,
    artist: Option<String>,
    genres: Vec<String>,
    duration: Option<String>,
}

impl PendingEntry {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            artist: None,
            genres: Vec::new(),
            duration: None,
        }
    }

    fn into_song(self) -> Option<(String, String, Song)> {
        let artist = self.artist?;
        let mut song = Song::new(self.title.clone()).with_artist(artist.clone());
        if !self.genres.is_empty() {
            song.insert_extra(
                "genres",
                Value::Array(self.genres.into_iter().map(Value::String).collect()),
            );
        }
        if let Some(duration) = self.duration {
            song.insert_extra("duration", Value::String(duration));
        }
        Some((self.title, artist, song))
    }
}

/// Parse the container's rendered text into song records.
///
/// Lines after the results heading alternate as title, artist, then any
/// number of genre tags until a duration line (ends the entry) or the next
/// title (ends it without a duration). Entries without an artist line are
/// dropped; (title, artist) duplicates are kept once.
pub fn parse_song_lines(text: &str, limit: usize) -> Vec<Song> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let start = lines
        .iter()
        .position(|l| l.contains(RESULTS_HEADING))
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut songs = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut pending: Option<PendingEntry> = None;

    for line in &lines[start..] {
        if songs.len() >= limit {
            pending = None;
            break;
        }

        let Some(mut entry) = pending.take() else {
            if is_title_candidate(line) {
                pending = Some(PendingEntry::new(line));
            }
            continue;
        };

        if entry.artist.is_none() {
            // The line right after a title is taken as the artist no matter
            // what it looks like.
            entry.artist = Some(line.to_string());
            pending = Some(entry);
        } else if is_duration_line(line) {
            entry.duration = Some(line.to_string());
            flush_entry(entry, &mut songs, &mut seen);
        } else if is_title_candidate(line) {
            flush_entry(entry, &mut songs, &mut seen);
            pending = Some(PendingEntry::new(line));
        } else {
            if is_genre_like(line) {
                entry.genres.push(line.to_string());
            }
            // anything else is skipped
            pending = Some(entry);
        }
    }

    if songs.len() < limit {
        if let Some(entry) = pending {
            flush_entry(entry, &mut songs, &mut seen);
        }
    }

    songs.truncate(limit);
    songs
}

fn flush_entry(entry: PendingEntry, songs: &mut Vec<Song>, seen: &mut HashSet<(String, String)>) {
    if let Some((title, artist, song)) = entry.into_song() {
        if seen.insert((title, artist)) {
            songs.push(song);
        }
    }
}

// ---------------------------------------------------------------------------
// Tier 2: link harvesting

pub struct LinkHarvest;

#[derive(Debug, Deserialize)]
struct HarvestedLink {
    href: String,
    text: String,
}

#[async_trait]
impl ExtractTier for LinkHarvest {
    fn name(&self) -> &'static str {
        "link-harvest"
    }

    async fn run(&self, page: &Page, limit: usize) -> Vec<Song> {
        let links = collect_track_links(page).await;
        let songs = songs_from_links(links, limit);
        if !songs.is_empty() {
            return songs;
        }

        // No track anchors; fall back to "<title>by <artist>" card blocks
        // within the same container.
        let blocks = collect_by_blocks(page).await;
        songs_from_by_blocks(blocks, limit)
    }
}

async fn collect_track_links(page: &Page) -> Vec<HarvestedLink> {
    let expr = format!(
        r#"(() => {{
            const container = document.querySelector({CONTAINER_LOCATOR:?});
            if (!container) return [];
            const anchors = container.querySelectorAll("a[href*='{TRACK_LINK_MARKER}']");
            return Array.from(anchors).map(a => ({{
                href: a.href,
                text: (a.innerText || '').trim(),
            }}));
        }})()"#
    );

    match page.evaluate(expr.as_str()).await {
        Ok(result) => result.into_value::<Vec<HarvestedLink>>().unwrap_or_default(),
        Err(e) => {
            trace!("Track link harvest failed: {}", e);
            Vec::new()
        }
    }
}

/// Build songs from harvested anchors, deduplicated by (title, link).
fn songs_from_links(links: Vec<HarvestedLink>, limit: usize) -> Vec<Song> {
    let mut songs = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for link in links {
        if songs.len() >= limit {
            break;
        }
        let title = if link.text.is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            link.text
        };
        if seen.insert((title.clone(), link.href.clone())) {
            songs.push(Song::new(title).with_link(link.href));
        }
    }

    songs
}

async fn collect_by_blocks(page: &Page) -> Vec<String> {
    let expr = format!(
        r#"(() => {{
            const container = document.querySelector({CONTAINER_LOCATOR:?});
            if (!container) return [];
            return Array.from(container.querySelectorAll('div'))
                .map(d => (d.innerText || '').trim())
                .filter(t => t.includes('by '));
        }})()"#
    );

    match page.evaluate(expr.as_str()).await {
        Ok(result) => result.into_value::<Vec<String>>().unwrap_or_default(),
        Err(e) => {
            trace!("Card block harvest failed: {}", e);
            Vec::new()
        }
    }
}

/// Split each card block on the first `"by "` into title and artist.
fn songs_from_by_blocks(blocks: Vec<String>, limit: usize) -> Vec<Song> {
    let mut songs = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for block in blocks {
        if songs.len() >= limit {
            break;
        }
        let Some((title, artist)) = block.split_once("by ") else {
            continue;
        };
        let (title, artist) = (title.trim().to_string(), artist.trim().to_string());
        if title.is_empty() || artist.is_empty() {
            continue;
        }
        if seen.insert((title.clone(), artist.clone())) {
            songs.push(Song::new(title).with_artist(artist));
        }
    }

    songs
}

// ---------------------------------------------------------------------------
// Tier 3: generic scan

pub struct GenericScan;

#[async_trait]
impl ExtractTier for GenericScan {
    fn name(&self) -> &'static str {
        "generic-scan"
    }

    async fn run(&self, page: &Page, limit: usize) -> Vec<Song> {
        let expr = format!(
            r#"(() => Array.from(document.querySelectorAll('li, div'))
                .slice(0, {GENERIC_SCAN_CAP})
                .map(e => (e.innerText || '').trim()))()"#
        );

        let texts = match page.evaluate(expr.as_str()).await {
            Ok(result) => result.into_value::<Vec<String>>().unwrap_or_default(),
            Err(e) => {
                trace!("Generic scan failed: {}", e);
                Vec::new()
            }
        };

        songs_from_generic_texts(texts, limit)
    }
}

/// Keep short whitespace-normalized texts containing `" by "`, splitting on
/// the first occurrence into (title, artist).
fn songs_from_generic_texts(texts: Vec<String>, limit: usize) -> Vec<Song> {
    let mut songs = Vec::new();

    for raw in texts {
        if songs.len() >= limit {
            break;
        }
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.len() >= GENERIC_MAX_TEXT_LEN {
            continue;
        }
        let Some((title, artist)) = normalized.split_once(" by ") else {
            continue;
        };
        let (title, artist) = (title.trim(), artist.trim());
        if title.is_empty() || artist.is_empty() {
            continue;
        }
        songs.push(Song::new(title).with_artist(artist));
    }

    songs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(lines: &[&str]) -> String {
        lines.join("\n")
    }

    #[test]
    fn parses_grouped_entries_with_genres_and_durations() {
        let text = joined(&[
            "Recommended for your mood",
            "Good Vibes",
            "Artist One",
            "pop",
            "dance",
            "3:45",
            "Another Song",
            "Artist Two",
            "jazz",
            "4:02",
        ]);

        let songs = parse_song_lines(&text, 20);
        assert_eq!(songs.len(), 2);

        assert_eq!(songs[0].title, "Good Vibes");
        assert_eq!(songs[0].artist.as_deref(), Some("Artist One"));
        let extra = songs[0].extra.as_ref().unwrap();
        assert_eq!(extra["genres"], serde_json::json!(["pop", "dance"]));
        assert_eq!(extra["duration"], "3:45");

        assert_eq!(songs[1].title, "Another Song");
        assert_eq!(songs[1].artist.as_deref(), Some("Artist Two"));
        let extra = songs[1].extra.as_ref().unwrap();
        assert_eq!(extra["genres"], serde_json::json!(["jazz"]));
        assert_eq!(extra["duration"], "4:02");
    }

    #[test]
    fn new_title_ends_entry_without_duration() {
        let text = joined(&[
            "Recommended for your mood",
            "First Song",
            "First Artist",
            "rock",
            "Second Song",
            "Second Artist",
            "3:10",
        ]);

        let songs = parse_song_lines(&text, 20);
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].title, "First Song");
        assert!(songs[0]
            .extra
            .as_ref()
            .is_some_and(|e| !e.contains_key("duration")));
        assert_eq!(songs[1].title, "Second Song");
    }

    #[test]
    fn dedups_repeated_title_artist_pairs() {
        let text = joined(&[
            "Recommended for your mood",
            "Same Song",
            "Same Artist",
            "3:45",
            "Same Song",
            "Same Artist",
            "3:45",
        ]);

        let songs = parse_song_lines(&text, 20);
        assert_eq!(songs.len(), 1);
    }

    #[test]
    fn truncates_to_limit_preserving_order() {
        let mut lines = vec!["Recommended for your mood".to_string()];
        for i in 0..5 {
            lines.push(format!("Song {i}"));
            lines.push(format!("Artist {i}"));
            lines.push("3:00".to_string());
        }
        let text = lines.join("\n");

        let songs = parse_song_lines(&text, 3);
        assert_eq!(songs.len(), 3);
        assert_eq!(songs[0].title, "Song 0");
        assert_eq!(songs[2].title, "Song 2");
    }

    #[test]
    fn no_heading_starts_from_the_top() {
        let text = joined(&["Lone Song", "Lone Artist", "2:59"]);
        let songs = parse_song_lines(&text, 20);
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Lone Song");
    }

    #[test]
    fn title_without_artist_line_is_dropped() {
        let text = joined(&["Recommended for your mood", "Orphan Title"]);
        assert!(parse_song_lines(&text, 20).is_empty());
    }

    #[test]
    fn line_classification_heuristics() {
        assert!(is_duration_line("3:45"));
        assert!(is_duration_line("12:03"));
        assert!(!is_duration_line("123:45"));
        assert!(!is_duration_line("3:45 pm"));

        assert!(is_genre_like("pop"));
        assert!(is_genre_like("classic rock"));
        assert!(!is_genre_like("3:45"));
        assert!(!is_genre_like("Pop"));

        assert!(is_title_candidate("Good Vibes"));
        assert!(!is_title_candidate("pop"));
        assert!(!is_title_candidate("3:45"));
    }

    #[test]
    fn link_harvest_defaults_empty_titles_and_dedups() {
        let links = vec![
            HarvestedLink {
                href: "https://open.spotify.com/track/abc".into(),
                text: "".into(),
            },
            HarvestedLink {
                href: "https://open.spotify.com/track/abc".into(),
                text: "".into(),
            },
            HarvestedLink {
                href: "https://open.spotify.com/track/def".into(),
                text: "Named Track".into(),
            },
        ];

        let songs = songs_from_links(links, 20);
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].title, FALLBACK_TITLE);
        assert_eq!(
            songs[0].link.as_deref(),
            Some("https://open.spotify.com/track/abc")
        );
        assert_eq!(songs[1].title, "Named Track");
    }

    #[test]
    fn by_blocks_split_on_first_occurrence() {
        let blocks = vec![
            "Stand by Me by Ben E. King".to_string(),
            "no separator here".to_string(),
        ];

        let songs = songs_from_by_blocks(blocks, 20);
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Stand");
        assert_eq!(songs[0].artist.as_deref(), Some("Me by Ben E. King"));
    }

    #[test]
    fn generic_scan_filters_long_and_separator_less_texts() {
        let long = format!("Endless Song by {}", "x".repeat(200));
        let texts = vec![
            "Good   Vibes  by  Artist One".to_string(),
            "paragraph without separator".to_string(),
            long,
        ];

        let songs = songs_from_generic_texts(texts, 20);
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Good Vibes");
        assert_eq!(songs[0].artist.as_deref(), Some("Artist One"));
    }

    #[test]
    fn generic_scan_respects_limit() {
        let texts: Vec<String> = (0..10).map(|i| format!("Song {i} by Artist {i}")).collect();
        let songs = songs_from_generic_texts(texts, 4);
        assert_eq!(songs.len(), 4);
        assert_eq!(songs[3].title, "Song 3");
    }
}
