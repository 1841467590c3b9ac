//! Extracted song records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One song recommendation extracted from the results page.
///
/// Only the title is guaranteed; everything else depends on which extraction
/// tier produced the record. `extra` carries auxiliary parsed attributes such
/// as detected genre tags and a duration string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl Song {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: None,
            link: None,
            extra: None,
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Insert an auxiliary attribute, creating the map on first use.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: Value) {
        self.extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
    }

    /// Identity used for deduplication during one extraction pass.
    pub fn dedup_key(&self) -> (String, Option<String>, Option<String>) {
        (self.title.clone(), self.artist.clone(), self.link.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_expected_keys() {
        let mut song = Song::new("Good Vibes").with_artist("Artist One");
        song.insert_extra("duration", Value::String("3:45".into()));

        let json = serde_json::to_value(&song).unwrap();
        assert_eq!(json["title"], "Good Vibes");
        assert_eq!(json["artist"], "Artist One");
        assert_eq!(json["extra"]["duration"], "3:45");
        assert!(json.get("link").is_none());
    }

    #[test]
    fn round_trips_link_records() {
        let song = Song::new("Track").with_link("https://open.spotify.com/track/abc");
        let json = serde_json::to_string(&song).unwrap();
        let back: Song = serde_json::from_str(&json).unwrap();
        assert_eq!(back, song);
    }
}
