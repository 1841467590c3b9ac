//! Validated music search queries
//!
//! A [`MusicQuery`] describes what the caller wants (mood, slider levels,
//! genres). Validation happens at construction so a bad query never reaches
//! the browser.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;

/// One of the predefined mood buttons on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Relaxed,
    Focused,
}

impl Mood {
    /// Visible button label on the site.
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Energetic => "Energetic",
            Mood::Relaxed => "Relaxed",
            Mood::Focused => "Focused",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Genre filter chips offered by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genre {
    Pop,
    Country,
    #[serde(rename = "R&B")]
    Rnb,
    Acoustic,
    Rock,
    #[serde(rename = "Classic Rock")]
    ClassicRock,
    Jazz,
    Classical,
    #[serde(rename = "Hip Hop")]
    HipHop,
    Rap,
    Electronic,
    Dance,
    #[serde(rename = "Hard Rock")]
    HardRock,
    Grunge,
    Alternative,
    Dancehall,
    Afrobeat,
}

impl Genre {
    /// Canonical display name.
    pub fn label(&self) -> &'static str {
        match self {
            Genre::Pop => "Pop",
            Genre::Country => "Country",
            Genre::Rnb => "R&B",
            Genre::Acoustic => "Acoustic",
            Genre::Rock => "Rock",
            Genre::ClassicRock => "Classic Rock",
            Genre::Jazz => "Jazz",
            Genre::Classical => "Classical",
            Genre::HipHop => "Hip Hop",
            Genre::Rap => "Rap",
            Genre::Electronic => "Electronic",
            Genre::Dance => "Dance",
            Genre::HardRock => "Hard Rock",
            Genre::Grunge => "Grunge",
            Genre::Alternative => "Alternative",
            Genre::Dancehall => "Dancehall",
            Genre::Afrobeat => "Afrobeat",
        }
    }

    /// Label as it appears on the genre chips (the site renders them
    /// lower-case).
    pub fn click_label(&self) -> String {
        self.label().to_lowercase()
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A label that matched neither a mood nor a genre.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown label: {0:?}")]
pub struct ParseLabelError(pub String);

impl FromStr for Mood {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            "energetic" => Ok(Mood::Energetic),
            "relaxed" => Ok(Mood::Relaxed),
            "focused" => Ok(Mood::Focused),
            _ => Err(ParseLabelError(s.to_string())),
        }
    }
}

impl FromStr for Genre {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept "Hip Hop", "hip-hop" and "hip_hop" alike.
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "pop" => Ok(Genre::Pop),
            "country" => Ok(Genre::Country),
            "r&b" | "rnb" => Ok(Genre::Rnb),
            "acoustic" => Ok(Genre::Acoustic),
            "rock" => Ok(Genre::Rock),
            "classic rock" => Ok(Genre::ClassicRock),
            "jazz" => Ok(Genre::Jazz),
            "classical" => Ok(Genre::Classical),
            "hip hop" => Ok(Genre::HipHop),
            "rap" => Ok(Genre::Rap),
            "electronic" => Ok(Genre::Electronic),
            "dance" => Ok(Genre::Dance),
            "hard rock" => Ok(Genre::HardRock),
            "grunge" => Ok(Genre::Grunge),
            "alternative" => Ok(Genre::Alternative),
            "dancehall" => Ok(Genre::Dancehall),
            "afrobeat" => Ok(Genre::Afrobeat),
            _ => Err(ParseLabelError(s.to_string())),
        }
    }
}

/// A validated search query.
///
/// Every field is optional; an empty query is legal and simply submits the
/// site's default search. Construct via [`MusicQuery::new`]; deserialization
/// runs through the same validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QueryDraft")]
pub struct MusicQuery {
    mood: Option<Mood>,
    energy_level: Option<u8>,
    happiness_level: Option<u8>,
    genres: Vec<Genre>,
}

#[derive(Deserialize)]
struct QueryDraft {
    #[serde(default)]
    mood: Option<Mood>,
    #[serde(default)]
    energy_level: Option<u8>,
    #[serde(default)]
    happiness_level: Option<u8>,
    #[serde(default)]
    genres: Option<Vec<Genre>>,
}

impl TryFrom<QueryDraft> for MusicQuery {
    type Error = ValidationError;

    fn try_from(draft: QueryDraft) -> Result<Self, Self::Error> {
        MusicQuery::new(
            draft.mood,
            draft.energy_level,
            draft.happiness_level,
            draft.genres.unwrap_or_default(),
        )
    }
}

fn check_level(field: &'static str, value: Option<u8>) -> Result<Option<u8>, ValidationError> {
    match value {
        Some(v) if v > 100 => Err(ValidationError { field, value: v }),
        other => Ok(other),
    }
}

impl MusicQuery {
    /// Build a query, rejecting slider levels outside [0, 100].
    ///
    /// Genres are deduplicated while preserving the caller's order, since
    /// the order determines the order of chip clicks.
    pub fn new(
        mood: Option<Mood>,
        energy_level: Option<u8>,
        happiness_level: Option<u8>,
        genres: Vec<Genre>,
    ) -> Result<Self, ValidationError> {
        let energy_level = check_level("energy_level", energy_level)?;
        let happiness_level = check_level("happiness_level", happiness_level)?;

        let mut deduped = Vec::with_capacity(genres.len());
        for genre in genres {
            if !deduped.contains(&genre) {
                deduped.push(genre);
            }
        }

        Ok(Self {
            mood,
            energy_level,
            happiness_level,
            genres: deduped,
        })
    }

    /// A query with no filters at all.
    pub fn empty() -> Self {
        Self {
            mood: None,
            energy_level: None,
            happiness_level: None,
            genres: Vec::new(),
        }
    }

    pub fn mood(&self) -> Option<Mood> {
        self.mood
    }

    pub fn energy_level(&self) -> Option<u8> {
        self.energy_level
    }

    pub fn happiness_level(&self) -> Option<u8> {
        self.happiness_level
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn is_empty(&self) -> bool {
        self.mood.is_none()
            && self.energy_level.is_none()
            && self.happiness_level.is_none()
            && self.genres.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_within_range() {
        let query = MusicQuery::new(Some(Mood::Happy), Some(0), Some(100), vec![]).unwrap();
        assert_eq!(query.energy_level(), Some(0));
        assert_eq!(query.happiness_level(), Some(100));
    }

    #[test]
    fn rejects_energy_above_range() {
        let err = MusicQuery::new(None, Some(101), None, vec![]).unwrap_err();
        assert_eq!(err.field, "energy_level");
        assert_eq!(err.value, 101);
    }

    #[test]
    fn rejects_happiness_above_range() {
        let err = MusicQuery::new(None, None, Some(255), vec![]).unwrap_err();
        assert_eq!(err.field, "happiness_level");
    }

    #[test]
    fn dedups_genres_preserving_order() {
        let query = MusicQuery::new(
            None,
            None,
            None,
            vec![Genre::Pop, Genre::Jazz, Genre::Pop, Genre::Electronic],
        )
        .unwrap();
        assert_eq!(query.genres(), &[Genre::Pop, Genre::Jazz, Genre::Electronic]);
    }

    #[test]
    fn deserialization_validates_levels() {
        let json = r#"{"mood":"Happy","energy_level":150}"#;
        let result: Result<MusicQuery, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn deserializes_valid_query() {
        let json = r#"{"mood":"Happy","energy_level":75,"happiness_level":80,"genres":["Pop","Electronic"]}"#;
        let query: MusicQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.mood(), Some(Mood::Happy));
        assert_eq!(query.genres(), &[Genre::Pop, Genre::Electronic]);
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("relaxed".parse::<Mood>().unwrap(), Mood::Relaxed);
        assert_eq!("Hip-Hop".parse::<Genre>().unwrap(), Genre::HipHop);
        assert_eq!("rnb".parse::<Genre>().unwrap(), Genre::Rnb);
        assert!("polka".parse::<Genre>().is_err());
    }

    #[test]
    fn click_label_is_lower_case() {
        assert_eq!(Genre::ClassicRock.click_label(), "classic rock");
    }
}
