//! Spoken languages and their phrasing
//!
//! Two languages are modeled. Everything that differs between them (keywords,
//! prompts, sentence shapes) lives here so the rest of the crate stays
//! language-agnostic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::vision::DirectionZone;

/// A spoken output language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    #[serde(alias = "en")]
    English,
    /// Tamil
    #[serde(alias = "ta")]
    Tamil,
}

impl Language {
    /// All supported languages, in keyword-matching priority order
    pub const ALL: [Self; 2] = [Self::Tamil, Self::English];

    /// ISO 639-1 code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Tamil => "ta",
        }
    }

    /// Lowercase English name, as used in voice commands and config keys
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Tamil => "tamil",
        }
    }

    /// Accepted spellings when the user names this language aloud
    #[must_use]
    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::English => &["english", "inglish"],
            Self::Tamil => &["tamil", "tamizh", "tamir", "தமிழ்"],
        }
    }

    /// Single-character keyboard choice
    #[must_use]
    pub const fn choice_key(self) -> char {
        match self {
            Self::English => 'e',
            Self::Tamil => 't',
        }
    }

    /// Voice command phrase that switches to this language
    #[must_use]
    pub fn switch_phrase(self) -> String {
        format!("switch to {}", self.name())
    }

    /// Confirmation spoken (in this language) after switching to it
    #[must_use]
    pub const fn switch_confirmation(self) -> &'static str {
        match self {
            Self::English => "Language switched to English.",
            Self::Tamil => "மொழி தமிழ் ஆக மாற்றப்பட்டது",
        }
    }

    /// Match a transcript against every language's keywords
    ///
    /// Tamil is checked first, so a transcript naming both resolves to Tamil.
    #[must_use]
    pub fn from_transcript(transcript: &str) -> Option<Self> {
        let lower = transcript.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.keywords().iter().any(|kw| lower.contains(kw)))
    }

    /// Match a single keyboard choice (case-insensitive, surrounding whitespace ignored)
    #[must_use]
    pub fn from_choice(input: &str) -> Option<Self> {
        let trimmed = input.trim().to_lowercase();
        let mut chars = trimmed.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return None;
        };
        Self::ALL.into_iter().find(|lang| lang.choice_key() == c)
    }

    /// Describe one object at a direction, e.g. "A car to your left"
    #[must_use]
    pub fn describe(self, object: &str, zone: DirectionZone) -> String {
        match self {
            Self::English => {
                let direction = match zone {
                    DirectionZone::Left => "to your left",
                    DirectionZone::Ahead => "ahead",
                    DirectionZone::Right => "to your right",
                };
                format!("A {object} {direction}")
            }
            Self::Tamil => match zone {
                DirectionZone::Left => format!("எனது இடப்புறம் ஒரு {object}"),
                DirectionZone::Ahead => format!("எனக்கு முன் ஒரு {object}"),
                DirectionZone::Right => format!("எனது வலப்புறம் ஒரு {object}"),
            },
        }
    }

    /// Compose object descriptions into one announcement sentence
    #[must_use]
    pub fn compose_announcement(self, descriptions: &[String]) -> String {
        match self {
            Self::English => format!("I see {}.", descriptions.join(", ")),
            Self::Tamil => format!("{} இருக்கிறது.", descriptions.join(" , ")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.name() == lower || lang.code() == lower)
            .ok_or_else(|| Error::Config(format!("unsupported language: {s}")))
    }
}
