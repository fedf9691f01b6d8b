//! Study item domain model.
//!
//! # Responsibility
//! - Define the two item families (kanji, word) and the mastery-tracking
//!   state they share.
//! - Provide the level state machine applied after each review outcome.
//!
//! # Invariants
//! - `level` never leaves `0..=MAX_LEVEL`.
//! - A correct answer raises the level by one (capped); a miss resets it
//!   to zero, not one step down.
//! - `review_count` only ever grows.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable integer identifier for kanji and word rows.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ItemId = i64;

/// Highest reachable mastery level. Level 0 means unlearned.
pub const MAX_LEVEL: u8 = 5;

/// Grade value used for kana rows, which sort before school-grade kanji.
pub const KANA_GRADE: u8 = 0;

/// Discriminates the two item families sharing one review pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Kanji,
    Word,
}

impl ItemType {
    /// Stable text encoding used in the `review_history` table.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Kanji => "kanji",
            Self::Word => "word",
        }
    }

    /// Parses the stable DB encoding back into a type tag.
    pub fn parse_db_str(value: &str) -> Option<Self> {
        match value {
            "kanji" => Some(Self::Kanji),
            "word" => Some(Self::Word),
            _ => None,
        }
    }
}

impl Display for ItemType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Mastery-tracking state shared by every reviewable item.
///
/// Both item families embed this one shape so the scheduler never needs
/// per-family logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    /// Mastery level in `0..=MAX_LEVEL`; 5 means mastered.
    pub level: u8,
    /// Epoch milliseconds of the most recent review; `None` = never reviewed.
    pub last_reviewed: Option<i64>,
    /// Total outcome reports recorded for this item.
    pub review_count: i64,
    /// Disabled items are skipped by candidate queries but keep their state.
    pub enabled: bool,
}

impl ReviewState {
    /// State for a freshly created, never-reviewed item.
    pub fn unlearned() -> Self {
        Self {
            level: 0,
            last_reviewed: None,
            review_count: 0,
            enabled: true,
        }
    }

    /// Returns the level after applying one review outcome.
    ///
    /// Correct answers climb one step and saturate at [`MAX_LEVEL`]; a miss
    /// wipes all progress back to zero.
    pub fn next_level(current: u8, correct: bool) -> u8 {
        if correct {
            current.saturating_add(1).min(MAX_LEVEL)
        } else {
            0
        }
    }

    /// Whether this item has ever been reviewed.
    pub fn is_studied(&self) -> bool {
        self.last_reviewed.is_some()
    }
}

impl Default for ReviewState {
    fn default() -> Self {
        Self::unlearned()
    }
}

/// A single kanji (or kana) card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kanji {
    pub id: ItemId,
    /// The character itself; unique per row.
    pub character: String,
    pub meaning: String,
    /// School grade the character is taught in; 0 marks kana.
    pub grade: u8,
    #[serde(flatten)]
    pub review: ReviewState,
}

/// A vocabulary card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: ItemId,
    /// The word in its written form; unique per row.
    pub word: String,
    /// Kana reading.
    pub reading: String,
    pub meaning: String,
    #[serde(flatten)]
    pub review: ReviewState,
}

/// Either item family, as returned by candidate and lookup queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum Item {
    Kanji(Kanji),
    Word(Word),
}

impl Item {
    pub fn id(&self) -> ItemId {
        match self {
            Self::Kanji(kanji) => kanji.id,
            Self::Word(word) => word.id,
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Kanji(_) => ItemType::Kanji,
            Self::Word(_) => ItemType::Word,
        }
    }

    pub fn review(&self) -> &ReviewState {
        match self {
            Self::Kanji(kanji) => &kanji.review,
            Self::Word(word) => &word.review,
        }
    }
}

/// Append-only record of one answered review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub id: i64,
    pub item_type: ItemType,
    pub item_id: ItemId,
    /// Whether the answer was correct.
    pub result: bool,
    /// Epoch milliseconds at which the outcome was recorded.
    pub timestamp: i64,
}

/// Validation failures for item fields crossing the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    LevelOutOfRange { level: i64 },
    EmptyField { field: &'static str },
    NegativeReviewCount { count: i64 },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LevelOutOfRange { level } => {
                write!(f, "level {level} outside 0..={MAX_LEVEL}")
            }
            Self::EmptyField { field } => write!(f, "field `{field}` must not be empty"),
            Self::NegativeReviewCount { count } => {
                write!(f, "review_count {count} must not be negative")
            }
        }
    }
}

impl Error for ItemValidationError {}

/// Checks a raw level value read from or bound for storage.
pub fn validate_level(level: i64) -> Result<u8, ItemValidationError> {
    if (0..=i64::from(MAX_LEVEL)).contains(&level) {
        Ok(level as u8)
    } else {
        Err(ItemValidationError::LevelOutOfRange { level })
    }
}

/// Checks a review counter read from storage.
pub fn validate_review_count(count: i64) -> Result<i64, ItemValidationError> {
    if count < 0 {
        Err(ItemValidationError::NegativeReviewCount { count })
    } else {
        Ok(count)
    }
}

/// Rejects empty or whitespace-only text for a required field.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ItemValidationError> {
    if value.trim().is_empty() {
        Err(ItemValidationError::EmptyField { field })
    } else {
        Ok(())
    }
}
