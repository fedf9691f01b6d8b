//! Core domain logic for Kioku, a spaced-repetition trainer for Japanese
//! kanji and vocabulary.
//! This crate is the single source of truth for scheduling and mastery
//! invariants; HTTP routing and presentation live outside it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod stats;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{
    Item, ItemId, ItemType, ItemValidationError, Kanji, ReviewLogEntry, ReviewState, Word,
    KANA_GRADE, MAX_LEVEL,
};
pub use repo::item_repo::{
    CandidateFilter, ImportSummary, ItemRepository, KanjiListQuery, KanjiSeed, RepoError,
    RepoResult, SqliteItemRepository,
};
pub use repo::word_repo::{NewWord, SqliteWordRepository, WordEdit, WordRepository};
pub use service::ranking::{priority_score, LEVEL_WEIGHT, STALENESS_WEIGHT, UNREVIEWED_CREDIT};
pub use service::review_scheduler::{
    ReviewBatch, ReviewScheduler, SchedulerError, SchedulerResult, StudyMode,
};
pub use stats::aggregate::{aggregate_stats, StatsError, StatsResult, StatsSnapshot};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
