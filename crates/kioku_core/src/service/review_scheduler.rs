//! Review session scheduler.
//!
//! # Responsibility
//! - Select and order the next batch of items to study.
//! - Apply review outcomes to item mastery state through the repository.
//!
//! # Invariants
//! - Selection is a pure read; only `record_outcome` mutates state.
//! - The study mode is passed through to the batch untouched; it affects
//!   rendering, never selection order.
//! - Scheduler APIs never bypass repository atomicity contracts.

use crate::model::item::{Item, ItemId, ItemType};
use crate::repo::item_repo::{CandidateFilter, ItemRepository, RepoError};
use crate::service::ranking::rank;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-level failures, mapping repository errors into the taxonomy the
/// request layer reports to users.
#[derive(Debug)]
pub enum SchedulerError {
    /// Requested batch size must be positive.
    InvalidLimit(u32),
    /// Kanji selection needs at least one school grade in the filter.
    EmptyGradeFilter,
    NotFound { item_type: ItemType, id: ItemId },
    Store(RepoError),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLimit(limit) => {
                write!(f, "review limit must be positive, got {limit}")
            }
            Self::EmptyGradeFilter => write!(f, "kanji grade filter must not be empty"),
            Self::NotFound { item_type, id } => write!(f, "{item_type} not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SchedulerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SchedulerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { item_type, id } => Self::NotFound { item_type, id },
            other => Self::Store(other),
        }
    }
}

/// How a selected batch will be rendered: which side of the card is the
/// question. Carried through selection unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudyMode {
    /// Show the meaning, ask for the item.
    MeaningToItem,
    /// Show the item, ask for the meaning.
    ItemToMeaning,
}

/// An ordered review batch ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewBatch {
    pub mode: StudyMode,
    /// Highest priority first; at most the requested limit.
    pub items: Vec<Item>,
}

/// Use-case service combining the item store with a random source for
/// tie-breaking. Both are injected so tests run against an in-memory store
/// and a seeded generator.
pub struct ReviewScheduler<R: ItemRepository, G: Rng> {
    repo: R,
    rng: G,
}

impl<R: ItemRepository> ReviewScheduler<R, StdRng> {
    /// Creates a scheduler with an OS-seeded random source.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            rng: StdRng::from_os_rng(),
        }
    }
}

impl<R: ItemRepository, G: Rng> ReviewScheduler<R, G> {
    /// Creates a scheduler with a caller-provided random source.
    pub fn with_rng(repo: R, rng: G) -> Self {
        Self { repo, rng }
    }

    /// Selects up to `limit` enabled items for review, highest priority
    /// first.
    ///
    /// # Contract
    /// - `limit` must be positive; kanji filters need at least one grade.
    /// - An empty candidate pool yields an empty batch, not an error.
    /// - Pools smaller than `limit` come back whole.
    /// - No side effects: selection alone never changes item state.
    pub fn select_for_review(
        &mut self,
        filter: &CandidateFilter,
        limit: u32,
        mode: StudyMode,
    ) -> SchedulerResult<ReviewBatch> {
        if limit == 0 {
            return Err(SchedulerError::InvalidLimit(limit));
        }
        if let CandidateFilter::Kanji { grades } = filter {
            if grades.is_empty() {
                return Err(SchedulerError::EmptyGradeFilter);
            }
        }

        let pool = self.repo.review_candidates(filter)?;
        let pool_size = pool.len();
        let items = rank(pool, limit as usize, current_epoch_ms(), &mut self.rng);

        info!(
            "event=review_select module=scheduler status=ok item_type={} pool={} limit={} selected={}",
            filter.item_type(),
            pool_size,
            limit,
            items.len()
        );

        Ok(ReviewBatch { mode, items })
    }

    /// Records one answer: advances or resets the level, stamps the review
    /// metadata and appends the history row, all atomically.
    ///
    /// Unknown ids fail with `NotFound` and leave no trace.
    pub fn record_outcome(
        &mut self,
        item_type: ItemType,
        id: ItemId,
        correct: bool,
    ) -> SchedulerResult<Item> {
        let item = self.repo.record_outcome(item_type, id, correct)?;

        info!(
            "event=review_outcome module=scheduler status=ok item_type={item_type} id={id} \
             correct={correct} level={}",
            item.review().level
        );

        Ok(item)
    }

    /// Gives back the underlying repository.
    pub fn into_repo(self) -> R {
        self.repo
    }
}

fn current_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
