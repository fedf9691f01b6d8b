//! Aggregated study statistics per item family.
//!
//! # Responsibility
//! - Count items per mastery level, studied items, and history totals.
//! - Derive the rounded accuracy percentage.
//!
//! # Invariants
//! - Aggregation is a pure read over one store snapshot; nothing is cached.
//! - `accuracy` is 0 when no reviews exist, never a division error.

use crate::db::DbError;
use crate::model::item::ItemType;
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StatsResult<T> = Result<T, StatsError>;

/// Stats-layer error for DB interaction and result decoding.
#[derive(Debug)]
pub enum StatsError {
    Db(DbError),
    InvalidData(String),
}

impl Display for StatsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stats row: {message}"),
        }
    }
}

impl Error for StatsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StatsError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StatsError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Point-in-time aggregate for one item family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub item_type: ItemType,
    pub total_items: u32,
    /// Item counts indexed by mastery level 0..=5.
    pub level_counts: [u32; 6],
    /// Items reviewed at least once.
    pub studied_items: u32,
    pub total_reviews: u32,
    pub correct_reviews: u32,
    /// `round(correct/total * 100)`; 0 when there are no reviews.
    pub accuracy: u32,
}

/// Computes a fresh stats snapshot for one item family.
pub fn aggregate_stats(conn: &Connection, item_type: ItemType) -> StatsResult<StatsSnapshot> {
    let table = match item_type {
        ItemType::Kanji => "kanji",
        ItemType::Word => "words",
    };

    let sql = format!(
        "SELECT
            COUNT(*) AS total_items,
            SUM(CASE WHEN level = 0 THEN 1 ELSE 0 END) AS level_0,
            SUM(CASE WHEN level = 1 THEN 1 ELSE 0 END) AS level_1,
            SUM(CASE WHEN level = 2 THEN 1 ELSE 0 END) AS level_2,
            SUM(CASE WHEN level = 3 THEN 1 ELSE 0 END) AS level_3,
            SUM(CASE WHEN level = 4 THEN 1 ELSE 0 END) AS level_4,
            SUM(CASE WHEN level = 5 THEN 1 ELSE 0 END) AS level_5,
            COUNT(CASE WHEN last_reviewed IS NOT NULL THEN 1 END) AS studied_items,
            (SELECT COUNT(*) FROM review_history WHERE item_type = ?1) AS total_reviews,
            (SELECT COUNT(*) FROM review_history WHERE item_type = ?1 AND result = 1)
                AS correct_reviews
         FROM {table};"
    );

    let snapshot = conn.query_row(&sql, [item_type.as_db_str()], |row| {
        let mut level_counts = [0u32; 6];
        for (level, slot) in level_counts.iter_mut().enumerate() {
            // SUM over zero rows is NULL, not 0.
            let count: Option<u32> = row.get(1 + level)?;
            *slot = count.unwrap_or(0);
        }
        Ok(StatsSnapshot {
            item_type,
            total_items: row.get(0)?,
            level_counts,
            studied_items: row.get(7)?,
            total_reviews: row.get(8)?,
            correct_reviews: row.get(9)?,
            accuracy: 0,
        })
    })?;

    Ok(StatsSnapshot {
        accuracy: accuracy_percent(snapshot.correct_reviews, snapshot.total_reviews),
        ..snapshot
    })
}

fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((f64::from(correct) / f64::from(total)) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::accuracy_percent;

    #[test]
    fn accuracy_is_zero_without_reviews() {
        assert_eq!(accuracy_percent(0, 0), 0);
    }

    #[test]
    fn accuracy_rounds_to_nearest_percent() {
        assert_eq!(accuracy_percent(3, 4), 75);
        assert_eq!(accuracy_percent(1, 3), 33);
        assert_eq!(accuracy_percent(2, 3), 67);
        assert_eq!(accuracy_percent(5, 5), 100);
    }
}
