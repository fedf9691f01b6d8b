//! Word lifecycle repository.
//!
//! # Responsibility
//! - Own the word-only create/edit paths layered over the shared item
//!   storage (kanji rows are created by import, not by hand).
//!
//! # Invariants
//! - New words start unlearned: level 0, zero reviews, enabled.
//! - Editing word text never touches level, counters or history.
//! - Word spellings stay unique; violations surface as `Duplicate`.

use crate::model::item::{require_text, ItemId, ItemType, Word};
use crate::repo::item_repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode};

/// Input for creating one vocabulary card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWord {
    pub word: String,
    pub reading: String,
    pub meaning: String,
}

/// Replacement text for an existing vocabulary card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEdit {
    pub word: String,
    pub reading: String,
    pub meaning: String,
}

/// Repository interface for word create/edit use-cases.
pub trait WordRepository {
    /// Creates a word at level 0 and returns the stored row.
    fn add_word(&self, new_word: &NewWord) -> RepoResult<Word>;
    /// Replaces the identifying text of an existing word.
    fn update_word(&self, id: ItemId, edit: &WordEdit) -> RepoResult<Word>;
}

/// SQLite-backed word repository.
pub struct SqliteWordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWordRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl WordRepository for SqliteWordRepository<'_> {
    fn add_word(&self, new_word: &NewWord) -> RepoResult<Word> {
        require_text("word", &new_word.word)?;
        require_text("reading", &new_word.reading)?;
        require_text("meaning", &new_word.meaning)?;

        let inserted = self.conn.execute(
            "INSERT INTO words (word, reading, meaning, level, review_count)
             VALUES (?1, ?2, ?3, 0, 0);",
            params![
                new_word.word.as_str(),
                new_word.reading.as_str(),
                new_word.meaning.as_str(),
            ],
        );
        map_unique_violation(inserted, &new_word.word)?;

        let id = self.conn.last_insert_rowid();
        fetch_required(self.conn, id)
    }

    fn update_word(&self, id: ItemId, edit: &WordEdit) -> RepoResult<Word> {
        require_text("word", &edit.word)?;
        require_text("reading", &edit.reading)?;
        require_text("meaning", &edit.meaning)?;

        let changed = self.conn.execute(
            "UPDATE words SET word = ?2, reading = ?3, meaning = ?4 WHERE id = ?1;",
            params![id, edit.word.as_str(), edit.reading.as_str(), edit.meaning.as_str()],
        );
        let changed = map_unique_violation(changed, &edit.word)?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                item_type: ItemType::Word,
                id,
            });
        }

        fetch_required(self.conn, id)
    }
}

fn fetch_required(conn: &Connection, id: ItemId) -> RepoResult<Word> {
    let mut stmt = conn.prepare(
        "SELECT id, word, reading, meaning, level, last_reviewed, review_count, enabled
         FROM words WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => crate::repo::item_repo::parse_word_row(row),
        None => Err(RepoError::NotFound {
            item_type: ItemType::Word,
            id,
        }),
    }
}

fn map_unique_violation(result: rusqlite::Result<usize>, word: &str) -> RepoResult<usize> {
    match result {
        Ok(changed) => Ok(changed),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Err(RepoError::Duplicate {
                item_type: ItemType::Word,
                value: word.to_string(),
            })
        }
        Err(err) => Err(err.into()),
    }
}
