//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the shared reviewable-item APIs over the `kanji` and `words`
//!   tables: lookups, candidate pools, enable flags, outcome recording.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `record_outcome` applies the level transition, review metadata and the
//!   history append as one transaction; `NotFound` leaves zero mutations.
//! - Candidate queries only ever return enabled rows.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{migrations::latest_version, DbError};
use crate::model::item::{
    require_text, validate_level, validate_review_count, Item, ItemId, ItemType,
    ItemValidationError, Kanji, ReviewLogEntry, ReviewState, Word,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const KANJI_SELECT_SQL: &str = "SELECT
    id,
    character,
    meaning,
    grade,
    level,
    last_reviewed,
    review_count,
    enabled
FROM kanji";

const WORD_SELECT_SQL: &str = "SELECT
    id,
    word,
    reading,
    meaning,
    level,
    last_reviewed,
    review_count,
    enabled
FROM words";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    NotFound {
        item_type: ItemType,
        id: ItemId,
    },
    /// Unique identifying text (kanji character, word spelling) already taken.
    Duplicate {
        item_type: ItemType,
        value: String,
    },
    InvalidData(String),
    InvalidArgument(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { item_type, id } => write!(f, "{item_type} not found: {id}"),
            Self::Duplicate { item_type, value } => {
                write!(f, "{item_type} `{value}` already exists")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; \
                 open connections through kioku_core::db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter for kanji list use-cases.
#[derive(Debug, Clone, Default)]
pub struct KanjiListQuery {
    /// Restrict to these school grades; `None` lists everything.
    pub grades: Option<Vec<u8>>,
}

/// Scope of a review candidate query: which family, and for kanji which
/// school grades are in play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateFilter {
    Kanji { grades: Vec<u8> },
    Words,
}

impl CandidateFilter {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Kanji { .. } => ItemType::Kanji,
            Self::Words => ItemType::Word,
        }
    }
}

/// One kanji row for the batch import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanjiSeed {
    pub character: String,
    pub meaning: String,
    pub grade: u8,
}

/// Outcome of a batch kanji import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows newly created.
    pub inserted: usize,
    /// Existing rows whose meaning text was refreshed.
    pub refreshed: usize,
}

/// Repository interface for the shared reviewable-item operations.
pub trait ItemRepository {
    fn get_kanji(&self, id: ItemId) -> RepoResult<Option<Kanji>>;
    fn get_word(&self, id: ItemId) -> RepoResult<Option<Word>>;
    /// Lists kanji ordered by grade, then character.
    fn list_kanji(&self, query: &KanjiListQuery) -> RepoResult<Vec<Kanji>>;
    /// Lists words ordered by spelling.
    fn list_words(&self) -> RepoResult<Vec<Word>>;
    /// Returns all enabled items matching the filter, unranked.
    fn review_candidates(&self, filter: &CandidateFilter) -> RepoResult<Vec<Item>>;
    /// Applies one review outcome atomically and returns the updated item.
    fn record_outcome(&mut self, item_type: ItemType, id: ItemId, correct: bool)
        -> RepoResult<Item>;
    /// Sets the enabled flag without touching level, counters or history.
    fn set_enabled(&self, item_type: ItemType, id: ItemId, enabled: bool) -> RepoResult<Item>;
    /// Flips the flag for many items at once; returns the changed row count.
    fn set_enabled_bulk(
        &self,
        item_type: ItemType,
        ids: &[ItemId],
        enabled: bool,
    ) -> RepoResult<usize>;
    /// Most recent history entries for one family, newest first.
    fn list_review_log(&self, item_type: ItemType, limit: u32) -> RepoResult<Vec<ReviewLogEntry>>;
    /// Batch-creates kanji, refreshing meanings of rows that already exist.
    fn import_kanji(&mut self, seeds: &[KanjiSeed]) -> RepoResult<ImportSummary>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn get_kanji(&self, id: ItemId) -> RepoResult<Option<Kanji>> {
        fetch_kanji(self.conn, id)
    }

    fn get_word(&self, id: ItemId) -> RepoResult<Option<Word>> {
        fetch_word(self.conn, id)
    }

    fn list_kanji(&self, query: &KanjiListQuery) -> RepoResult<Vec<Kanji>> {
        let mut sql = String::from(KANJI_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(grades) = &query.grades {
            if grades.is_empty() {
                return Err(RepoError::InvalidArgument(
                    "grade filter must not be empty".to_string(),
                ));
            }
            sql.push_str(" WHERE grade IN (");
            sql.push_str(&placeholders(grades.len()));
            sql.push(')');
            bind_values.extend(grades.iter().map(|grade| Value::Integer(i64::from(*grade))));
        }

        sql.push_str(" ORDER BY grade ASC, character ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(parse_kanji_row(row)?);
        }
        Ok(result)
    }

    fn list_words(&self) -> RepoResult<Vec<Word>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{WORD_SELECT_SQL} ORDER BY word ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(parse_word_row(row)?);
        }
        Ok(result)
    }

    fn review_candidates(&self, filter: &CandidateFilter) -> RepoResult<Vec<Item>> {
        match filter {
            CandidateFilter::Kanji { grades } => {
                if grades.is_empty() {
                    return Err(RepoError::InvalidArgument(
                        "grade filter must not be empty".to_string(),
                    ));
                }
                let sql = format!(
                    "{KANJI_SELECT_SQL} WHERE enabled = 1 AND grade IN ({}) ORDER BY id ASC;",
                    placeholders(grades.len())
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let binds = grades.iter().map(|grade| Value::Integer(i64::from(*grade)));
                let mut rows = stmt.query(params_from_iter(binds))?;
                let mut items = Vec::new();
                while let Some(row) = rows.next()? {
                    items.push(Item::Kanji(parse_kanji_row(row)?));
                }
                Ok(items)
            }
            CandidateFilter::Words => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{WORD_SELECT_SQL} WHERE enabled = 1 ORDER BY id ASC;"))?;
                let mut rows = stmt.query([])?;
                let mut items = Vec::new();
                while let Some(row) = rows.next()? {
                    items.push(Item::Word(parse_word_row(row)?));
                }
                Ok(items)
            }
        }
    }

    fn record_outcome(
        &mut self,
        item_type: ItemType,
        id: ItemId,
        correct: bool,
    ) -> RepoResult<Item> {
        // Immediate transaction: two concurrent reports for the same item
        // serialize on the write lock instead of both reading a stale level.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let now_ms: i64 =
            tx.query_row("SELECT strftime('%s', 'now') * 1000;", [], |row| row.get(0))?;

        let changed = tx.execute(
            &format!(
                "UPDATE {} SET
                    level = CASE WHEN ?2 THEN MIN(level + 1, 5) ELSE 0 END,
                    last_reviewed = ?3,
                    review_count = review_count + 1
                 WHERE id = ?1;",
                table_name(item_type)
            ),
            params![id, correct, now_ms],
        )?;

        if changed == 0 {
            // Dropping the transaction rolls back; nothing was matched anyway.
            return Err(RepoError::NotFound { item_type, id });
        }

        tx.execute(
            "INSERT INTO review_history (item_type, item_id, result, timestamp)
             VALUES (?1, ?2, ?3, ?4);",
            params![item_type.as_db_str(), id, correct, now_ms],
        )?;

        let item = fetch_item(&tx, item_type, id)?
            .ok_or(RepoError::NotFound { item_type, id })?;
        tx.commit()?;
        Ok(item)
    }

    fn set_enabled(&self, item_type: ItemType, id: ItemId, enabled: bool) -> RepoResult<Item> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET enabled = ?2 WHERE id = ?1;",
                table_name(item_type)
            ),
            params![id, enabled],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { item_type, id });
        }

        fetch_item(self.conn, item_type, id)?.ok_or(RepoError::NotFound { item_type, id })
    }

    fn set_enabled_bulk(
        &self,
        item_type: ItemType,
        ids: &[ItemId],
        enabled: bool,
    ) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE {} SET enabled = ? WHERE id IN ({});",
            table_name(item_type),
            placeholders(ids.len())
        );
        let mut binds: Vec<Value> = Vec::with_capacity(ids.len() + 1);
        binds.push(Value::Integer(i64::from(enabled)));
        binds.extend(ids.iter().map(|id| Value::Integer(*id)));

        let changed = self.conn.execute(&sql, params_from_iter(binds))?;
        Ok(changed)
    }

    fn list_review_log(&self, item_type: ItemType, limit: u32) -> RepoResult<Vec<ReviewLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_type, item_id, result, timestamp
             FROM review_history
             WHERE item_type = ?1
             ORDER BY id DESC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![item_type.as_db_str(), limit])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_log_row(row)?);
        }
        Ok(entries)
    }

    fn import_kanji(&mut self, seeds: &[KanjiSeed]) -> RepoResult<ImportSummary> {
        for seed in seeds {
            require_text("character", &seed.character)?;
            require_text("meaning", &seed.meaning)?;
        }

        let tx = self.conn.transaction()?;
        let mut summary = ImportSummary::default();
        {
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO kanji (character, meaning, grade) VALUES (?1, ?2, ?3);",
            )?;
            // Meaning refresh keeps re-imports in sync with updated source
            // data without resetting review progress.
            let mut refresh = tx.prepare(
                "UPDATE kanji SET meaning = ?2 WHERE character = ?1 AND meaning <> ?2;",
            )?;

            for seed in seeds {
                let inserted = insert.execute(params![
                    seed.character.as_str(),
                    seed.meaning.as_str(),
                    i64::from(seed.grade),
                ])?;
                summary.inserted += inserted;
                if inserted == 0 {
                    summary.refreshed +=
                        refresh.execute(params![seed.character.as_str(), seed.meaning.as_str()])?;
                }
            }
        }
        tx.commit()?;
        Ok(summary)
    }
}

fn fetch_item(conn: &Connection, item_type: ItemType, id: ItemId) -> RepoResult<Option<Item>> {
    match item_type {
        ItemType::Kanji => Ok(fetch_kanji(conn, id)?.map(Item::Kanji)),
        ItemType::Word => Ok(fetch_word(conn, id)?.map(Item::Word)),
    }
}

fn fetch_kanji(conn: &Connection, id: ItemId) -> RepoResult<Option<Kanji>> {
    let mut stmt = conn.prepare(&format!("{KANJI_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_kanji_row(row)?));
    }
    Ok(None)
}

fn fetch_word(conn: &Connection, id: ItemId) -> RepoResult<Option<Word>> {
    let mut stmt = conn.prepare(&format!("{WORD_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_word_row(row)?));
    }
    Ok(None)
}

pub(crate) fn parse_kanji_row(row: &Row<'_>) -> RepoResult<Kanji> {
    let grade: i64 = row.get("grade")?;
    if !(0..=255).contains(&grade) {
        return Err(RepoError::InvalidData(format!(
            "invalid grade value `{grade}` in kanji.grade"
        )));
    }

    Ok(Kanji {
        id: row.get("id")?,
        character: row.get("character")?,
        meaning: row.get("meaning")?,
        grade: grade as u8,
        review: parse_review_state(row)?,
    })
}

pub(crate) fn parse_word_row(row: &Row<'_>) -> RepoResult<Word> {
    Ok(Word {
        id: row.get("id")?,
        word: row.get("word")?,
        reading: row.get("reading")?,
        meaning: row.get("meaning")?,
        review: parse_review_state(row)?,
    })
}

fn parse_review_state(row: &Row<'_>) -> RepoResult<ReviewState> {
    let level = validate_level(row.get("level")?)?;
    let review_count = validate_review_count(row.get("review_count")?)?;
    let enabled = parse_bool_column(row.get("enabled")?, "enabled")?;

    Ok(ReviewState {
        level,
        last_reviewed: row.get("last_reviewed")?,
        review_count,
        enabled,
    })
}

fn parse_log_row(row: &Row<'_>) -> RepoResult<ReviewLogEntry> {
    let type_text: String = row.get("item_type")?;
    let item_type = ItemType::parse_db_str(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid item type `{type_text}` in review_history.item_type"
        ))
    })?;

    Ok(ReviewLogEntry {
        id: row.get("id")?,
        item_type,
        item_id: row.get("item_id")?,
        result: parse_bool_column(row.get("result")?, "result")?,
        timestamp: row.get("timestamp")?,
    })
}

fn parse_bool_column(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in column `{column}`"
        ))),
    }
}

fn table_name(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Kanji => "kanji",
        ItemType::Word => "words",
    }
}

fn placeholders(count: usize) -> String {
    let mut out = String::from("?");
    for _ in 1..count {
        out.push_str(", ?");
    }
    out
}

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["kanji", "words", "review_history"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for table in ["kanji", "words"] {
        let has_enabled: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name = 'enabled';"
            ),
            [],
            |row| row.get(0),
        )?;
        if has_enabled == 0 {
            return Err(RepoError::MissingRequiredColumn {
                table,
                column: "enabled",
            });
        }
    }

    Ok(())
}
