//! Domain model for reviewable study items.
//!
//! # Responsibility
//! - Define the canonical kanji/word records and their shared mastery state.
//! - Keep level-range and field validation rules in one place.
//!
//! # Invariants
//! - Mastery `level` stays within `0..=MAX_LEVEL` everywhere in core.
//! - Review history entries are append-only and never mutated.

pub mod item;
