//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for study items.
//! - Isolate SQLite query details from scheduler orchestration.
//!
//! # Invariants
//! - The level update and its history append commit in one transaction.
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`) in
//!   addition to DB transport errors.

pub mod item_repo;
pub mod word_repo;
