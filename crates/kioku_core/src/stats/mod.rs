//! Study statistics entry points.
//!
//! # Responsibility
//! - Expose read-only aggregation over item and history tables.
//! - Keep result shaping inside core.

pub mod aggregate;
