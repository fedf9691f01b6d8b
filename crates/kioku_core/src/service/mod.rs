//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into review-session level APIs.
//! - Keep request/FFI layers decoupled from storage details.

pub mod ranking;
pub mod review_scheduler;
