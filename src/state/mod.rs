//! State types shared across the crate
//!
//! This module defines the closed enumerations used for indexing state,
//! submission action types, and submission sources.

mod item;

pub use item::{ActionType, IndexStatus, SubmissionSource};
