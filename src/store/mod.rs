//! Storage module for persisting pipeline data
//!
//! This module handles:
//! - JSON record documents addressed by dataset key
//! - JSON rule maps (selectors, redirections, attributes)
//! - The SQLite similarity matrix cache

mod cache;
mod json;
mod schema;

pub use cache::{CachedMatrix, SimilarityCache};
pub use json::{read_json, write_json, RecordStore};
