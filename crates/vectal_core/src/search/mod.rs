//! Full-text note search.
//!
//! # Responsibility
//! - Expose query APIs backed by the SQLite FTS5 index.
//! - Keep result shaping (preview, highlights, score) inside core.

pub mod fts;
