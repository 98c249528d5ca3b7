//! Document text processing for notes.
//!
//! # Responsibility
//! - Derive previews and highlights for list and search responses.
//! - Decide version snapshots on content edits.
//! - Render markdown for display.
//!
//! # Invariants
//! - Nothing here touches storage; callers persist the results.

pub mod preview;
pub mod render;
pub mod versioning;

pub use preview::{
    extract_highlights, generate_preview, strip_markdown, word_count, DEFAULT_MAX_HIGHLIGHTS,
    DEFAULT_PREVIEW_MAX_LENGTH,
};
pub use render::{render_to_html, CmarkRenderer, MarkdownRenderer};
pub use versioning::{record_version_on_change, DocumentVersion, VersionBump, VersionedDocument};
