//! Content extraction
//!
//! This module turns fetched pages into article text:
//! - `registry`: per-host selector rules, learned as the run goes
//! - `rules`: static URL rewrites and body attributes per host
//! - `extractor`: the rule chain for news articles plus batch retries
//! - `forum`: fixed-layout extraction for Q&A threads

mod extractor;
mod forum;
mod html;
mod registry;
mod rules;

pub use extractor::{summarize, ContentExtractor, Extraction, ExtractionReport};
pub use forum::{parse_forum_thread, ForumExtraction, ForumExtractor, ForumThread};
pub use html::{element_text, parse_selector, select_all_text, select_content};
pub use registry::SelectorRegistry;
pub use rules::{AttributeMap, RedirectRule, RedirectionMap};

/// Text marker for a page that could not be fetched
pub const REQUEST_ERROR: &str = "request_error";

/// Text marker for a page that no rule could read
pub const ENCODING_ERROR: &str = "encoding_error";

/// Whether `text` is one of the extraction failure markers
pub fn is_failure_marker(text: &str) -> bool {
    text == REQUEST_ERROR || text == ENCODING_ERROR
}
