//! Output module for stage summaries and reports
//!
//! This module handles:
//! - Printing per-stage statistics at the end of a run
//! - Writing the markdown report of extraction failures by host

mod markdown;
pub mod stats;

pub use markdown::{format_failure_report, write_failure_report};
pub use stats::{
    print_dedup_report, print_extraction_report, print_relevance_statistics, RelevanceStatistics,
};
