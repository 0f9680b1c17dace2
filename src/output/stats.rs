//! End-of-stage statistics printed to stdout

use crate::classify::{Judgement, Verdict};
use crate::dedup::DedupReport;
use crate::extract::ExtractionReport;

/// Counts over one classification run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevanceStatistics {
    pub total: usize,
    pub relevant: usize,

    /// Judged relevant by a `Y` reply
    pub answered_yes: usize,

    /// Judged irrelevant by an `N` reply
    pub answered_no: usize,

    /// Replies that were neither `Y` nor `N`
    pub anomalies: usize,

    /// Sent for manual review without a call
    pub bypassed: usize,
}

impl RelevanceStatistics {
    pub fn from_judgements(judgements: &[Judgement]) -> Self {
        let mut stats = Self {
            total: judgements.len(),
            ..Self::default()
        };

        for judgement in judgements {
            if judgement.relevant {
                stats.relevant += 1;
            }
            match (judgement.verdict, judgement.relevant) {
                (Verdict::Answered, true) => stats.answered_yes += 1,
                (Verdict::Answered, false) => stats.answered_no += 1,
                (Verdict::Anomaly, _) => stats.anomalies += 1,
                (Verdict::Bypassed, _) => stats.bypassed += 1,
            }
        }

        stats
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints an extraction report in a formatted manner
pub fn print_extraction_report(label: &str, report: &ExtractionReport) {
    println!("=== Extraction: {} ===\n", label);

    println!("Overview:");
    println!("  Records: {}", report.total);
    println!(
        "  Extracted: {} ({:.1}%)",
        report.extracted,
        percentage(report.extracted, report.total)
    );
    println!("  Request errors: {}", report.request_errors.len());
    println!("  Encoding errors: {}", report.encoding_errors.len());
    println!("  Retry passes: {}", report.retry_passes);
    println!("  Rules learned: {}", report.learned_rules);
    println!();

    if !report.failures_by_host.is_empty() {
        println!("Failures by Host:");
        let mut hosts: Vec<_> = report.failures_by_host.iter().collect();
        hosts.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));

        for (host, urls) in hosts.iter().take(20) {
            println!("  {}: {}", host, urls.len());
        }
        if hosts.len() > 20 {
            println!("  ... and {} more hosts", hosts.len() - 20);
        }
        println!();
    }
}

/// Prints a deduplication report
pub fn print_dedup_report(label: &str, report: &DedupReport) {
    println!("=== Deduplication: {} ===\n", label);
    println!("  Before: {}", report.before);
    println!("  After: {}", report.after);
    println!(
        "  Removed: {} ({:.1}%)",
        report.removed.len(),
        percentage(report.removed.len(), report.before)
    );
    println!();
}

/// Prints classification statistics
pub fn print_relevance_statistics(label: &str, stats: &RelevanceStatistics) {
    println!("=== Relevance: {} ===\n", label);
    println!(
        "  Relevant: {} / {} ({:.1}%)",
        stats.relevant,
        stats.total,
        percentage(stats.relevant, stats.total)
    );
    println!("  Answered Y: {}", stats.answered_yes);
    println!("  Answered N: {}", stats.answered_no);
    println!("  Anomalous replies: {}", stats.anomalies);
    println!("  Needs manual review: {}", stats.bypassed);
    println!();
}
