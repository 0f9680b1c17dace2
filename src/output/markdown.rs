//! Markdown report of extraction failures
//!
//! Lists every URL that could not be extracted, grouped by host, so that
//! selector rules can be written for the hosts that fail most.

use crate::extract::ExtractionReport;
use crate::{StoreError, StoreResult};
use std::path::Path;

/// Writes the failure report for one collection to `output_path`
pub fn write_failure_report(
    title: &str,
    report: &ExtractionReport,
    output_path: &Path,
) -> StoreResult<()> {
    let markdown = format_failure_report(title, report);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    std::fs::write(output_path, markdown).map_err(|source| StoreError::Io {
        path: output_path.display().to_string(),
        source,
    })
}

/// Formats an extraction report as markdown
pub fn format_failure_report(title: &str, report: &ExtractionReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Extraction Failures: {}\n\n", title));

    md.push_str("## Overview\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Extracted | {} |\n", report.extracted));
    md.push_str(&format!(
        "| Request Error | {} |\n",
        report.request_errors.len()
    ));
    md.push_str(&format!(
        "| Encoding Error | {} |\n",
        report.encoding_errors.len()
    ));
    md.push_str(&format!("| Total | {} |\n\n", report.total));

    if report.failures_by_host.is_empty() {
        md.push_str("No failures.\n");
        return md;
    }

    let mut hosts: Vec<_> = report.failures_by_host.iter().collect();
    hosts.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));

    md.push_str("## Failures by Host\n\n");
    for (host, urls) in hosts {
        md.push_str(&format!("### {} ({})\n\n", host, urls.len()));
        for url in urls {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    md
}
