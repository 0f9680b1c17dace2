//! Reply parsing: a `Y`/`N` line followed by the reason

use serde::Serialize;

/// How a judgement was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The model answered `Y` or `N`
    Answered,
    /// The first line was neither; counted as relevant
    Anomaly,
    /// Too long to send; counted as relevant for manual review
    Bypassed,
}

/// Relevance decision for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Judgement {
    pub relevant: bool,
    pub reason: String,
    pub verdict: Verdict,
}

impl Judgement {
    pub fn bypassed(reason: &str) -> Self {
        Self {
            relevant: true,
            reason: reason.to_string(),
            verdict: Verdict::Bypassed,
        }
    }
}

const REASON_LABELS: [&str; 2] = ["이유:", "Reason:"];

/// Parses a model reply into a judgement
///
/// Anything other than `Y`/`N` on the first line is an anomaly and fails
/// open.
pub fn parse_reply(reply: &str) -> Judgement {
    let mut lines = reply.split('\n');
    let first = lines.next().unwrap_or_default().trim();

    let mut reason = lines.collect::<Vec<_>>().join("\n");
    for label in REASON_LABELS {
        reason = reason.replace(label, "");
    }
    let reason = reason.trim().to_string();

    let (relevant, verdict) = match first.to_uppercase().as_str() {
        "Y" => (true, Verdict::Answered),
        "N" => (false, Verdict::Answered),
        _ => {
            tracing::warn!(first_line = first, "Unexpected classifier reply");
            (true, Verdict::Anomaly)
        }
    };

    Judgement {
        relevant,
        reason,
        verdict,
    }
}
