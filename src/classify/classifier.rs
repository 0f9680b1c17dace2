//! Concurrent relevance classification with unbounded retry

use crate::classify::client::{ChatMessage, CompletionClient};
use crate::classify::parse::{parse_reply, Judgement};
use crate::config::ClassifierConfig;
use crate::dataset::{Record, RecordDocument};
use futures::future::join_all;
use rand::Rng;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Reason recorded for records too long to send
pub const BYPASS_REASON: &str = "too long, needs manual review";

/// Backoff exponents beyond this stop growing the delay
const MAX_BACKOFF_EXPONENT: u32 = 20;

/// Instruction sent as the system message for every record
pub fn system_prompt(topic: &str, description: &str) -> String {
    format!(
        "기사 또는 게시글의 제목과 내용이 주어진다.\n\
         해당 게시글의 토픽이 \"{topic}\"과 연관성을 가지고 있는지 파악하라.\n\
         \"{topic}\"란, {description}\n\
         첫째 줄에 Y/N만을, 둘째 줄에 그 이유만을 간략하게 서술하고 그 외에 아무것도 작성하지 마라."
    )
}

/// User message for one record: title and body
pub fn user_prompt(title: &str, text: &str) -> String {
    format!("제목 : {}\n내용 : {}", title, text)
}

/// Delay before a retry: `unit * (2^exponent + jitter)`
pub fn retry_delay(unit: Duration, exponent: u32, jitter: f64) -> Duration {
    let factor = 2f64.powi(exponent.min(MAX_BACKOFF_EXPONENT) as i32) + jitter;
    unit.mul_f64(factor)
}

fn random_jitter() -> f64 {
    rand::rng().random_range(0.0..2.0)
}

/// Classifies records for relevance to a topic through a completion client
///
/// Records are sent in batches; every record of a batch is in flight at
/// once and batches run one after another. A failed call is retried until
/// it succeeds.
pub struct RelevanceClassifier<C> {
    client: C,
    batch_size: usize,
    max_text_length: usize,
    initial_backoff_exponent: u32,
    backoff_unit: Duration,
    attempted: AtomicUsize,
    succeeded: AtomicUsize,
}

impl<C: CompletionClient> RelevanceClassifier<C> {
    pub fn new(client: C, config: &ClassifierConfig) -> Self {
        Self {
            client,
            batch_size: config.batch_size.max(1),
            max_text_length: config.max_text_length,
            initial_backoff_exponent: config.initial_backoff_exponent,
            backoff_unit: config.backoff_unit(),
            attempted: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
        }
    }

    /// `(succeeded, attempted)` calls so far
    pub fn progress(&self) -> (usize, usize) {
        (
            self.succeeded.load(Ordering::Relaxed),
            self.attempted.load(Ordering::Relaxed),
        )
    }

    /// One judgement per record, in input order
    pub async fn classify_relevance(
        &self,
        records: &[Record],
        topic: &str,
        description: &str,
    ) -> Vec<Judgement> {
        let system = ChatMessage::system(system_prompt(topic, description));
        let mut judgements = Vec::with_capacity(records.len());

        for (n, batch) in records.chunks(self.batch_size).enumerate() {
            let offset = n * self.batch_size;
            let calls = batch
                .iter()
                .enumerate()
                .map(|(i, record)| self.classify_one(offset + i, record, &system));
            judgements.extend(join_all(calls).await);

            let (succeeded, attempted) = self.progress();
            tracing::debug!(batch = n, succeeded, attempted, "Batch classified");
        }

        judgements
    }

    async fn classify_one(&self, index: usize, record: &Record, system: &ChatMessage) -> Judgement {
        let text = record.combined_text();
        if text.chars().count() > self.max_text_length {
            tracing::debug!(index, url = %record.url, "Text too long, bypassing classifier");
            return Judgement::bypassed(BYPASS_REASON);
        }

        let messages = [system.clone(), ChatMessage::user(user_prompt(&record.title, &text))];

        let attempted = self.attempted.fetch_add(1, Ordering::Relaxed) + 1;
        if attempted % 100 == 0 {
            let succeeded = self.succeeded.load(Ordering::Relaxed);
            tracing::info!(succeeded, attempted, "Classifier progress");
        }

        let mut exponent = self.initial_backoff_exponent;
        let reply = loop {
            match self.client.complete(&messages).await {
                Ok(reply) => break reply,
                Err(e) => {
                    let delay = retry_delay(self.backoff_unit, exponent, random_jitter());
                    let (succeeded, attempted) = self.progress();
                    tracing::warn!(
                        index,
                        error = %e,
                        ?delay,
                        succeeded,
                        attempted,
                        "Classification failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    exponent += 1;
                }
            }
        };

        let succeeded = self.succeeded.fetch_add(1, Ordering::Relaxed) + 1;
        if succeeded % 100 == 0 {
            let attempted = self.attempted.load(Ordering::Relaxed);
            tracing::info!(succeeded, attempted, "Classifier progress");
        }

        parse_reply(&reply)
    }
}

/// Keeps the relevant records of `document`
///
/// The returned document is keyed by `topic` and carries the full
/// `relatedness` and `reasons` arrays, one entry per input record.
pub fn filter_relevant(
    document: RecordDocument,
    topic: &str,
    judgements: &[Judgement],
) -> RecordDocument {
    if judgements.len() != document.items.len() {
        tracing::warn!(
            records = document.items.len(),
            judgements = judgements.len(),
            "Judgement count does not match the collection"
        );
    }

    let relatedness: Vec<Value> = judgements.iter().map(|j| Value::Bool(j.relevant)).collect();
    let reasons: Vec<Value> = judgements
        .iter()
        .map(|j| Value::String(j.reason.clone()))
        .collect();

    let items = document
        .items
        .into_iter()
        .zip(judgements)
        .filter(|(_, judgement)| judgement.relevant)
        .map(|(record, _)| record)
        .collect();

    let mut filtered = RecordDocument::new(Some(topic.to_string()), items);
    filtered.extra = document.extra;
    filtered
        .extra
        .insert("relatedness".to_string(), Value::Array(relatedness));
    filtered
        .extra
        .insert("reasons".to_string(), Value::Array(reasons));
    filtered
}
