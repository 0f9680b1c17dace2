//! Article body extraction
//!
//! Turns an article URL into plain text: rewrite the URL, fetch it, then try
//! the host's selector rules followed by every rule known for any host.

use crate::config::ExtractConfig;
use crate::dataset::Record;
use crate::extract::html::select_content;
use crate::extract::registry::SelectorRegistry;
use crate::extract::rules::{AttributeMap, RedirectionMap};
use crate::extract::{ENCODING_ERROR, REQUEST_ERROR};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::url::host_of;
use scraper::Html;
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of extracting one article
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Body text at or above the minimum length
    Text(String),

    /// Fetch failed; eligible for batch retry
    RequestError,

    /// Page fetched but no rule produced a body
    EncodingError,
}

impl Extraction {
    /// Value stored in the record's `text` field
    pub fn into_field(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::RequestError => REQUEST_ERROR.to_string(),
            Self::EncodingError => ENCODING_ERROR.to_string(),
        }
    }
}

/// Summary of one extraction run over a collection
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub total: usize,
    pub extracted: usize,

    /// URLs still failing to fetch after every retry pass
    pub request_errors: Vec<String>,

    /// URLs whose page matched no rule
    pub encoding_errors: Vec<String>,

    /// Failed URLs grouped by host, for selector curation
    pub failures_by_host: BTreeMap<String, Vec<String>>,

    /// Retry passes actually run
    pub retry_passes: u32,

    /// Rules learned during the run
    pub learned_rules: usize,
}

/// Batch retry passes over records whose fetch failed
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetrySchedule {
    pub(crate) passes: u32,
    interval: Duration,
    cooldown: Duration,
}

impl RetrySchedule {
    pub(crate) fn from_config(config: &ExtractConfig) -> Self {
        Self {
            passes: config.batch_retry_passes,
            interval: Duration::from_millis(config.batch_retry_interval_ms),
            cooldown: Duration::from_millis(config.batch_retry_cooldown_ms),
        }
    }

    /// Sleeps before retry pass `pass` (1-based); the first pass also waits
    /// out the cooldown
    pub(crate) async fn wait_before(&self, pass: u32, pending: usize) {
        if pass == 1 {
            tracing::info!(failed = pending, "Retrying failed requests");
            tokio::time::sleep(self.cooldown).await;
        }
        tokio::time::sleep(self.interval).await;
    }
}

/// Fetches articles and extracts their body text
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    fetcher: Fetcher,
    redirects: RedirectionMap,
    attributes: AttributeMap,
    min_text_length: usize,
    retry: RetrySchedule,
}

impl ContentExtractor {
    pub fn new(
        fetcher: Fetcher,
        redirects: RedirectionMap,
        attributes: AttributeMap,
        config: &ExtractConfig,
    ) -> Self {
        Self {
            fetcher,
            redirects,
            attributes,
            min_text_length: config.min_text_length,
            retry: RetrySchedule::from_config(config),
        }
    }

    /// Extracts the body of the article at `url`
    ///
    /// Never fails: fetch failures become [`Extraction::RequestError`] and
    /// pages no rule can read become [`Extraction::EncodingError`].
    pub async fn extract_text(&self, url: &str, registry: &mut SelectorRegistry) -> Extraction {
        let target = self.redirects.rewrite(url);

        let page = match self.fetcher.fetch(&target, 0, None).await {
            FetchOutcome::Fetched(page) => page,
            FetchOutcome::Failed { .. } => return Extraction::RequestError,
        };

        let host = match host_of(&page.final_url).or_else(|_| host_of(&target)) {
            Ok(host) => host,
            Err(e) => {
                tracing::warn!(url, error = %e, "Cannot determine host");
                return Extraction::EncodingError;
            }
        };

        match self.extract_from_html(&page.text(), &host, registry) {
            Some(text) => Extraction::Text(text),
            None => {
                tracing::debug!(url, host, "No rule matched");
                Extraction::EncodingError
            }
        }
    }

    /// Applies the rule chain for `host` to an already fetched document
    ///
    /// Host rules are tried in order; then every candidate rule not already
    /// tried. A candidate that succeeds is recorded for the host.
    pub fn extract_from_html(
        &self,
        html: &str,
        host: &str,
        registry: &mut SelectorRegistry,
    ) -> Option<String> {
        let document = Html::parse_document(html);
        let attribute = self.attributes.attribute_for(host);

        let host_rules = registry.resolve_selectors(host).to_vec();
        for rule in &host_rules {
            if let Some(text) = self.accept(&document, rule, attribute) {
                return Some(text);
            }
        }

        let candidates: Vec<String> = registry
            .candidates()
            .iter()
            .filter(|rule| !host_rules.contains(rule))
            .cloned()
            .collect();
        for rule in candidates {
            if let Some(text) = self.accept(&document, &rule, attribute) {
                registry.record_new_rule(host, &rule);
                return Some(text);
            }
        }

        None
    }

    fn accept(&self, document: &Html, rule: &str, attribute: Option<&str>) -> Option<String> {
        select_content(document, rule, attribute)
            .filter(|text| text.chars().count() >= self.min_text_length)
    }

    /// Extracts the body of every record, in place
    ///
    /// After the first pass, records that failed to fetch are retried in up
    /// to `batch-retry-passes` further passes with a fixed sleep between
    /// them. Records still failing keep `request_error` as their text.
    pub async fn extract_collection(
        &self,
        records: &mut [Record],
        registry: &mut SelectorRegistry,
    ) -> ExtractionReport {
        let learned_before = registry.learned_count();
        let total = records.len();
        let mut pending = Vec::new();

        for (i, record) in records.iter_mut().enumerate() {
            if i % 100 == 0 {
                tracing::info!("{} / {} articles processed", i, total);
            }
            let extraction = self.extract_text(&record.url, registry).await;
            if extraction == Extraction::RequestError {
                pending.push(i);
            }
            record.text = Some(extraction.into_field());
        }

        let mut passes = 0;
        while !pending.is_empty() && passes < self.retry.passes {
            passes += 1;
            self.retry.wait_before(passes, pending.len()).await;

            let mut still_failing = Vec::new();
            for i in pending {
                let record = &mut records[i];
                let extraction = self.extract_text(&record.url, registry).await;
                if extraction == Extraction::RequestError {
                    still_failing.push(i);
                }
                record.text = Some(extraction.into_field());
            }
            tracing::info!(pass = passes, remaining = still_failing.len(), "Retry pass done");
            pending = still_failing;
        }

        let mut report = summarize(records);
        report.retry_passes = passes;
        report.learned_rules = registry.learned_count() - learned_before;
        report
    }
}

/// Builds a report from the `text` markers of `records`
pub fn summarize(records: &[Record]) -> ExtractionReport {
    summarize_field(records, |record| record.text.as_deref())
}

/// Builds a report from whichever field carries the extraction markers
pub(crate) fn summarize_field(
    records: &[Record],
    field: fn(&Record) -> Option<&str>,
) -> ExtractionReport {
    let mut report = ExtractionReport {
        total: records.len(),
        ..ExtractionReport::default()
    };

    for record in records {
        let bucket = match field(record) {
            Some(REQUEST_ERROR) => &mut report.request_errors,
            Some(ENCODING_ERROR) => &mut report.encoding_errors,
            Some(_) => {
                report.extracted += 1;
                continue;
            }
            None => continue,
        };
        bucket.push(record.url.clone());

        let host = host_of(&record.url).unwrap_or_else(|_| "<invalid>".to_string());
        report
            .failures_by_host
            .entry(host)
            .or_default()
            .push(record.url.clone());
    }

    report
}
