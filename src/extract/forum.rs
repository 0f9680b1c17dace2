//! Q&A forum thread extraction
//!
//! Forum pages share one layout, so there is no rule learning here: the
//! question comes from the heading block and each answer carries its
//! posting date at the end of its text.

use crate::config::ExtractConfig;
use crate::dataset::Record;
use crate::extract::extractor::{summarize_field, ExtractionReport, RetrySchedule};
use crate::extract::html::{element_text, select_all_text};
use crate::extract::{ENCODING_ERROR, REQUEST_ERROR};
use crate::fetch::{FetchOutcome, Fetcher};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

const QUESTION_RULES: [&str; 2] = ["div.c-heading__content", "div.c-heading__title"];
const ANSWER_RULE: &str = "div._endContents";
const QUESTION_DATE_RULE: &str = "span.c-userinfo__info";

/// Boilerplate the forum appends to expert answers
const DISCLAIMER: &str = "알아두세요";

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{4}\.\d{2}\.\d{2}").expect("static date pattern"))
}

/// One parsed forum thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForumThread {
    pub question: String,
    pub question_date: String,
    pub answers: Vec<String>,
    pub answer_dates: Vec<String>,
}

/// Outcome of extracting one thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForumExtraction {
    Thread(ForumThread),
    RequestError,
    EncodingError,
}

/// Splits an answer block into its body and trailing date
///
/// The body stops at the disclaimer if one is present, otherwise at the
/// last date. Answers without a date get an empty one.
fn split_answer(raw: &str) -> (String, String) {
    let last_date = date_pattern().find_iter(raw).last();
    let date = last_date.map(|m| m.as_str().to_string()).unwrap_or_default();

    let end = match (raw.find(DISCLAIMER), last_date) {
        (Some(cut), _) => cut,
        (None, Some(m)) => m.start(),
        (None, None) => raw.len(),
    };

    (raw[..end].trim().to_string(), date)
}

/// Parses a thread page; `None` when no question block exists
pub fn parse_forum_thread(html: &str) -> Option<ForumThread> {
    let document = Html::parse_document(html);

    let question = QUESTION_RULES.iter().find_map(|rule| {
        let selector = Selector::parse(rule).ok()?;
        document.select(&selector).next().map(|e| element_text(&e))
    })?;
    if question.is_empty() {
        return None;
    }

    let question_date = Selector::parse(QUESTION_DATE_RULE)
        .ok()
        .and_then(|selector| document.select(&selector).next().map(|e| element_text(&e)))
        .map(|info| info.chars().skip(3).collect::<String>().trim().to_string())
        .unwrap_or_default();

    let (answers, answer_dates) = select_all_text(&document, ANSWER_RULE)
        .iter()
        .map(|raw| split_answer(raw))
        .unzip();

    Some(ForumThread {
        question,
        question_date,
        answers,
        answer_dates,
    })
}

/// Fetches forum threads, sending the configured session cookie
#[derive(Debug, Clone)]
pub struct ForumExtractor {
    fetcher: Fetcher,
    cookie: Option<String>,
    retry: RetrySchedule,
}

impl ForumExtractor {
    pub fn new(fetcher: Fetcher, config: &ExtractConfig) -> Self {
        Self {
            fetcher,
            cookie: config.cookie.clone(),
            retry: RetrySchedule::from_config(config),
        }
    }

    pub async fn extract_thread(&self, url: &str) -> ForumExtraction {
        let page = match self.fetcher.fetch(url, 0, self.cookie.as_deref()).await {
            FetchOutcome::Fetched(page) => page,
            FetchOutcome::Failed { .. } => return ForumExtraction::RequestError,
        };

        match parse_forum_thread(&page.text()) {
            Some(thread) => ForumExtraction::Thread(thread),
            None => {
                tracing::debug!(url, "No question block");
                ForumExtraction::EncodingError
            }
        }
    }

    /// Annotates every record with its question, answers and dates
    ///
    /// Failures leave the marker in `question` and empty answer lists.
    /// Threads that failed to fetch get the same batch retry passes as
    /// articles.
    pub async fn extract_collection(&self, records: &mut [Record]) -> ExtractionReport {
        let total = records.len();
        let mut pending = Vec::new();

        for (i, record) in records.iter_mut().enumerate() {
            if i % 100 == 0 {
                tracing::info!("{} / {} threads processed", i, total);
            }
            let extraction = self.extract_thread(&record.url).await;
            if extraction == ForumExtraction::RequestError {
                pending.push(i);
            }
            annotate(record, extraction);
        }

        let mut passes = 0;
        while !pending.is_empty() && passes < self.retry.passes {
            passes += 1;
            self.retry.wait_before(passes, pending.len()).await;

            let mut still_failing = Vec::new();
            for i in pending {
                let extraction = self.extract_thread(&records[i].url).await;
                if extraction == ForumExtraction::RequestError {
                    still_failing.push(i);
                }
                annotate(&mut records[i], extraction);
            }
            tracing::info!(pass = passes, remaining = still_failing.len(), "Retry pass done");
            pending = still_failing;
        }

        let mut report = summarize_field(records, |record| record.question.as_deref());
        report.retry_passes = passes;
        report
    }
}

fn annotate(record: &mut Record, extraction: ForumExtraction) {
    match extraction {
        ForumExtraction::Thread(thread) => {
            record.question = Some(thread.question);
            record.answers = Some(thread.answers);
            record.answer_dates = Some(thread.answer_dates);
            record
                .extra
                .insert("question_date".into(), Value::String(thread.question_date));
        }
        failure => {
            let marker = match failure {
                ForumExtraction::RequestError => REQUEST_ERROR,
                _ => ENCODING_ERROR,
            };
            record.question = Some(marker.to_string());
            record.answers = Some(Vec::new());
            record.answer_dates = Some(Vec::new());
        }
    }
}
