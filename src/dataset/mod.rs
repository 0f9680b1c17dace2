//! Dataset identity: what a collection holds and which stage produced it
//!
//! A stored collection is addressed by a [`DatasetKey`]: its kind (news
//! articles or forum threads), the pipeline stage that wrote it, and the
//! search keyword when the collection is still scoped to one.

mod record;

pub use record::{Record, RecordDocument};

use clap::ValueEnum;
use std::fmt;

/// The kind of records a collection holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatasetKind {
    /// News articles with extracted body text
    News,
    /// Forum question/answer threads
    Forum,
}

impl DatasetKind {
    /// Short tag used in storage keys
    pub fn tag(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Forum => "kin",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The pipeline stage that produced a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Stage {
    /// Search API results
    Search,
    /// Search API results with extracted text
    SearchWithText,
    /// Crawled search results
    Crawl,
    /// Crawled search results with extracted text
    CrawlWithText,
    /// Records judged relevant by the classifier
    Related,
    /// Merged and tokenized collections
    Processed,
    /// Processed collection after deduplication
    Unique,
}

impl Stage {
    /// The stage text extraction writes for records read from `self`
    pub fn with_text(&self) -> Option<Stage> {
        match self {
            Self::Search => Some(Self::SearchWithText),
            Self::Crawl => Some(Self::CrawlWithText),
            _ => None,
        }
    }

    fn stem(&self, kind: DatasetKind) -> String {
        let tag = kind.tag();
        match self {
            Self::Search => format!("api_naver_{}_result", tag),
            Self::SearchWithText => format!("api_naver_{}_result_with_text", tag),
            Self::Crawl => format!("crawl_naver_{}_result", tag),
            Self::CrawlWithText => format!("crawl_naver_{}_result_with_text", tag),
            Self::Related => format!("naver_{}_related", tag),
            Self::Processed => format!("naver_{}_processed", tag),
            Self::Unique => format!("naver_{}_unique", tag),
        }
    }
}

/// Storage address of one collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    pub kind: DatasetKind,
    pub stage: Stage,
    pub keyword: Option<String>,
}

impl DatasetKey {
    pub fn new(kind: DatasetKind, stage: Stage, keyword: Option<&str>) -> Self {
        Self {
            kind,
            stage,
            keyword: keyword.map(str::to_string),
        }
    }

    /// Key of the same collection at another stage
    pub fn at_stage(&self, stage: Stage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }

    /// File stem of this collection, e.g. `crawl_naver_news_result_with_text_환자 권리`
    ///
    /// Quote characters in keywords are replaced with `(quote)` so exact-match
    /// search keywords still produce valid file names.
    pub fn file_stem(&self) -> String {
        let stem = self.stage.stem(self.kind);
        match &self.keyword {
            Some(keyword) => sanitize_file_name(&format!("{}_{}", stem, keyword)),
            None => stem,
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_stem())
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.replace(['"', '\''], "(quote)")
}

/// Merges several collections into one processed collection
///
/// Every record is tagged with the keyword and the storage key it came from.
/// Order is preserved: all records of the first part, then the second, ...
pub fn merge_documents(parts: Vec<(DatasetKey, RecordDocument)>) -> RecordDocument {
    let mut items = Vec::new();
    for (key, document) in parts {
        let source = key.file_stem();
        for mut record in document.items {
            record.keyword = key.keyword.clone().or_else(|| document.keyword.clone());
            record.source = Some(source.clone());
            items.push(record);
        }
    }
    RecordDocument::new(None, items)
}
