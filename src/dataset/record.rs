//! Article records and the documents that hold them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One article or forum thread, identified by its URL
///
/// Records are created upstream by search collaborators and only ever
/// annotated or dropped here. Fields this crate does not know about are
/// kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(alias = "url_naver")]
    pub url: String,

    #[serde(default)]
    pub title: String,

    /// Extracted body, or one of the extraction failure markers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_dates: Option<Vec<String>>,

    /// Keyword/noun set produced by the external tokenizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Creates a bare record with only identity and title
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: None,
            question: None,
            answers: None,
            answer_dates: None,
            tokens: None,
            keyword: None,
            source: None,
            extra: Map::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Everything the relevance classifier reads besides the title
    ///
    /// Articles contribute their extracted text. Forum threads are
    /// flattened into a question line followed by numbered answers.
    pub fn combined_text(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }

        let mut combined = format!("질문: {}", self.question.as_deref().unwrap_or_default());
        for (i, answer) in self.answers.iter().flatten().enumerate() {
            combined.push_str(&format!("\n답변 {}: {}", i, answer));
        }
        combined
    }

    /// Length of the extracted text in characters (0 when absent)
    pub fn text_len(&self) -> usize {
        self.text.as_deref().map_or(0, |t| t.chars().count())
    }
}

/// A stored collection: `{"keyword": ..., "items": [...], ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDocument {
    #[serde(default)]
    pub keyword: Option<String>,

    #[serde(default)]
    pub items: Vec<Record>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordDocument {
    pub fn new(keyword: Option<String>, items: Vec<Record>) -> Self {
        Self {
            keyword,
            items,
            extra: Map::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
