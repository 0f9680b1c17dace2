//! LLM relevance classification
//!
//! Each record is judged against a topic by a chat-completion model whose
//! reply starts with `Y` or `N`. The model is reached through the
//! [`CompletionClient`] trait so tests can script replies.

mod classifier;
mod client;
mod parse;

pub use classifier::{
    filter_relevant, retry_delay, system_prompt, user_prompt, RelevanceClassifier, BYPASS_REASON,
};
pub use client::{ChatMessage, CompletionClient, OpenAiClient};
pub use parse::{parse_reply, Judgement, Verdict};
