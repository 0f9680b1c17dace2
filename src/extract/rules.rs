//! Static per-host rules: URL rewrites and body attributes

use crate::store::read_json;
use crate::url::host_of;
use crate::Result;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PatternList {
    One(String),
    Many(Vec<String>),
}

impl PatternList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(p) => vec![p],
            Self::Many(ps) => ps,
        }
    }
}

/// Rewrite rule for one host: the first pattern whose first capture group
/// matches is spliced between `prefix` and `suffix`
#[derive(Debug, Clone)]
pub struct RedirectRule {
    patterns: Vec<Regex>,
    prefix: String,
    suffix: String,
}

impl RedirectRule {
    pub fn new(patterns: &[&str], prefix: &str, suffix: &str) -> Result<Self> {
        Ok(Self {
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p))
                .collect::<std::result::Result<_, _>>()?,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    fn apply(&self, url: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            let captures = pattern.captures(url)?;
            let key = captures.get(1).or_else(|| captures.get(0))?;
            Some(format!("{}{}{}", self.prefix, key.as_str(), self.suffix))
        })
    }
}

/// Host -> URL rewrite, for hosts whose article URL needs an alternate
/// (print/API style) form to be fetchable
#[derive(Debug, Clone, Default)]
pub struct RedirectionMap {
    rules: HashMap<String, RedirectRule>,
}

impl RedirectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `host -> [patterns, prefix, suffix]` from JSON
    ///
    /// `patterns` may be a single regex or a list. A missing file is an
    /// empty map.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw: HashMap<String, (PatternList, String, String)> = read_json(path)?;
        let mut map = Self::new();
        for (host, (patterns, prefix, suffix)) in raw {
            let patterns = patterns.into_vec();
            let patterns: Vec<&str> = patterns.iter().map(String::as_str).collect();
            map.insert(&host, RedirectRule::new(&patterns, &prefix, &suffix)?);
        }
        tracing::info!(path = %path.display(), hosts = map.rules.len(), "Loaded redirection map");
        Ok(map)
    }

    pub fn insert(&mut self, host: &str, rule: RedirectRule) {
        self.rules.insert(host.to_string(), rule);
    }

    /// Rewrites `url` if its host has a rule and a pattern matches
    pub fn rewrite(&self, url: &str) -> String {
        let Ok(host) = host_of(url) else {
            return url.to_string();
        };
        match self.rules.get(&host).and_then(|rule| rule.apply(url)) {
            Some(rewritten) => {
                tracing::debug!(from = url, to = %rewritten, "Rewrote article URL");
                rewritten
            }
            None => url.to_string(),
        }
    }
}

/// Host -> attribute holding the article body instead of element text
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    attributes: HashMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `host -> attribute` from JSON; a missing file is an empty map
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let attributes: HashMap<String, String> = read_json(path)?;
        Ok(Self { attributes })
    }

    pub fn insert(&mut self, host: &str, attribute: &str) {
        self.attributes
            .insert(host.to_string(), attribute.to_string());
    }

    pub fn attribute_for(&self, host: &str) -> Option<&str> {
        self.attributes
            .get(host)
            .map(String::as_str)
            .filter(|a| !a.is_empty())
    }
}
