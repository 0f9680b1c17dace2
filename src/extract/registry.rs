//! Per-host selector rules with learning
//!
//! The registry maps a host to an ordered list of selector rules. Rules are
//! only ever appended: when no rule of a host yields an article body, every
//! rule known for any host is probed, and the first one that works is
//! appended to that host's list. The map is written back with [`flush`].
//!
//! [`flush`]: SelectorRegistry::flush

use crate::dataset::Record;
use crate::store::{read_json, write_json};
use crate::url::host_of;
use crate::StoreResult;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// Host -> ordered extraction rules, plus the global candidate set
#[derive(Debug, Clone)]
pub struct SelectorRegistry {
    rules: BTreeMap<String, Vec<String>>,
    candidates: Vec<String>,
    default_rules: Vec<String>,
    learned: usize,
    dirty: bool,
}

impl SelectorRegistry {
    /// Creates a registry from an existing rule map
    ///
    /// The candidate set is the union of all rules in first-seen order
    /// (hosts in map order), with `default_rule` appended if not present.
    pub fn new(rules: BTreeMap<String, Vec<String>>, default_rule: &str) -> Self {
        let mut candidates = Vec::new();
        let mut seen = HashSet::new();
        for rule in rules.values().flatten().map(String::as_str).chain([default_rule]) {
            if seen.insert(rule.to_string()) {
                candidates.push(rule.to_string());
            }
        }

        Self {
            rules,
            candidates,
            default_rules: vec![default_rule.to_string()],
            learned: 0,
            dirty: false,
        }
    }

    /// Loads the rule map from `path`; a missing file is an empty map
    pub fn load(path: &Path, default_rule: &str) -> StoreResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No selector map yet, starting empty");
            return Ok(Self::new(BTreeMap::new(), default_rule));
        }
        let rules: BTreeMap<String, Vec<String>> = read_json(path)?;
        tracing::info!(path = %path.display(), hosts = rules.len(), "Loaded selector map");
        Ok(Self::new(rules, default_rule))
    }

    /// Rules to try for `host`, in order
    ///
    /// Hosts without rules get the global default rule.
    pub fn resolve_selectors(&self, host: &str) -> &[String] {
        self.rules
            .get(host)
            .filter(|rules| !rules.is_empty())
            .map(Vec::as_slice)
            .unwrap_or(&self.default_rules)
    }

    /// Every rule known for any host, plus the default
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Whether `host` has at least one mapped rule
    pub fn has_host(&self, host: &str) -> bool {
        self.rules.get(host).is_some_and(|rules| !rules.is_empty())
    }

    /// Appends `rule` to the rules of `host`
    ///
    /// Existing rules keep their positions. Returns `false` when the host
    /// already had the rule.
    pub fn record_new_rule(&mut self, host: &str, rule: &str) -> bool {
        let rules = self.rules.entry(host.to_string()).or_default();
        if rules.iter().any(|r| r == rule) {
            return false;
        }
        rules.push(rule.to_string());

        if !self.candidates.iter().any(|r| r == rule) {
            self.candidates.push(rule.to_string());
        }

        self.learned += 1;
        self.dirty = true;
        tracing::info!(host, rule, "Learned extraction rule");
        true
    }

    /// Number of rules learned since the registry was created
    pub fn learned_count(&self) -> usize {
        self.learned
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the rule map to `path` if anything was learned
    ///
    /// Returns whether a write happened.
    pub fn flush(&mut self, path: &Path) -> StoreResult<bool> {
        if !self.dirty {
            return Ok(false);
        }
        write_json(path, &self.rules)?;
        self.dirty = false;
        tracing::info!(path = %path.display(), hosts = self.rules.len(), "Saved selector map");
        Ok(true)
    }

    /// Hosts among `records` that have no rule and no successful extraction
    ///
    /// These are the hosts that need a hand-written rule.
    pub fn unmapped_hosts(&self, records: &[Record]) -> Vec<String> {
        let mut candidates = BTreeSet::new();
        let mut served = HashSet::new();

        for record in records {
            let Ok(host) = host_of(&record.url) else {
                continue;
            };
            if self.has_host(&host) {
                continue;
            }
            let extracted = record
                .text
                .as_deref()
                .is_some_and(|text| !crate::extract::is_failure_marker(text));
            if extracted {
                served.insert(host.clone());
            }
            candidates.insert(host);
        }

        candidates
            .into_iter()
            .filter(|host| !served.contains(host))
            .collect()
    }
}
