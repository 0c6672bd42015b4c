//! Per-job counters reported in the final summary.

use std::collections::BTreeMap;

use crate::error::{FetchError, FetchErrorKind};

/// Counters collected while harvesting.
///
/// A *unit* is whatever the job iterates over: a query for geocoding, a page
/// for pagination and the crawl pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestStats {
    /// Units attempted
    pub processed: usize,

    /// Units that produced data
    pub resolved: usize,

    /// Units the remote side answered with an explicit empty result
    pub not_found: usize,

    /// Units skipped without a fetch (e.g. blank query)
    pub skipped: usize,

    /// Failed units by category
    pub failures: BTreeMap<FetchErrorKind, usize>,

    /// Raw items inspected by the filter chain
    pub items_seen: usize,

    /// Raw items that passed every filter
    pub items_kept: usize,

    /// Discarded items by filter name
    pub filtered: BTreeMap<String, usize>,
}

impl HarvestStats {
    pub fn record_failure(&mut self, error: &FetchError) {
        *self.failures.entry(error.kind()).or_default() += 1;
    }

    pub fn record_filtered(&mut self, filter: &str) {
        *self.filtered.entry(filter.to_string()).or_default() += 1;
    }

    /// Total failed units across all categories.
    pub fn failed(&self) -> usize {
        self.failures.values().sum()
    }

    /// Units that did not produce data, whatever the reason.
    pub fn unresolved(&self) -> usize {
        self.processed.saturating_sub(self.resolved)
    }

    pub fn failures_of(&self, kind: FetchErrorKind) -> usize {
        self.failures.get(&kind).copied().unwrap_or(0)
    }

    pub fn filtered_by(&self, filter: &str) -> usize {
        self.filtered.get(filter).copied().unwrap_or(0)
    }

    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: &HarvestStats) {
        self.processed += other.processed;
        self.resolved += other.resolved;
        self.not_found += other.not_found;
        self.skipped += other.skipped;
        self.items_seen += other.items_seen;
        self.items_kept += other.items_kept;
        for (kind, count) in &other.failures {
            *self.failures.entry(*kind).or_default() += count;
        }
        for (name, count) in &other.filtered {
            *self.filtered.entry(name.clone()).or_default() += count;
        }
    }

    /// Key/value lines for the run summary.
    pub fn summary_items(&self) -> Vec<(String, String)> {
        let mut items = vec![
            ("processed".to_string(), self.processed.to_string()),
            ("resolved".to_string(), self.resolved.to_string()),
            ("unresolved".to_string(), self.unresolved().to_string()),
            ("not found".to_string(), self.not_found.to_string()),
        ];
        if self.skipped > 0 {
            items.push(("skipped".to_string(), self.skipped.to_string()));
        }
        for (kind, count) in &self.failures {
            items.push((format!("failed ({kind})"), count.to_string()));
        }
        if self.items_seen > 0 {
            items.push(("items seen".to_string(), self.items_seen.to_string()));
            items.push(("items kept".to_string(), self.items_kept.to_string()));
        }
        for (name, count) in &self.filtered {
            items.push((format!("filtered ({name})"), count.to_string()));
        }
        items
    }
}
