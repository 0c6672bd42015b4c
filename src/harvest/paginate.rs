//! Sequential pagination driver.
//!
//! Pages are requested in order starting at 1. The total page count is only
//! read from page 1; without it, iteration runs until a page comes back
//! empty. `NotFound` ends the harvest as "no more data", and
//! a failed page ends it early while keeping what was already collected.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::harvest::{FetchOutcome, FilterChain, HarvestStats};
use crate::models::Page;

/// A remote source that can be read page by page.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Short description used in log lines.
    fn label(&self) -> String;

    /// Fetch the page at the given 1-based index.
    async fn fetch_page(&self, index: u32) -> FetchOutcome<Page<Self::Item>>;
}

/// Why pagination ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Every reported page was fetched
    Exhausted,
    /// The first page reported zero records
    NoResults,
    /// A page without a known total had no items
    EmptyPage,
    /// The source answered "no more data"
    NoMoreData,
    /// The configured page cap was reached
    PageCap,
    /// A page failed; earlier items are kept
    Failed(FetchError),
}

/// Items collected by one pagination run.
#[derive(Debug)]
pub struct Harvest<T> {
    pub items: Vec<T>,
    pub stats: HarvestStats,
    pub stop: StopReason,
    /// Total pages reported by the source, if any
    pub total_pages: Option<u32>,
}

/// Drives a [`PageSource`] to completion.
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    delay: Duration,
    max_pages: Option<u32>,
}

impl Paginator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_pages: None,
        }
    }

    /// Stop after at most `max_pages` requests.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fetch every page, run items through `filters`, and accumulate survivors.
    pub async fn run<S>(&self, source: &S, filters: &FilterChain<S::Item>) -> Harvest<S::Item>
    where
        S: PageSource + ?Sized,
    {
        let label = source.label();
        let mut items = Vec::new();
        let mut stats = HarvestStats::default();
        let mut total_pages: Option<u32> = None;
        let mut index: u32 = 1;

        let stop = loop {
            if total_pages.is_some_and(|total| index > total) {
                break StopReason::Exhausted;
            }
            if self.max_pages.is_some_and(|max| index > max) {
                log::warn!("{}: page cap reached at page {}", label, index - 1);
                break StopReason::PageCap;
            }
            if index > 1 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            stats.processed += 1;
            match source.fetch_page(index).await {
                FetchOutcome::Found(page) => {
                    if index == 1 {
                        if page.total_records == Some(0) {
                            log::info!("{}: 0 results, stopping", label);
                            stats.not_found += 1;
                            break StopReason::NoResults;
                        }
                        if let Some(total) = page.total_pages {
                            log::info!(
                                "{}: {} results across {} pages",
                                label,
                                page.total_records.unwrap_or_default(),
                                total
                            );
                            total_pages = Some(total);
                        }
                    }

                    if page.items.is_empty() {
                        stats.not_found += 1;
                        if total_pages.is_none() {
                            log::info!("{}: page {} is empty, stopping", label, index);
                            break StopReason::EmptyPage;
                        }
                        log::info!("{}: no items on page {}", label, index);
                    } else {
                        stats.resolved += 1;
                        let before = stats.filtered.clone();
                        let kept = filters.apply(page.items, &mut stats);
                        let added = kept.len();
                        items.extend(kept);
                        log::info!(
                            "{}: page {}/{} done, {} added{} (total {})",
                            label,
                            index,
                            total_pages.map_or_else(|| "?".to_string(), |t| t.to_string()),
                            added,
                            describe_discards(&before, &stats),
                            items.len()
                        );
                    }
                }
                FetchOutcome::NotFound => {
                    log::info!("{}: no more data at page {}", label, index);
                    stats.not_found += 1;
                    break StopReason::NoMoreData;
                }
                FetchOutcome::Failed(error) => {
                    log::warn!("{}: page {} failed: {}", label, index, error);
                    stats.record_failure(&error);
                    break StopReason::Failed(error);
                }
            }

            index += 1;
        };

        Harvest {
            items,
            stats,
            stop,
            total_pages,
        }
    }
}

/// Render the per-filter discards of the last page, e.g. ` (filtered: atm 5)`.
fn describe_discards(
    before: &std::collections::BTreeMap<String, usize>,
    stats: &HarvestStats,
) -> String {
    let parts: Vec<String> = stats
        .filtered
        .iter()
        .map(|(name, count)| (name, count - before.get(name).copied().unwrap_or(0)))
        .filter(|(_, delta)| *delta > 0)
        .map(|(name, delta)| format!("{name} {delta}"))
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!(" (filtered: {})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::harvest::{ExcludeKeyword, RequireSubstring};
    use crate::models::SearchItem;

    /// Serves canned outcomes and records requested indices.
    struct ScriptedSource<T> {
        pages: Vec<FetchOutcome<Page<T>>>,
        requested: Mutex<Vec<u32>>,
    }

    impl<T: Clone + Send + Sync> ScriptedSource<T> {
        fn new(pages: Vec<FetchOutcome<Page<T>>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<T: Clone + Send + Sync> PageSource for ScriptedSource<T> {
        type Item = T;

        fn label(&self) -> String {
            "scripted".into()
        }

        async fn fetch_page(&self, index: u32) -> FetchOutcome<Page<T>> {
            self.requested.lock().unwrap().push(index);
            self.pages
                .get(index as usize - 1)
                .cloned()
                .unwrap_or(FetchOutcome::Found(Page::new(index, Vec::new())))
        }
    }

    fn search_item(title: &str, road: &str) -> SearchItem {
        SearchItem {
            title: title.into(),
            road_address: road.into(),
            point: None,
        }
    }

    fn bank_filters() -> FilterChain<SearchItem> {
        FilterChain::new()
            .with(ExcludeKeyword::new("atm", "ATM", |i: &SearchItem| {
                i.title.as_str()
            }))
            .with(RequireSubstring::new("region", "서울", |i: &SearchItem| {
                i.road_address.as_str()
            }))
    }

    #[tokio::test]
    async fn test_two_pages_with_filters() {
        // Page 1: 30 items, 5 ATMs. Page 2: 30 items, 10 outside the region.
        let page1: Vec<SearchItem> = (0..30)
            .map(|i| {
                if i < 5 {
                    search_item(&format!("신한은행 ATM {i}"), "서울 중구")
                } else {
                    search_item(&format!("신한은행 {i}호점"), "서울 중구")
                }
            })
            .collect();
        let page2: Vec<SearchItem> = (0..30)
            .map(|i| {
                if i < 10 {
                    search_item(&format!("신한은행 {i}호점"), "경기도 고양시")
                } else {
                    search_item(&format!("신한은행 {i}호점"), "서울 강남구")
                }
            })
            .collect();

        let source = ScriptedSource::new(vec![
            FetchOutcome::Found(Page::new(1, page1).with_totals(2, 60)),
            FetchOutcome::Found(Page::new(2, page2).with_totals(2, 60)),
        ]);

        let harvest = Paginator::default().run(&source, &bank_filters()).await;

        assert_eq!(harvest.items.len(), 45);
        assert_eq!(harvest.stop, StopReason::Exhausted);
        assert_eq!(harvest.stats.filtered_by("atm"), 5);
        assert_eq!(harvest.stats.filtered_by("region"), 10);
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_exactly_n_fetches_for_n_pages() {
        let pages: Vec<_> = (1..=4)
            .map(|i| FetchOutcome::Found(Page::new(i, vec![i]).with_totals(4, 4)))
            .collect();
        let source = ScriptedSource::new(pages);

        let harvest = Paginator::default().run(&source, &FilterChain::new()).await;

        assert_eq!(source.requested(), vec![1, 2, 3, 4]);
        assert_eq!(harvest.items, vec![1, 2, 3, 4]);
        assert_eq!(harvest.total_pages, Some(4));
    }

    #[tokio::test]
    async fn test_zero_records_stops_immediately() {
        let source = ScriptedSource::new(vec![FetchOutcome::Found(
            Page::<u32>::new(1, vec![]).with_totals(1, 0),
        )]);

        let harvest = Paginator::default().run(&source, &FilterChain::new()).await;

        assert_eq!(harvest.stop, StopReason::NoResults);
        assert_eq!(source.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_empty_page_without_total_stops_and_keeps_items() {
        let source = ScriptedSource::new(vec![
            FetchOutcome::Found(Page::new(1, vec!["a", "b"])),
            FetchOutcome::Found(Page::new(2, vec!["c"])),
            FetchOutcome::Found(Page::new(3, vec![])),
            FetchOutcome::Found(Page::new(4, vec!["never"])),
        ]);

        let harvest = Paginator::default().run(&source, &FilterChain::new()).await;

        assert_eq!(harvest.stop, StopReason::EmptyPage);
        assert_eq!(harvest.items, vec!["a", "b", "c"]);
        assert_eq!(source.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_page_with_known_total_is_skipped() {
        let source = ScriptedSource::new(vec![
            FetchOutcome::Found(Page::new(1, vec![1]).with_totals(3, 2)),
            FetchOutcome::Found(Page::new(2, vec![]).with_totals(3, 2)),
            FetchOutcome::Found(Page::new(3, vec![3]).with_totals(3, 2)),
        ]);

        let harvest = Paginator::default().run(&source, &FilterChain::new()).await;

        assert_eq!(harvest.stop, StopReason::Exhausted);
        assert_eq!(harvest.items, vec![1, 3]);
        assert_eq!(harvest.stats.not_found, 1);
    }

    #[tokio::test]
    async fn test_not_found_ends_harvest() {
        let source = ScriptedSource::new(vec![
            FetchOutcome::Found(Page::new(1, vec![1])),
            FetchOutcome::NotFound,
        ]);

        let harvest = Paginator::default().run(&source, &FilterChain::new()).await;

        assert_eq!(harvest.stop, StopReason::NoMoreData);
        assert_eq!(harvest.items, vec![1]);
    }

    #[tokio::test]
    async fn test_failure_keeps_accumulated_items() {
        let source = ScriptedSource::new(vec![
            FetchOutcome::Found(Page::new(1, vec![1, 2]).with_totals(5, 10)),
            FetchOutcome::Failed(FetchError::malformed("expected value at line 1")),
        ]);

        let harvest = Paginator::default().run(&source, &FilterChain::new()).await;

        assert!(matches!(harvest.stop, StopReason::Failed(_)));
        assert_eq!(harvest.items, vec![1, 2]);
        assert_eq!(harvest.stats.failed(), 1);
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_page_cap() {
        let pages: Vec<_> = (1..=10)
            .map(|i| FetchOutcome::Found(Page::new(i, vec![i])))
            .collect();
        let source = ScriptedSource::new(pages);

        let harvest = Paginator::default()
            .with_max_pages(Some(3))
            .run(&source, &FilterChain::new())
            .await;

        assert_eq!(harvest.stop, StopReason::PageCap);
        assert_eq!(source.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_total_is_only_read_from_first_page() {
        let source = ScriptedSource::new(vec![
            FetchOutcome::Found(Page::new(1, vec![1])),
            FetchOutcome::Found(Page::new(2, vec![2]).with_totals(2, 2)),
            FetchOutcome::Found(Page::new(3, vec![3])),
            FetchOutcome::NotFound,
        ]);

        let harvest = Paginator::default().run(&source, &FilterChain::new()).await;

        assert_eq!(harvest.total_pages, None);
        assert_eq!(harvest.stop, StopReason::NoMoreData);
        assert_eq!(harvest.items, vec![1, 2, 3]);
        assert_eq!(source.requested(), vec![1, 2, 3, 4]);
    }
}
