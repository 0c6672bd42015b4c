//! Bounded concurrent page fetching.
//!
//! Every submitted index is fetched exactly once by at most `workers`
//! concurrent fetches. Outcomes are consumed in completion order, and the
//! call returns only after all fetches have finished.

use std::future::Future;

use futures::stream::{self, StreamExt};

use crate::harvest::{FetchOutcome, HarvestStats};

/// Pages gathered by [`gather_pages`].
#[derive(Debug)]
pub struct Gathered<T> {
    /// `(page index, value)` in completion order
    pub pages: Vec<(u32, T)>,

    /// Indices that produced no data (not found or failed), sorted
    pub missing: Vec<u32>,

    pub stats: HarvestStats,
}

impl<T> Gathered<T> {
    pub fn requested(&self) -> usize {
        self.stats.processed
    }
}

/// Fetch all `indices` with at most `workers` fetches in flight.
pub async fn gather_pages<T, F, Fut>(
    label: &str,
    indices: Vec<u32>,
    workers: usize,
    progress_every: usize,
    fetch: F,
) -> Gathered<T>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = FetchOutcome<T>>,
{
    let total = indices.len();
    let mut gathered = Gathered {
        pages: Vec::new(),
        missing: Vec::new(),
        stats: HarvestStats::default(),
    };

    let mut results = stream::iter(indices)
        .map(|index| {
            let pending = fetch(index);
            async move { (index, pending.await) }
        })
        .buffer_unordered(workers.max(1));

    while let Some((index, outcome)) = results.next().await {
        gathered.stats.processed += 1;
        match outcome {
            FetchOutcome::Found(value) => {
                gathered.stats.resolved += 1;
                gathered.pages.push((index, value));
            }
            FetchOutcome::NotFound => {
                log::debug!("{}: page {} has no data", label, index);
                gathered.stats.not_found += 1;
                gathered.missing.push(index);
            }
            FetchOutcome::Failed(error) => {
                log::warn!("{}: error on page {}: {}", label, index, error);
                gathered.stats.record_failure(&error);
                gathered.missing.push(index);
            }
        }

        let done = gathered.stats.processed;
        if progress_every > 0 && (done % progress_every == 0 || done == total) {
            log::info!("{}: {}/{} pages", label, done, total);
        }
    }

    gathered.missing.sort_unstable();
    gathered
}
