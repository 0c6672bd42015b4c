// src/pipeline/search.rs

//! Place search job: one paginated search per keyword.

use std::time::Duration;

use chrono::Utc;

use crate::config::load_credential;
use crate::error::Result;
use crate::harvest::{
    ExcludeKeyword, FilterChain, HarvestStats, PageSource, Paginator, RequireSubstring,
    RetryPolicy, StopReason,
};
use crate::models::{Config, Place, SearchConfig, SearchItem, Table};
use crate::services::VworldPlaceSearch;
use crate::storage::TableStorage;
use crate::utils::http::create_client;
use crate::utils::report;

use super::{JobReport, save_table};

/// Discard name for items that passed the filters but carry no point.
pub const MISSING_POINT: &str = "missing_point";

/// Filters applied to every search page, in order.
pub fn place_filters(settings: &SearchConfig) -> FilterChain<SearchItem> {
    let mut chain = FilterChain::new();
    if !settings.exclude_keyword.is_empty() {
        chain = chain.with(ExcludeKeyword::new(
            "excluded_keyword",
            &settings.exclude_keyword,
            |item: &SearchItem| item.title.as_str(),
        ));
    }
    if !settings.required_region.is_empty() {
        chain = chain.with(RequireSubstring::new(
            "outside_region",
            &settings.required_region,
            |item: &SearchItem| item.road_address.as_str(),
        ));
    }
    chain
}

/// Harvest one keyword and convert surviving items into places.
pub async fn search_places<S>(
    paginator: &Paginator,
    source: &S,
    query: &str,
    filters: &FilterChain<SearchItem>,
) -> (Vec<Place>, HarvestStats)
where
    S: PageSource<Item = SearchItem> + ?Sized,
{
    let harvest = paginator.run(source, filters).await;
    let mut stats = harvest.stats;

    if let StopReason::Failed(error) = &harvest.stop {
        log::warn!("[{}] stopped early, keeping earlier pages: {}", query, error);
    }

    let mut places = Vec::with_capacity(harvest.items.len());
    for item in harvest.items {
        let title = item.title.clone();
        match Place::from_item(query, item) {
            Some(place) => places.push(place),
            None => {
                log::warn!("[{}] '{}' has no coordinates, skipped", query, title);
                stats.record_filtered(MISSING_POINT);
            }
        }
    }

    log::info!("[{}] {} places kept", query, places.len());
    (places, stats)
}

/// Run the place search job for every configured keyword.
pub async fn run_search(config: &Config, storage: &dyn TableStorage) -> Result<JobReport> {
    let settings = &config.search;
    let mut job = JobReport::new("search", Utc::now());
    report::header("Searching places");

    let key = load_credential(storage.path(&settings.credential_file)).await?;
    let client = create_client(&config.http)?;
    let policy = RetryPolicy::from(&config.http.retry);

    let delay = Duration::from_millis(settings.request_delay_ms);
    let paginator = Paginator::new(delay).with_max_pages(settings.max_pages);
    let filters = place_filters(settings);

    let mut table = Table::new([
        settings.query_column.as_str(),
        "title",
        "longitude",
        "latitude",
    ]);

    for (i, query) in settings.queries.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        report::sub_item(&format!("[{}] searching", query));

        let source = VworldPlaceSearch::new(client.clone(), settings, &key, query, policy.clone())?;
        let (places, stats) = search_places(&paginator, &source, query, &filters).await;

        job.stats.merge(&stats);
        for place in &places {
            table.push_row(place.to_row());
        }
    }

    job.rows = table.len();
    job.output = save_table(storage, &settings.output, &table, job.job).await?;
    job.finished_at = Utc::now();
    job.log_summary();
    Ok(job)
}
