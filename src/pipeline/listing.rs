// src/pipeline/listing.rs

//! FTC franchise listing crawl.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::harvest::{Gathered, gather_pages};
use crate::models::{Config, Table};
use crate::services::{ListingCrawler, PAGE_INDEX_COLUMN};
use crate::storage::TableStorage;
use crate::utils::http::create_listing_client;
use crate::utils::report;

use super::{JobReport, progress_every, save_table};

/// Concatenate page tables in the order they were gathered.
pub fn assemble_listing(pages: Vec<(u32, Table)>) -> Table {
    let mut table = Table::default();
    for (_, page) in pages {
        table.append(page);
    }
    table
}

fn distinct_pages(table: &Table) -> usize {
    let Some(idx) = table.column_index(PAGE_INDEX_COLUMN) else {
        return 0;
    };
    table
        .rows
        .iter()
        .map(|row| row[idx].as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

fn describe_missing(gathered: &Gathered<Table>) -> String {
    const SHOWN: usize = 20;
    let mut listed: Vec<String> = gathered
        .missing
        .iter()
        .take(SHOWN)
        .map(u32::to_string)
        .collect();
    if gathered.missing.len() > SHOWN {
        listed.push(format!("… {} more", gathered.missing.len() - SHOWN));
    }
    listed.join(", ")
}

/// Crawl the configured page range with a bounded worker pool.
///
/// Pages that fail or hold no table are logged and left out. With
/// `fail_on_missing_pages`, the partial table is still written before the
/// job reports [`AppError::IncompleteHarvest`].
pub async fn run_listing(config: &Config, storage: &dyn TableStorage) -> Result<JobReport> {
    let settings = &config.listing;
    let mut job = JobReport::new("listing", Utc::now());
    report::header("Crawling franchise listing");
    report::sub_item(&format!(
        "pages {}..={} with {} workers",
        settings.start_page, settings.end_page, settings.workers
    ));

    let client = create_listing_client(settings)?;
    let crawler = ListingCrawler::new(client, settings)?;

    let indices: Vec<u32> = (settings.start_page..=settings.end_page).collect();
    let gathered = gather_pages(
        "listing",
        indices,
        settings.workers,
        progress_every(&config.logging),
        |index| crawler.fetch_page(index),
    )
    .await;

    let requested = gathered.requested();
    report::sub_item(&format!(
        "pages collected: {}/{}",
        gathered.pages.len(),
        requested
    ));
    if !gathered.missing.is_empty() {
        report::warn(&format!(
            "{} pages without data: {}",
            gathered.missing.len(),
            describe_missing(&gathered)
        ));
    }

    let missing = gathered.missing.len();
    job.stats = gathered.stats;
    let table = assemble_listing(gathered.pages);
    report::sub_item(&format!(
        "{} rows from {} distinct pages",
        table.len(),
        distinct_pages(&table)
    ));

    job.rows = table.len();
    job.output = save_table(storage, &settings.output, &table, job.job).await?;
    job.finished_at = Utc::now();
    job.log_summary();

    if missing > 0 && settings.fail_on_missing_pages {
        return Err(AppError::IncompleteHarvest {
            job: job.job.to_string(),
            missing,
            total: requested,
        });
    }
    Ok(job)
}
