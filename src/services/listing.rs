// src/services/listing.rs

//! FTC franchise listing crawler.
//!
//! Each listing page holds a single HTML table; its `thead` provides the
//! column names and every `tbody tr` one row.

use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, FetchError, Result};
use crate::harvest::{FetchOutcome, RetryPolicy};
use crate::models::{ListingConfig, Table};
use crate::utils::http::get_text;

/// Column appended to every page table.
pub const PAGE_INDEX_COLUMN: &str = "page_index";

/// Pre-parsed selectors for the listing table.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    thead: Selector,
    tbody: Selector,
    header_cell: Selector,
    row: Selector,
    cell: Selector,
}

impl ListingSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            thead: parse_selector("thead")?,
            tbody: parse_selector("tbody")?,
            header_cell: parse_selector("th")?,
            row: parse_selector("tr")?,
            cell: parse_selector("td")?,
        })
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Text of an element with each fragment trimmed, fragments concatenated.
fn compact_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Text of an element trimmed at both ends.
fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parse one listing page into a table with a trailing `page_index` column.
///
/// A page without `thead` or `tbody`, or without rows, has no data. A row
/// whose cell count differs from the header marks the page malformed.
pub fn parse_listing_page(
    html: &str,
    index: u32,
    selectors: &ListingSelectors,
) -> FetchOutcome<Table> {
    let document = Html::parse_document(html);

    let (Some(thead), Some(tbody)) = (
        document.select(&selectors.thead).next(),
        document.select(&selectors.tbody).next(),
    ) else {
        return FetchOutcome::NotFound;
    };

    let columns: Vec<String> = thead.select(&selectors.header_cell).map(compact_text).collect();
    let mut table = Table::new(columns);

    for (position, row) in tbody.select(&selectors.row).enumerate() {
        let cells: Vec<String> = row.select(&selectors.cell).map(trimmed_text).collect();
        if cells.len() != table.columns.len() {
            return FetchOutcome::Failed(FetchError::malformed(format!(
                "row {} has {} cells, header has {}",
                position + 1,
                cells.len(),
                table.columns.len()
            )));
        }
        table.push_row(cells);
    }

    if table.is_empty() {
        return FetchOutcome::NotFound;
    }

    table.add_constant_column(PAGE_INDEX_COLUMN, &index.to_string());
    FetchOutcome::Found(table)
}

/// Fetches and parses listing pages over a shared connection pool.
pub struct ListingCrawler {
    client: Client,
    config: ListingConfig,
    policy: RetryPolicy,
    selectors: ListingSelectors,
}

impl ListingCrawler {
    pub fn new(client: Client, config: &ListingConfig) -> Result<Self> {
        Ok(Self {
            client,
            config: config.clone(),
            policy: RetryPolicy::from(&config.retry),
            selectors: ListingSelectors::new()?,
        })
    }

    /// Random pause drawn from the configured delay range.
    fn jitter(&self) -> Duration {
        let (min, max) = (self.config.min_delay_ms, self.config.max_delay_ms);
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Fetch and parse one page.
    pub async fn fetch_page(&self, index: u32) -> FetchOutcome<Table> {
        let url = self.config.page_url(index);
        let label = format!("listing page {index}");

        let html = match get_text(&self.client, &url, &label, &self.policy).await {
            Ok(html) => html,
            Err(error) => return FetchOutcome::Failed(error),
        };

        let pause = self.jitter();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        parse_listing_page(&html, index, &self.selectors)
    }
}
