// src/pipeline/geocode.rs

//! Address geocoding job.

use std::time::Duration;

use chrono::Utc;

use crate::config::load_credential;
use crate::error::{AppError, Result};
use crate::harvest::{Geocoder, HarvestStats, Resolution, Resolver, RetryPolicy, UnresolvedReason};
use crate::models::{Config, GeocodeConfig, Table};
use crate::services::VworldGeocoder;
use crate::storage::TableStorage;
use crate::utils::http::create_client;
use crate::utils::report;

use super::{JobReport, save_table};

pub const LONGITUDE_COLUMN: &str = "longitude";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const CLASSIFICATION_COLUMN: &str = "classification";

/// Run the geocoding job against the VWorld address API.
pub async fn run_geocode(config: &Config, storage: &dyn TableStorage) -> Result<JobReport> {
    let settings = &config.geocode;
    let mut job = JobReport::new("geocode", Utc::now());
    report::header("Geocoding addresses");

    let key = load_credential(storage.path(&settings.credential_file)).await?;
    let input = storage.read_table(&settings.input).await?;
    report::sub_item(&format!(
        "{} rows from {} (column '{}', {})",
        input.len(),
        settings.input,
        settings.address_column,
        settings.crs
    ));

    let client = create_client(&config.http)?;
    let geocoder = VworldGeocoder::new(
        client,
        settings,
        &key,
        RetryPolicy::from(&config.http.retry),
    )?;

    let (output, stats) = geocode_table(&input, settings, &geocoder).await?;

    job.rows = output.len();
    job.stats = stats;
    job.output = save_table(storage, &settings.output, &output, job.job).await?;
    job.finished_at = Utc::now();
    job.log_summary();
    Ok(job)
}

/// Resolve every row of `input` and build the output table.
///
/// The output has exactly one row per input row, in input order. Unresolved
/// rows get empty coordinate cells.
pub async fn geocode_table<G>(
    input: &Table,
    settings: &GeocodeConfig,
    geocoder: &G,
) -> Result<(Table, HarvestStats)>
where
    G: Geocoder + ?Sized,
{
    let address_idx = input.column_index(&settings.address_column).ok_or_else(|| {
        AppError::config(format!(
            "address column '{}' not found in input (columns: {})",
            settings.address_column,
            input.columns.join(", ")
        ))
    })?;

    let base = if settings.output_columns.is_empty() {
        input.clone()
    } else {
        let (selected, kept) = input.select(&settings.output_columns);
        if kept.is_empty() {
            log::warn!(
                "none of the output columns ({}) are in the input, keeping all columns",
                settings.output_columns.join(", ")
            );
            input.clone()
        } else {
            for name in &settings.output_columns {
                if !kept.contains(name) {
                    log::warn!("output column '{}' not in input, skipped", name);
                }
            }
            selected
        }
    };

    let mut columns = base.columns.clone();
    columns.push(LONGITUDE_COLUMN.to_string());
    columns.push(LATITUDE_COLUMN.to_string());
    if settings.annotate_classification {
        columns.push(CLASSIFICATION_COLUMN.to_string());
    }
    let mut output = Table::new(columns);

    let resolver = Resolver::new(settings.classifications.clone());
    let delay = Duration::from_millis(settings.request_delay_ms);
    let total = input.len();
    let mut stats = HarvestStats::default();
    let mut fetched_any = false;

    for (i, (row, base_row)) in input.rows.iter().zip(&base.rows).enumerate() {
        let address = row[address_idx].as_str();
        log::info!("[{} / {}] {}", i + 1, total, address.trim());

        let blank = address.trim().is_empty();
        if fetched_any && !blank && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        fetched_any |= !blank;

        let resolution = resolver.resolve(geocoder, address).await;
        stats.processed += 1;
        match &resolution {
            Resolution::Resolved { .. } => stats.resolved += 1,
            Resolution::Unresolved(UnresolvedReason::EmptyQuery) => stats.skipped += 1,
            Resolution::Unresolved(UnresolvedReason::NotFound) => stats.not_found += 1,
            Resolution::Unresolved(UnresolvedReason::Failed(error)) => {
                stats.record_failure(error)
            }
        }

        let mut cells = base_row.clone();
        match resolution.coordinates() {
            Some(point) => {
                cells.push(point.longitude().to_string());
                cells.push(point.latitude().to_string());
            }
            None => {
                cells.push(String::new());
                cells.push(String::new());
            }
        }
        if settings.annotate_classification {
            cells.push(
                resolution
                    .classification()
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_default(),
            );
        }
        output.push_row(cells);
    }

    Ok((output, stats))
}
