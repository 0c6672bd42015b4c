// src/pipeline/compose.rs

use crate::error::Result;
use crate::models::Config;
use crate::storage::TableStorage;
use crate::utils::report;

use super::JobReport;
use super::geocode::run_geocode;
use super::kiosks::run_open_data;

/// Download the kiosk table, then geocode it.
///
/// When the download saves nothing and no earlier table exists, geocoding
/// is skipped.
pub async fn run_pipeline(config: &Config, storage: &dyn TableStorage) -> Result<Vec<JobReport>> {
    report::header("Kiosk pipeline");
    let mut reports = Vec::with_capacity(2);

    report::step(1, 2, "Kiosks - Downloading open-data table");
    let kiosks = run_open_data(config, storage).await?;
    let saved = kiosks.output.is_some();
    reports.push(kiosks);

    if !saved && !storage.exists(&config.geocode.input).await {
        report::warn(&format!(
            "{} is not available, skipping geocoding",
            config.geocode.input
        ));
        return Ok(reports);
    }
    if config.open_data.output != config.geocode.input {
        log::info!(
            "geocoding {} (kiosk table was saved as {})",
            config.geocode.input,
            config.open_data.output
        );
    }

    report::step(2, 2, "Geocode - Resolving kiosk addresses");
    reports.push(run_geocode(config, storage).await?);

    report::success("Pipeline complete");
    Ok(reports)
}
