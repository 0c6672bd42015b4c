//! Pipeline entry points for harvesting jobs.
//!
//! - `run_geocode`: Resolve an address column to coordinates
//! - `run_search`: Collect filtered place search results per keyword
//! - `run_open_data`: Download the Seoul kiosk table
//! - `run_listing`: Crawl the FTC franchise listing
//! - `run_pipeline`: `run_open_data` then `run_geocode`
//! - `run_validate`: Check configuration and credentials without network

pub mod compose;
pub mod geocode;
pub mod kiosks;
pub mod listing;
pub mod search;
pub mod validate;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::harvest::HarvestStats;
use crate::models::Table;
use crate::storage::{TableStorage, WriteMetadata};
use crate::utils::report;

pub use compose::run_pipeline;
pub use geocode::{geocode_table, run_geocode};
pub use kiosks::{rows_to_table, run_open_data};
pub use listing::{assemble_listing, run_listing};
pub use search::{place_filters, run_search, search_places};
pub use validate::run_validate;

/// Outcome of one job run.
#[derive(Debug)]
pub struct JobReport {
    pub job: &'static str,
    pub stats: HarvestStats,
    /// Rows in the result table
    pub rows: usize,
    /// Set when a file was written
    pub output: Option<WriteMetadata>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    fn new(job: &'static str, started_at: DateTime<Utc>) -> Self {
        Self {
            job,
            stats: HarvestStats::default(),
            rows: 0,
            output: None,
            started_at,
            finished_at: started_at,
        }
    }

    /// Log the run summary.
    pub fn log_summary(&self) {
        let mut items = self.stats.summary_items();
        items.push(("rows".to_string(), self.rows.to_string()));
        match &self.output {
            Some(meta) => items.push(("output".to_string(), meta.path.display().to_string())),
            None => items.push(("output".to_string(), "(none)".to_string())),
        }
        let elapsed = self.finished_at - self.started_at;
        items.push((
            "elapsed".to_string(),
            format!("{:.1}s", elapsed.num_milliseconds() as f64 / 1000.0),
        ));
        report::summary(self.job, &items);
    }
}

/// Write `table` unless it is empty, in which case nothing is written and the
/// reason is logged.
async fn save_table(
    storage: &dyn TableStorage,
    key: &str,
    table: &Table,
    job: &str,
) -> Result<Option<WriteMetadata>> {
    if table.is_empty() {
        report::warn(&format!("{job}: no rows collected, {key} not written"));
        return Ok(None);
    }

    let meta = storage.write_table(key, table).await?;
    report::success(&format!(
        "{job}: saved {} rows to {} at {}",
        meta.rows,
        meta.path.display(),
        meta.timestamp.format("%Y-%m-%d %H:%M:%S")
    ));
    Ok(Some(meta))
}

/// Progress interval for pool logging, or 0 when progress is disabled.
fn progress_every(config: &crate::models::LoggingConfig) -> usize {
    if config.show_progress {
        config.progress_every
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoggingConfig;

    #[test]
    fn test_progress_every_respects_show_progress() {
        let mut logging = LoggingConfig {
            show_progress: true,
            progress_every: 25,
        };
        assert_eq!(progress_every(&logging), 25);

        logging.show_progress = false;
        assert_eq!(progress_every(&logging), 0);
    }
}
