// src/pipeline/kiosks.rs

//! Seoul kiosk table download.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use crate::config::load_credential;
use crate::error::Result;
use crate::harvest::{FilterChain, Paginator, RetryPolicy, StopReason};
use crate::models::{Config, Table};
use crate::services::{OpenDataSource, Row};
use crate::storage::TableStorage;
use crate::utils::http::create_client;
use crate::utils::report;

use super::{JobReport, save_table};

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Narrow raw rows to the configured columns that appear in the data.
///
/// Returns `None` when none of the columns is present.
pub fn rows_to_table(rows: &[Row], columns: &[String]) -> Option<Table> {
    let present: Vec<&String> = columns
        .iter()
        .filter(|name| rows.iter().any(|row| row.contains_key(name.as_str())))
        .collect();
    if present.is_empty() {
        return None;
    }

    let mut table = Table::new(present.iter().map(|name| name.as_str()));
    for row in rows {
        table.push_row(
            present
                .iter()
                .map(|name| cell(row.get(name.as_str())))
                .collect(),
        );
    }
    Some(table)
}

/// Download every row of the configured open-data service.
pub async fn run_open_data(config: &Config, storage: &dyn TableStorage) -> Result<JobReport> {
    let settings = &config.open_data;
    let mut job = JobReport::new("kiosks", Utc::now());
    report::header(&format!("Collecting {} rows", settings.service));

    let key = load_credential(storage.path(&settings.credential_file)).await?;
    let client = create_client(&config.http)?;
    let source = OpenDataSource::new(
        client,
        settings,
        &key,
        RetryPolicy::from(&config.http.retry),
    );

    let paginator = Paginator::new(Duration::from_millis(settings.request_delay_ms))
        .with_max_pages(settings.max_pages);
    let harvest = paginator.run(&source, &FilterChain::new()).await;
    if let StopReason::Failed(error) = &harvest.stop {
        report::warn(&format!("{}: stopped early: {}", settings.service, error));
    }
    report::sub_item(&format!("{} rows collected", harvest.items.len()));
    job.stats = harvest.stats;

    if harvest.items.is_empty() {
        report::warn("no rows collected, nothing to save");
    } else {
        match rows_to_table(&harvest.items, &settings.columns) {
            Some(table) => {
                job.rows = table.len();
                job.output = save_table(storage, &settings.output, &table, job.job).await?;
            }
            None => report::warn(&format!(
                "none of the columns {} are present in the response, nothing saved",
                settings.columns.join(", ")
            )),
        }
    }

    job.finished_at = Utc::now();
    job.log_summary();
    Ok(job)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::error::AppError;
    use crate::harvest::{FetchOutcome, PageSource};
    use crate::models::Page;
    use crate::storage::LocalStorage;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn columns() -> Vec<String> {
        ["MGTNO", "OPNSFTEAMNM", "KIOSKNM", "ESBPLCADDR"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn test_only_present_columns_are_kept() {
        let rows = vec![
            row(json!({"MGTNO": "K-1", "KIOSKNM": "발급기", "ESBPLCADDR": "서울 중구", "X": 1})),
            row(json!({"MGTNO": 7, "ESBPLCADDR": null})),
        ];

        let table = rows_to_table(&rows, &columns()).unwrap();
        assert_eq!(table.columns, vec!["MGTNO", "KIOSKNM", "ESBPLCADDR"]);
        assert_eq!(table.rows[0], vec!["K-1", "발급기", "서울 중구"]);
        assert_eq!(table.rows[1], vec!["7", "", ""]);
    }

    #[test]
    fn test_no_configured_column_present() {
        let rows = vec![row(json!({"OTHER": "x"}))];
        assert!(rows_to_table(&rows, &columns()).is_none());
    }

    struct TwoPages;

    #[async_trait]
    impl PageSource for TwoPages {
        type Item = Row;

        fn label(&self) -> String {
            "TbKioskInfo".into()
        }

        async fn fetch_page(&self, index: u32) -> FetchOutcome<Page<Row>> {
            match index {
                1 => FetchOutcome::Found(Page::new(
                    1,
                    vec![
                        row(json!({"MGTNO": "K-1"})),
                        row(json!({"MGTNO": "K-2"})),
                    ],
                )),
                2 => FetchOutcome::Found(Page::new(2, Vec::new())),
                _ => panic!("page {index} must not be requested"),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_page_stops_and_keeps_rows() {
        let harvest = Paginator::default().run(&TwoPages, &FilterChain::new()).await;

        assert_eq!(harvest.stop, StopReason::EmptyPage);
        assert_eq!(harvest.items.len(), 2);
        let table = rows_to_table(&harvest.items, &columns()).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let err = run_open_data(&Config::default(), &storage).await.unwrap_err();
        assert!(matches!(err, AppError::MissingCredential { .. }));
        assert!(!storage.exists("seoul_kiosk_list.csv").await);
    }
}
