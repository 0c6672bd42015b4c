// src/services/open_data.rs

//! Seoul open-data (`openapi.seoul.go.kr`) row source.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::harvest::{FetchOutcome, PageSource, RetryPolicy};
use crate::models::{OpenDataConfig, Page};
use crate::utils::http::get_text;

/// One raw open-data row.
pub type Row = Map<String, Value>;

/// Result code meaning "no data in the requested range".
const NO_MORE_DATA: &str = "INFO-200";

#[derive(Debug, Deserialize)]
struct ResultCode {
    #[serde(rename = "CODE")]
    code: String,
    #[serde(rename = "MESSAGE", default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ServiceBody {
    #[serde(default)]
    row: Vec<Row>,
    #[serde(rename = "RESULT", default)]
    result: Option<ResultCode>,
}

fn result_outcome<T>(result: ResultCode) -> FetchOutcome<T> {
    if result.code == NO_MORE_DATA {
        FetchOutcome::NotFound
    } else {
        FetchOutcome::Failed(FetchError::api(result.code, result.message))
    }
}

/// Parse one page of a service response.
///
/// The body is keyed by the service name; when the range is past the end the
/// service instead answers with a bare top-level `RESULT`.
pub fn parse_open_data_response(body: &str, service: &str, index: u32) -> FetchOutcome<Page<Row>> {
    let mut root: Map<String, Value> = match serde_json::from_str(body) {
        Ok(root) => root,
        Err(e) => return FetchOutcome::Failed(e.into()),
    };

    if let Some(payload) = root.remove(service) {
        let body: ServiceBody = match serde_json::from_value(payload) {
            Ok(body) => body,
            Err(e) => return FetchOutcome::Failed(e.into()),
        };
        if body.row.is_empty() {
            if let Some(result) = body.result.filter(|r| r.code != "INFO-000") {
                return result_outcome(result);
            }
        }
        return FetchOutcome::Found(Page::new(index, body.row));
    }

    match root.remove("RESULT").map(serde_json::from_value::<ResultCode>) {
        Some(Ok(result)) => result_outcome(result),
        Some(Err(e)) => FetchOutcome::Failed(e.into()),
        None => FetchOutcome::Failed(FetchError::malformed(format!(
            "response has neither '{service}' nor 'RESULT'"
        ))),
    }
}

/// Pages through a Seoul open-data service, `page_size` rows at a time.
pub struct OpenDataSource {
    client: Client,
    base_url: String,
    key: String,
    service: String,
    page_size: u32,
    policy: RetryPolicy,
}

impl OpenDataSource {
    pub fn new(client: Client, config: &OpenDataConfig, key: &str, policy: RetryPolicy) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            service: config.service.clone(),
            page_size: config.page_size,
            policy,
        }
    }

    /// Inclusive 1-based row range for a page.
    pub fn row_range(&self, index: u32) -> (u64, u64) {
        let size = u64::from(self.page_size);
        let start = u64::from(index.saturating_sub(1)) * size + 1;
        (start, start + size - 1)
    }

    fn request_url(&self, index: u32) -> String {
        let (start, end) = self.row_range(index);
        format!(
            "{}/{}/json/{}/{}/{}/",
            self.base_url, self.key, self.service, start, end
        )
    }
}

#[async_trait]
impl PageSource for OpenDataSource {
    type Item = Row;

    fn label(&self) -> String {
        self.service.clone()
    }

    async fn fetch_page(&self, index: u32) -> FetchOutcome<Page<Row>> {
        let (start, end) = self.row_range(index);
        log::info!("{}: rows {}-{}", self.service, start, end);

        let url = self.request_url(index);
        let label = format!("{} rows {}-{}", self.service, start, end);
        match get_text(&self.client, &url, &label, &self.policy).await {
            Ok(body) => parse_open_data_response(&body, &self.service, index),
            Err(error) => FetchOutcome::Failed(error),
        }
    }
}
