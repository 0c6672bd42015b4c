// src/services/vworld.rs

//! VWorld address geocoding and place search clients.
//!
//! Both endpoints wrap their payload in `{"response": {"status": ...}}` where
//! `status` is `OK`, `NOT_FOUND` or `ERROR`. Numbers are usually encoded as
//! strings.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, FetchError, Result};
use crate::harvest::{FetchOutcome, Geocoder, PageSource, RetryPolicy};
use crate::models::{
    Classification, Coordinates, GeocodeConfig, Page, SearchConfig, SearchItem, lenient_u64,
};
use crate::utils::http::get_text;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    status: String,
    #[serde(default)]
    result: Option<AddressResult>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct AddressResult {
    #[serde(default)]
    point: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    page: Option<Counter>,
    #[serde(default)]
    record: Option<Counter>,
    #[serde(default)]
    result: Option<SearchResult>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Counter {
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    items: Option<Vec<RawSearchItem>>,
}

#[derive(Debug, Deserialize)]
struct RawSearchItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    address: Option<RawAddress>,
    #[serde(default)]
    point: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawAddress {
    #[serde(default)]
    road: Option<String>,
}

fn lenient_opt_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    lenient_u64(deserializer).map(Some)
}

/// Build the API error for a non-OK, non-NOT_FOUND status.
fn api_error(status: &str, error: Option<ApiErrorBody>) -> FetchError {
    let error = error.unwrap_or_default();
    FetchError::api(
        error.code.unwrap_or_else(|| status.to_string()),
        error.text.unwrap_or_else(|| "Unknown API Error".to_string()),
    )
}

/// Interpret a point object. Missing or blank coordinates mean "not found".
fn parse_point(point: Option<&Value>) -> FetchOutcome<Coordinates> {
    let Some(point) = point.filter(|p| !p.is_null()) else {
        return FetchOutcome::NotFound;
    };

    let blank = |v: Option<&Value>| match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    };
    if blank(point.get("x")) || blank(point.get("y")) {
        return FetchOutcome::NotFound;
    }

    match Coordinates::deserialize(point) {
        Ok(coordinates) => FetchOutcome::Found(coordinates),
        Err(e) => FetchOutcome::Failed(FetchError::malformed(format!("invalid point: {e}"))),
    }
}

/// Parse a `getcoord` response body.
pub fn parse_address_response(body: &str) -> FetchOutcome<Coordinates> {
    let envelope: Envelope<AddressResponse> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => return FetchOutcome::Failed(e.into()),
    };
    let response = envelope.response;

    match response.status.as_str() {
        "OK" => {
            let point = response.result.as_ref().and_then(|r| r.point.as_ref());
            let outcome = parse_point(point);
            if matches!(outcome, FetchOutcome::NotFound) {
                log::debug!("status OK but no coordinates in response");
            }
            outcome
        }
        "NOT_FOUND" => FetchOutcome::NotFound,
        status => FetchOutcome::Failed(api_error(status, response.error)),
    }
}

/// Parse one page of a place search response.
pub fn parse_search_response(body: &str, index: u32) -> FetchOutcome<Page<SearchItem>> {
    let envelope: Envelope<SearchResponse> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => return FetchOutcome::Failed(e.into()),
    };
    let response = envelope.response;

    match response.status.as_str() {
        "OK" => {}
        "NOT_FOUND" => return FetchOutcome::NotFound,
        status => return FetchOutcome::Failed(api_error(status, response.error)),
    }

    let items = response
        .result
        .and_then(|r| r.items)
        .unwrap_or_default()
        .into_iter()
        .map(|raw| SearchItem {
            title: raw.title.unwrap_or_else(|| "N/A".to_string()),
            road_address: raw.address.and_then(|a| a.road).unwrap_or_default(),
            point: parse_point(raw.point.as_ref()).found(),
        })
        .collect();

    let mut page = Page::new(index, items);
    page.total_pages = response
        .page
        .and_then(|p| p.total)
        .map(|total| u32::try_from(total).unwrap_or(u32::MAX));
    page.total_records = response.record.and_then(|r| r.total);
    FetchOutcome::Found(page)
}

/// Client for the VWorld address-to-coordinate endpoint.
pub struct VworldGeocoder {
    client: Client,
    endpoint: Url,
    key: String,
    crs: String,
    policy: RetryPolicy,
}

impl VworldGeocoder {
    pub fn new(client: Client, config: &GeocodeConfig, key: &str, policy: RetryPolicy) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| AppError::config(format!("geocode.endpoint: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            key: key.to_string(),
            crs: config.crs.clone(),
            policy,
        })
    }

    fn request_url(&self, address: &str, classification: Classification) -> String {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("service", "address")
            .append_pair("request", "getcoord")
            .append_pair("version", "2.0")
            .append_pair("key", &self.key)
            .append_pair("format", "json")
            .append_pair("errorFormat", "json")
            .append_pair("type", classification.as_str())
            .append_pair("address", address)
            .append_pair("refine", "true")
            .append_pair("simple", "false")
            .append_pair("crs", &self.crs);
        url.to_string()
    }
}

#[async_trait]
impl Geocoder for VworldGeocoder {
    async fn geocode(
        &self,
        address: &str,
        classification: Classification,
    ) -> FetchOutcome<Coordinates> {
        let url = self.request_url(address, classification);
        let label = format!("getcoord ({classification})");
        match get_text(&self.client, &url, &label, &self.policy).await {
            Ok(body) => parse_address_response(&body),
            Err(error) => FetchOutcome::Failed(error),
        }
    }
}

/// Paginated place search for a single keyword.
pub struct VworldPlaceSearch {
    client: Client,
    endpoint: Url,
    key: String,
    query: String,
    bbox: String,
    crs: String,
    page_size: u32,
    policy: RetryPolicy,
}

impl VworldPlaceSearch {
    pub fn new(
        client: Client,
        config: &SearchConfig,
        key: &str,
        query: &str,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| AppError::config(format!("search.endpoint: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            key: key.to_string(),
            query: query.to_string(),
            bbox: config.bbox.clone(),
            crs: config.crs.clone(),
            page_size: config.page_size,
            policy,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    fn request_url(&self, page: u32) -> String {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("service", "search")
            .append_pair("request", "search")
            .append_pair("version", "2.0")
            .append_pair("query", &self.query)
            .append_pair("type", "place")
            .append_pair("format", "json")
            .append_pair("errorformat", "json")
            .append_pair("key", &self.key)
            .append_pair("bbox", &self.bbox)
            .append_pair("crs", &self.crs)
            .append_pair("size", &self.page_size.to_string())
            .append_pair("page", &page.to_string());
        url.to_string()
    }
}

#[async_trait]
impl PageSource for VworldPlaceSearch {
    type Item = SearchItem;

    fn label(&self) -> String {
        format!("[{}]", self.query)
    }

    async fn fetch_page(&self, index: u32) -> FetchOutcome<Page<SearchItem>> {
        let url = self.request_url(index);
        let label = format!("search [{}] page {}", self.query, index);
        match get_text(&self.client, &url, &label, &self.policy).await {
            Ok(body) => parse_search_response(&body, index),
            Err(error) => FetchOutcome::Failed(error),
        }
    }
}
