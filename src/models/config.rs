//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Classification;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client settings shared by the API jobs
    #[serde(default)]
    pub http: HttpConfig,

    /// Progress reporting settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Address geocoding job
    #[serde(default)]
    pub geocode: GeocodeConfig,

    /// Place search job
    #[serde(default)]
    pub search: SearchConfig,

    /// Open-data table job
    #[serde(default)]
    pub open_data: OpenDataConfig,

    /// Franchise listing crawl job
    #[serde(default)]
    pub listing: ListingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        self.http.retry.validate("http.retry")?;

        if self.geocode.address_column.trim().is_empty() {
            return Err(AppError::validation("geocode.address_column is empty"));
        }
        if self.geocode.classifications.is_empty() {
            return Err(AppError::validation(
                "geocode.classifications must list at least one classification",
            ));
        }

        if self.search.queries.is_empty() {
            return Err(AppError::validation("search.queries is empty"));
        }
        if self.search.page_size == 0 {
            return Err(AppError::validation("search.page_size must be > 0"));
        }

        if self.open_data.service.trim().is_empty() {
            return Err(AppError::validation("open_data.service is empty"));
        }
        if self.open_data.page_size == 0 {
            return Err(AppError::validation("open_data.page_size must be > 0"));
        }
        if self.open_data.columns.is_empty() {
            return Err(AppError::validation("open_data.columns is empty"));
        }

        let listing = &self.listing;
        if !listing.url_template.contains("{page}") {
            return Err(AppError::validation(
                "listing.url_template must contain a {page} placeholder",
            ));
        }
        if listing.start_page == 0 || listing.start_page > listing.end_page {
            return Err(AppError::validation(format!(
                "listing page range {}..={} is invalid",
                listing.start_page, listing.end_page
            )));
        }
        if listing.workers == 0 {
            return Err(AppError::validation("listing.workers must be > 0"));
        }
        if listing.timeout_secs == 0 {
            return Err(AppError::validation("listing.timeout_secs must be > 0"));
        }
        if listing.min_delay_ms > listing.max_delay_ms {
            return Err(AppError::validation(
                "listing.min_delay_ms must not exceed listing.max_delay_ms",
            ));
        }
        listing.retry.validate("listing.retry")?;

        Ok(())
    }
}

/// HTTP client settings for the JSON API jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Transport-level retries (none by default for API calls)
    #[serde(default = "RetryConfig::disabled")]
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retry: RetryConfig::disabled(),
        }
    }
}

/// Transport retry policy settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Backoff before retry `n` is `backoff_factor * 2^(n-1)` seconds
    #[serde(default = "defaults::backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound for a single backoff sleep
    #[serde(default = "defaults::max_backoff")]
    pub max_backoff_secs: u64,

    /// HTTP status codes that trigger a retry
    #[serde(default = "defaults::status_forcelist")]
    pub status_forcelist: Vec<u16>,
}

impl RetryConfig {
    /// A policy that performs a single attempt.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn validate(&self, section: &str) -> Result<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(AppError::validation(format!(
                "{section}.backoff_factor must be a non-negative number"
            )));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            backoff_factor: defaults::backoff_factor(),
            max_backoff_secs: defaults::max_backoff(),
            status_forcelist: defaults::status_forcelist(),
        }
    }
}

/// Progress reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log periodic progress lines from the concurrent listing crawl
    #[serde(default = "defaults::show_progress")]
    pub show_progress: bool,

    /// For the concurrent crawl, log a progress line every N completed pages
    #[serde(default = "defaults::progress_every")]
    pub progress_every: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            show_progress: defaults::show_progress(),
            progress_every: defaults::progress_every(),
        }
    }
}

/// Address geocoding job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    /// File holding the VWorld API key
    #[serde(default = "defaults::vworld_key_file")]
    pub credential_file: String,

    /// Geocoding endpoint
    #[serde(default = "defaults::geocode_endpoint")]
    pub endpoint: String,

    /// Input table
    #[serde(default = "defaults::geocode_input")]
    pub input: String,

    /// Output table
    #[serde(default = "defaults::geocode_output")]
    pub output: String,

    /// Column holding the address to resolve
    #[serde(default = "defaults::address_column")]
    pub address_column: String,

    /// Input columns to carry into the output (empty keeps all columns)
    #[serde(default = "defaults::open_data_columns")]
    pub output_columns: Vec<String>,

    /// Coordinate reference system requested from the API
    #[serde(default = "defaults::crs")]
    pub crs: String,

    /// Classifications to try, in order
    #[serde(default = "defaults::classifications")]
    pub classifications: Vec<Classification>,

    /// Pause after each query in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Append a `classification` column naming the resolving scheme
    #[serde(default)]
    pub annotate_classification: bool,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            credential_file: defaults::vworld_key_file(),
            endpoint: defaults::geocode_endpoint(),
            input: defaults::geocode_input(),
            output: defaults::geocode_output(),
            address_column: defaults::address_column(),
            output_columns: defaults::open_data_columns(),
            crs: defaults::crs(),
            classifications: defaults::classifications(),
            request_delay_ms: defaults::request_delay(),
            annotate_classification: false,
        }
    }
}

/// Place search job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// File holding the VWorld API key
    #[serde(default = "defaults::vworld_key_file")]
    pub credential_file: String,

    /// Search endpoint
    #[serde(default = "defaults::search_endpoint")]
    pub endpoint: String,

    /// Keywords to search for, processed in order
    #[serde(default = "defaults::search_queries")]
    pub queries: Vec<String>,

    /// Bounding box `min_x,min_y,max_x,max_y`
    #[serde(default = "defaults::seoul_bbox")]
    pub bbox: String,

    /// Coordinate reference system for the bbox and the results
    #[serde(default = "defaults::crs")]
    pub crs: String,

    /// Results per page
    #[serde(default = "defaults::search_page_size")]
    pub page_size: u32,

    /// Titles containing this keyword (any case) are discarded
    #[serde(default = "defaults::exclude_keyword")]
    pub exclude_keyword: String,

    /// Road addresses must contain this substring
    #[serde(default = "defaults::required_region")]
    pub required_region: String,

    /// Output column holding the originating query
    #[serde(default = "defaults::query_column")]
    pub query_column: String,

    /// Output table
    #[serde(default = "defaults::search_output")]
    pub output: String,

    /// Pause between page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Hard cap on pages per query
    #[serde(default)]
    pub max_pages: Option<u32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            credential_file: defaults::vworld_key_file(),
            endpoint: defaults::search_endpoint(),
            queries: defaults::search_queries(),
            bbox: defaults::seoul_bbox(),
            crs: defaults::crs(),
            page_size: defaults::search_page_size(),
            exclude_keyword: defaults::exclude_keyword(),
            required_region: defaults::required_region(),
            query_column: defaults::query_column(),
            output: defaults::search_output(),
            request_delay_ms: defaults::request_delay(),
            max_pages: None,
        }
    }
}

/// Open-data table job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDataConfig {
    /// File holding the open-data API key
    #[serde(default = "defaults::open_data_key_file")]
    pub credential_file: String,

    /// Base URL; requests go to `{base_url}/{key}/json/{service}/{start}/{end}/`
    #[serde(default = "defaults::open_data_base_url")]
    pub base_url: String,

    /// Service name, also the key of the response object
    #[serde(default = "defaults::open_data_service")]
    pub service: String,

    /// Rows per request
    #[serde(default = "defaults::open_data_page_size")]
    pub page_size: u32,

    /// Columns to keep, in output order
    #[serde(default = "defaults::open_data_columns")]
    pub columns: Vec<String>,

    /// Output table
    #[serde(default = "defaults::open_data_output")]
    pub output: String,

    /// Pause between page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Hard cap on pages
    #[serde(default)]
    pub max_pages: Option<u32>,
}

impl Default for OpenDataConfig {
    fn default() -> Self {
        Self {
            credential_file: defaults::open_data_key_file(),
            base_url: defaults::open_data_base_url(),
            service: defaults::open_data_service(),
            page_size: defaults::open_data_page_size(),
            columns: defaults::open_data_columns(),
            output: defaults::open_data_output(),
            request_delay_ms: defaults::request_delay(),
            max_pages: None,
        }
    }
}

/// Franchise listing crawl settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Page URL with a `{page}` placeholder for the 1-based page index
    #[serde(default = "defaults::listing_url_template")]
    pub url_template: String,

    /// First page to fetch
    #[serde(default = "defaults::start_page")]
    pub start_page: u32,

    /// Last page to fetch (inclusive)
    #[serde(default = "defaults::end_page")]
    pub end_page: u32,

    /// Concurrent page fetches
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Browser User-Agent sent to the listing site
    #[serde(default = "defaults::browser_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::listing_timeout")]
    pub timeout_secs: u64,

    /// Lower bound of the randomized per-page delay
    #[serde(default = "defaults::min_delay")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized per-page delay
    #[serde(default = "defaults::max_delay")]
    pub max_delay_ms: u64,

    /// Transport retry policy of the crawl session
    #[serde(default)]
    pub retry: RetryConfig,

    /// Output table
    #[serde(default = "defaults::listing_output")]
    pub output: String,

    /// Return an error after writing if any page is missing
    #[serde(default)]
    pub fail_on_missing_pages: bool,
}

impl ListingConfig {
    /// URL of the given page.
    pub fn page_url(&self, page: u32) -> String {
        self.url_template.replace("{page}", &page.to_string())
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            url_template: defaults::listing_url_template(),
            start_page: defaults::start_page(),
            end_page: defaults::end_page(),
            workers: defaults::workers(),
            user_agent: defaults::browser_user_agent(),
            timeout_secs: defaults::listing_timeout(),
            min_delay_ms: defaults::min_delay(),
            max_delay_ms: defaults::max_delay(),
            retry: RetryConfig::default(),
            output: defaults::listing_output(),
            fail_on_missing_pages: false,
        }
    }
}

mod defaults {
    use crate::models::Classification;

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; geoharvest/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Retry defaults
    pub fn max_retries() -> u32 {
        3
    }
    pub fn backoff_factor() -> f64 {
        0.3
    }
    pub fn max_backoff() -> u64 {
        120
    }
    pub fn status_forcelist() -> Vec<u16> {
        vec![500, 502, 503, 504]
    }

    // Logging defaults
    pub fn show_progress() -> bool {
        true
    }
    pub fn progress_every() -> usize {
        50
    }

    // VWorld defaults
    pub fn vworld_key_file() -> String {
        "key.txt".into()
    }
    pub fn geocode_endpoint() -> String {
        "https://api.vworld.kr/req/address".into()
    }
    pub fn search_endpoint() -> String {
        "https://api.vworld.kr/req/search".into()
    }
    pub fn crs() -> String {
        "EPSG:4326".into()
    }
    pub fn classifications() -> Vec<Classification> {
        vec![Classification::Road, Classification::Parcel]
    }

    // Geocode defaults
    pub fn geocode_input() -> String {
        "seoul_kiosk_list.csv".into()
    }
    pub fn geocode_output() -> String {
        "kiosk_locations_geocoded.csv".into()
    }
    pub fn address_column() -> String {
        "ESBPLCADDR".into()
    }

    // Search defaults
    pub fn search_queries() -> Vec<String> {
        ["우리은행", "농협은행", "신한은행", "하나은행", "기업은행", "국민은행"]
            .into_iter()
            .map(String::from)
            .collect()
    }
    pub fn seoul_bbox() -> String {
        "126.734086,37.413294,127.269311,37.715133".into()
    }
    pub fn search_page_size() -> u32 {
        30
    }
    pub fn exclude_keyword() -> String {
        "ATM".into()
    }
    pub fn required_region() -> String {
        "서울".into()
    }
    pub fn query_column() -> String {
        "bank".into()
    }
    pub fn search_output() -> String {
        "bank_location.csv".into()
    }

    // Open data defaults
    pub fn open_data_key_file() -> String {
        "public_key.txt".into()
    }
    pub fn open_data_base_url() -> String {
        "http://openapi.seoul.go.kr:8088".into()
    }
    pub fn open_data_service() -> String {
        "TbKioskInfo".into()
    }
    pub fn open_data_page_size() -> u32 {
        1000
    }
    pub fn open_data_columns() -> Vec<String> {
        ["MGTNO", "OPNSFTEAMNM", "KIOSKNM", "ESBPLCADDR"]
            .into_iter()
            .map(String::from)
            .collect()
    }
    pub fn open_data_output() -> String {
        "seoul_kiosk_list.csv".into()
    }

    // Listing defaults
    pub fn listing_url_template() -> String {
        "https://franchise.ftc.go.kr/mnu/00013/program/userRqst/list.do?searchCondition=&searchKeyword=&column=brd&selUpjong=21&selIndus=&pageUnit=10&pageIndex={page}".into()
    }
    pub fn start_page() -> u32 {
        1
    }
    pub fn end_page() -> u32 {
        973
    }
    pub fn workers() -> usize {
        10
    }
    pub fn browser_user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn listing_timeout() -> u64 {
        15
    }
    pub fn min_delay() -> u64 {
        500
    }
    pub fn max_delay() -> u64 {
        1500
    }
    pub fn listing_output() -> String {
        "kiosk_외식.csv".into()
    }
}
