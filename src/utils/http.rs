// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::Client;

use crate::error::{FetchError, Result};
use crate::harvest::RetryPolicy;
use crate::models::{HttpConfig, ListingConfig};

/// Create the asynchronous HTTP client used by the API jobs.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    build_client(&config.user_agent, config.timeout_secs)
}

/// Create the client used by the listing crawl (browser User-Agent).
pub fn create_listing_client(config: &ListingConfig) -> Result<Client> {
    build_client(&config.user_agent, config.timeout_secs)
}

fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// GET a URL and return the body text, retrying per `policy`.
///
/// Any non-2xx status is a [`FetchError::Status`]. `label` names the request
/// in retry logs so that URLs carrying credentials are never logged.
pub async fn get_text(
    client: &Client,
    url: &str,
    label: &str,
    policy: &RetryPolicy,
) -> std::result::Result<String, FetchError> {
    policy
        .run(label, move || async move {
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            Ok::<_, FetchError>(response.text().await?)
        })
        .await
}
