// src/pipeline/validate.rs

use crate::config::load_credential;
use crate::error::Result;
use crate::models::Config;
use crate::storage::TableStorage;
use crate::utils::report;

/// Validate configuration and report credential and input availability.
///
/// Only an invalid configuration is an error; missing credentials and inputs
/// are reported so that the affected jobs can be fixed before running.
pub async fn run_validate(config: &Config, storage: &dyn TableStorage) -> Result<()> {
    report::header("Validating configuration");

    if let Err(e) = config.validate() {
        log::error!("Configuration is invalid: {}", e);
        return Err(e);
    }
    report::success("Configuration is valid");
    report::sub_item(&format!("User-Agent: {}", config.http.user_agent));
    report::sub_item(&format!("Timeout: {}s", config.http.timeout_secs));
    report::sub_item(&format!(
        "Classifications: {}",
        config
            .geocode
            .classifications
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    ));
    report::sub_item(&format!("Search queries: {}", config.search.queries.len()));
    report::sub_item(&format!(
        "Listing pages: {}..={} ({} workers)",
        config.listing.start_page, config.listing.end_page, config.listing.workers
    ));

    let mut credentials = vec![config.geocode.credential_file.as_str()];
    for file in [
        config.search.credential_file.as_str(),
        config.open_data.credential_file.as_str(),
    ] {
        if !credentials.contains(&file) {
            credentials.push(file);
        }
    }
    for file in credentials {
        match load_credential(storage.path(file)).await {
            Ok(_) => report::success(&format!("Credential {} found", file)),
            Err(e) => report::warn(&e.to_string()),
        }
    }

    if storage.exists(&config.geocode.input).await {
        report::success(&format!("Geocode input {} found", config.geocode.input));
    } else {
        report::warn(&format!(
            "Geocode input {} not found (run `kiosks` first)",
            config.geocode.input
        ));
    }

    Ok(())
}
