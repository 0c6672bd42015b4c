// src/config.rs

//! Configuration and credential loading utilities.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file is missing or invalid.
pub fn load_config(path: &Path) -> Config {
    Config::load_or_default(path)
}

/// Read an API key: the first line of the file, trimmed.
///
/// An absent, unreadable or blank file is a [`AppError::MissingCredential`].
pub async fn load_credential(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::missing_credential(path, e))?;

    let key = content.lines().next().unwrap_or_default().trim();
    if key.is_empty() {
        return Err(AppError::missing_credential(path, "file is empty"));
    }

    log::debug!("Loaded credential from {}", path.display());
    Ok(key.to_string())
}
