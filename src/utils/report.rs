// src/utils/report.rs

//! Console report helpers layered on the `log` facade.
//!
//! Used by the pipelines for headers, indented detail lines and the final
//! run summary.

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a success message
pub fn success(message: &str) {
    log::info!("✓ {}", message);
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {}", message);
}

/// Log a summary section
pub fn summary<K, V>(title: &str, items: &[(K, V)])
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key.as_ref(), value.as_ref());
    }
}

/// Log a numbered pipeline step
pub fn step(current: usize, total: usize, message: &str) {
    log::info!("[{}/{}] {}", current, total, message);
}

/// Log a warning with a marker
pub fn warn(message: &str) {
    log::warn!("⚠ {}", message);
}
