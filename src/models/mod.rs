// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod geo;
mod place;
mod table;

// Re-export all public types
pub use config::{
    Config, GeocodeConfig, HttpConfig, ListingConfig, LoggingConfig, OpenDataConfig, RetryConfig,
    SearchConfig,
};
pub(crate) use geo::lenient_u64;
pub use geo::{Classification, Coordinates};
pub use place::{Place, SearchItem};
pub use table::Table;

/// One unit of a paginated remote response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// 1-based page index
    pub index: u32,

    /// Raw items on this page
    pub items: Vec<T>,

    /// Total number of pages, if the source reports it
    pub total_pages: Option<u32>,

    /// Total number of records, if the source reports it
    pub total_records: Option<u64>,
}

impl<T> Page<T> {
    /// A page from a source that does not report totals.
    pub fn new(index: u32, items: Vec<T>) -> Self {
        Self {
            index,
            items,
            total_pages: None,
            total_records: None,
        }
    }

    /// Attach the totals reported by the source.
    pub fn with_totals(mut self, total_pages: u32, total_records: u64) -> Self {
        self.total_pages = Some(total_pages);
        self.total_records = Some(total_records);
        self
    }
}
