//! Remote data sources.
//!
//! - VWorld address geocoding (`VworldGeocoder`)
//! - VWorld place search (`VworldPlaceSearch`)
//! - Seoul open-data tables (`OpenDataSource`)
//! - FTC franchise listing pages (`ListingCrawler`)
//!
//! Each client parses its response in a pure function so that the parsing
//! rules can be tested without a network.

mod listing;
mod open_data;
mod vworld;

pub use listing::{ListingCrawler, ListingSelectors, PAGE_INDEX_COLUMN, parse_listing_page};
pub use open_data::{OpenDataSource, Row, parse_open_data_response};
pub use vworld::{VworldGeocoder, VworldPlaceSearch, parse_address_response, parse_search_response};
