//! Harvesting building blocks.
//!
//! - `retry`: transport retry policy (attempts, backoff, retryable statuses)
//! - `resolve`: per-query classification fallback
//! - `paginate`: sequential pagination driver
//! - `filter`: ordered, short-circuiting item filters
//! - `pool`: bounded concurrent page fetching
//!
//! Each layer only sees [`FetchOutcome`] values from the layer below.

mod filter;
mod outcome;
mod paginate;
mod pool;
mod resolve;
mod retry;
mod stats;

pub use filter::{ExcludeKeyword, FilterChain, ItemFilter, RequireSubstring};
pub use outcome::FetchOutcome;
pub use paginate::{Harvest, PageSource, Paginator, StopReason};
pub use pool::{Gathered, gather_pages};
pub use resolve::{Geocoder, Resolution, Resolver, UnresolvedReason};
pub use retry::RetryPolicy;
pub use stats::HarvestStats;

#[cfg(test)]
pub(crate) use resolve::tests::ScriptedGeocoder;
