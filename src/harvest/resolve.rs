//! Per-query resolution strategy.
//!
//! Tries each classification in order. `NotFound` moves on to the next
//! classification; any failure stops immediately and leaves the query
//! unresolved.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::harvest::FetchOutcome;
use crate::models::{Classification, Coordinates};

/// Resolves an address under one classification.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(
        &self,
        address: &str,
        classification: Classification,
    ) -> FetchOutcome<Coordinates>;
}

/// Why a query produced no coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    /// Blank query; nothing was fetched
    EmptyQuery,
    /// Every classification answered "not found"
    NotFound,
    /// A fetch failed; remaining classifications were not tried
    Failed(FetchError),
}

/// Terminal state of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        coordinates: Coordinates,
        classification: Classification,
    },
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Resolved { coordinates, .. } => Some(*coordinates),
            Self::Unresolved(_) => None,
        }
    }

    pub fn classification(&self) -> Option<Classification> {
        match self {
            Self::Resolved { classification, .. } => Some(*classification),
            Self::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Ordered classification fallback.
#[derive(Debug, Clone)]
pub struct Resolver {
    classifications: Vec<Classification>,
}

impl Resolver {
    pub fn new(classifications: Vec<Classification>) -> Self {
        Self { classifications }
    }

    /// Resolve one address.
    pub async fn resolve<G>(&self, geocoder: &G, address: &str) -> Resolution
    where
        G: Geocoder + ?Sized,
    {
        let address = address.trim();
        if address.is_empty() {
            log::warn!("[SKIP] empty address");
            return Resolution::Unresolved(UnresolvedReason::EmptyQuery);
        }

        for &classification in &self.classifications {
            match geocoder.geocode(address, classification).await {
                FetchOutcome::Found(coordinates) => {
                    log::info!(
                        "[SUCCESS] ({}) -> (x: {}, y: {})",
                        classification,
                        coordinates.x,
                        coordinates.y
                    );
                    return Resolution::Resolved {
                        coordinates,
                        classification,
                    };
                }
                FetchOutcome::NotFound => {
                    log::info!("[INFO] ({}) address not found", classification);
                }
                FetchOutcome::Failed(error) => {
                    log::warn!("[FAIL] ({}) '{}' -> {}", classification, address, error);
                    return Resolution::Unresolved(UnresolvedReason::Failed(error));
                }
            }
        }

        log::warn!("[FINAL_FAIL] '{}' -> not found under any classification", address);
        Resolution::Unresolved(UnresolvedReason::NotFound)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(vec![Classification::Road, Classification::Parcel])
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Scripted geocoder recording every call.
    pub(crate) struct ScriptedGeocoder {
        answers: HashMap<(String, Classification), FetchOutcome<Coordinates>>,
        pub calls: Mutex<Vec<(String, Classification)>>,
    }

    impl ScriptedGeocoder {
        pub fn new() -> Self {
            Self {
                answers: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn answer(
            mut self,
            address: &str,
            classification: Classification,
            outcome: FetchOutcome<Coordinates>,
        ) -> Self {
            self.answers
                .insert((address.to_string(), classification), outcome);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Geocoder for ScriptedGeocoder {
        async fn geocode(
            &self,
            address: &str,
            classification: Classification,
        ) -> FetchOutcome<Coordinates> {
            self.calls
                .lock()
                .unwrap()
                .push((address.to_string(), classification));
            self.answers
                .get(&(address.to_string(), classification))
                .cloned()
                .unwrap_or(FetchOutcome::NotFound)
        }
    }

    #[tokio::test]
    async fn test_primary_classification_returns_coordinates_unchanged() {
        let point = Coordinates::new(126.9779692, 37.566535);
        let geocoder = ScriptedGeocoder::new().answer(
            "서울특별시 중구 세종대로 110",
            Classification::Road,
            FetchOutcome::Found(point),
        );

        let resolution = Resolver::default()
            .resolve(&geocoder, "서울특별시 중구 세종대로 110")
            .await;

        assert_eq!(resolution.coordinates(), Some(point));
        assert_eq!(resolution.classification(), Some(Classification::Road));
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_not_found_falls_back_exactly_once() {
        let point = Coordinates::new(127.0, 37.5);
        let geocoder = ScriptedGeocoder::new().answer(
            "서울 중구 태평로1가 31",
            Classification::Parcel,
            FetchOutcome::Found(point),
        );

        let resolution = Resolver::default()
            .resolve(&geocoder, "서울 중구 태평로1가 31")
            .await;

        assert_eq!(resolution.classification(), Some(Classification::Parcel));
        let calls = geocoder.calls.lock().unwrap().clone();
        assert_eq!(
            calls.iter().map(|(_, c)| *c).collect::<Vec<_>>(),
            vec![Classification::Road, Classification::Parcel]
        );
    }

    #[tokio::test]
    async fn test_not_found_everywhere_is_unresolved_not_error() {
        let geocoder = ScriptedGeocoder::new();
        let resolution = Resolver::default().resolve(&geocoder, "없는 주소").await;

        assert_eq!(
            resolution,
            Resolution::Unresolved(UnresolvedReason::NotFound)
        );
        assert_eq!(resolution.coordinates(), None);
        assert_eq!(geocoder.call_count(), 2);
    }

    #[tokio::test]
    async fn test_api_error_stops_without_fallback() {
        let geocoder = ScriptedGeocoder::new().answer(
            "서울 어딘가",
            Classification::Road,
            FetchOutcome::Failed(FetchError::api("INVALID_KEY", "등록되지 않은 인증키")),
        );

        let resolution = Resolver::default().resolve(&geocoder, "서울 어딘가").await;

        assert!(matches!(
            resolution,
            Resolution::Unresolved(UnresolvedReason::Failed(FetchError::Api { .. }))
        ));
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_network_error_stops_without_fallback() {
        let geocoder = ScriptedGeocoder::new().answer(
            "서울 어딘가",
            Classification::Road,
            FetchOutcome::Failed(FetchError::Network("connection reset".into())),
        );

        let resolution = Resolver::default().resolve(&geocoder, "서울 어딘가").await;

        assert!(!resolution.is_resolved());
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_address_is_skipped() {
        let geocoder = ScriptedGeocoder::new();
        let resolution = Resolver::default().resolve(&geocoder, "   ").await;

        assert_eq!(
            resolution,
            Resolution::Unresolved(UnresolvedReason::EmptyQuery)
        );
        assert_eq!(geocoder.call_count(), 0);
    }
}
