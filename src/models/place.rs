//! Place search items and the records derived from them.

use serde::Serialize;

use crate::models::Coordinates;

/// One raw item of a place search page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    /// Business name
    pub title: String,

    /// Road-name address, empty when the API omits it
    pub road_address: String,

    /// Point, if the API returned one
    pub point: Option<Coordinates>,
}

/// A place that survived filtering and carries coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    /// The search keyword that produced this place
    pub query: String,
    pub title: String,
    pub coordinates: Coordinates,
}

impl Place {
    /// Convert a filtered item into a place; `None` if it has no point.
    pub fn from_item(query: &str, item: SearchItem) -> Option<Self> {
        let coordinates = item.point?;
        Some(Self {
            query: query.to_string(),
            title: item.title,
            coordinates,
        })
    }

    /// Row cells in `query, title, longitude, latitude` order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.query.clone(),
            self.title.clone(),
            self.coordinates.longitude().to_string(),
            self.coordinates.latitude().to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_requires_point() {
        let item = SearchItem {
            title: "우리은행 종로지점".into(),
            road_address: "서울특별시 종로구 종로 1".into(),
            point: None,
        };
        assert!(Place::from_item("우리은행", item).is_none());
    }

    #[test]
    fn test_place_row_keeps_coordinates() {
        let item = SearchItem {
            title: "우리은행 종로지점".into(),
            road_address: "서울특별시 종로구 종로 1".into(),
            point: Some(Coordinates::new(126.9783, 37.5701)),
        };
        let place = Place::from_item("우리은행", item).unwrap();
        assert_eq!(
            place.to_row(),
            vec!["우리은행", "우리은행 종로지점", "126.9783", "37.5701"]
        );
    }
}
