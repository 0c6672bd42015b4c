//! Geographic value types returned by the VWorld APIs.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Address classification accepted by the geocoding API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    /// Road-name address (도로명주소)
    Road,
    /// Lot-number address (지번주소)
    Parcel,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Road => "ROAD",
            Self::Parcel => "PARCEL",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved point. `x` is the longitude (or easting), `y` the latitude
/// (or northing), in whatever CRS the request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(deserialize_with = "lenient_f64")]
    pub x: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn longitude(&self) -> f64 {
        self.x
    }

    pub fn latitude(&self) -> f64 {
        self.y
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// VWorld encodes numbers as strings; accept either form.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Like [`lenient_f64`] for counters such as page totals.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as u64),
        NumberOrString::Number(n) => Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {n}"
        ))),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
