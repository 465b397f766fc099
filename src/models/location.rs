//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

/// Key used to deduplicate scored cities ("Name, Region")
#[must_use]
pub fn region_key(name: &str, region: &str) -> String {
    format!("{name}, {region}")
}

/// Resolved location as reported by the weather API
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// City name
    pub name: String,
    /// State or province, may be empty
    pub region: String,
    /// Country name
    pub country: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String, region: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            region,
            country: None,
        }
    }

    /// Create location with country
    #[must_use]
    pub fn with_country(mut self, country: String) -> Self {
        self.country = Some(country);
        self
    }

    /// See [`region_key`]
    #[must_use]
    pub fn region_key(&self) -> String {
        region_key(&self.name, &self.region)
    }

    /// Query string accepted by the weather API for a coordinate lookup
    #[must_use]
    pub fn coordinate_query(latitude: f64, longitude: f64) -> String {
        format!("{latitude},{longitude}")
    }
}
