//! City score records persisted by the scoring batch

use serde::{Deserialize, Serialize};

/// One scored region as stored in the regions JSON file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CityScore {
    pub lat: f64,
    pub lon: f64,
    /// "Name, Region", unique across the file
    pub region: String,
    /// Natural-language description shown on the map
    pub summary: String,
    pub values: ScoreValues,
}

/// Normalized metrics, each rounded to one decimal in [1, 10]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ScoreValues {
    pub heat: f64,
    pub humidity: f64,
    pub wind: f64,
    pub uv: f64,
    pub air: f64,
    pub comfort: f64,
}

impl ScoreValues {
    /// All metrics in storage order
    #[must_use]
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.heat,
            self.humidity,
            self.wind,
            self.uv,
            self.air,
            self.comfort,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_score_json_layout() {
        let score = CityScore {
            lat: -3.72,
            lon: -38.54,
            region: "Fortaleza, Ceara".to_string(),
            summary: "Warm and humid.".to_string(),
            values: ScoreValues {
                heat: 7.8,
                humidity: 7.9,
                wind: 3.1,
                uv: 8.4,
                air: 2.2,
                comfort: 7.4,
            },
        };

        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["region"], "Fortaleza, Ceara");
        assert_eq!(json["values"]["comfort"], 7.4);
        assert_eq!(json["values"].as_object().unwrap().len(), 6);
    }

    #[test]
    fn test_reads_existing_regions_file_entry() {
        let raw = r#"{
            "lat": 51.52, "lon": -0.11, "region": "London, City of London, Greater London",
            "summary": "s", "values": {"heat": 4.1, "humidity": 7.3, "wind": 3.0,
            "uv": 2.1, "air": 3.3, "comfort": 7.1}
        }"#;
        let score: CityScore = serde_json::from_str(raw).unwrap();
        assert_eq!(score.values.as_array()[3], 2.1);
    }
}
