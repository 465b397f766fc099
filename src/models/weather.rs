//! Weather sample and current-conditions models

use serde::{Deserialize, Serialize};

/// Parallel meteorological series handed to a bulletin prompt.
///
/// Daily records come first, followed by hourly records of the last
/// forecast day, so every series has the same length.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct WeatherSample {
    /// Location as typed by the user
    pub location: String,
    /// Temperature in Celsius
    pub temperatures: Vec<f64>,
    /// Relative humidity in percent
    pub humidity: Vec<f64>,
    /// Wind speed in km/h (daily maximum or hourly value)
    pub wind: Vec<f64>,
    /// Cloud cover in percent, absent on daily records
    pub cloud_cover: Vec<Option<f64>>,
    /// UV index
    pub uv: Vec<f64>,
}

impl WeatherSample {
    /// Create an empty sample for a location
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    /// Number of samples per metric
    #[must_use]
    pub fn len(&self) -> usize {
        self.temperatures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }

    /// Append one reading to every series
    pub fn push(&mut self, temperature: f64, humidity: f64, wind: f64, cloud: Option<f64>, uv: f64) {
        self.temperatures.push(temperature);
        self.humidity.push(humidity);
        self.wind.push(wind);
        self.cloud_cover.push(cloud);
        self.uv.push(uv);
    }

    /// Chart labels: one index per sample
    #[must_use]
    pub fn labels(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }
}

/// Current conditions for the interactive weather insight
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// "Name, Region, Country"
    pub location: String,
    pub local_time: Option<String>,
    pub temperature_c: f64,
    pub feels_like_c: Option<f64>,
    pub humidity: f64,
    pub wind_kph: f64,
    pub cloud: Option<f64>,
    pub uv: f64,
    pub condition: String,
    /// Measured air score on the 0-10 scale, when the API reports pollutants
    pub air_score: Option<f64>,
}

impl CurrentConditions {
    /// Short human-readable summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{}: {} with {:.1}°C, humidity {:.0}%, wind {:.1} km/h, UV {:.1}.",
            self.location,
            self.condition,
            self.temperature_c,
            self.humidity,
            self.wind_kph,
            self.uv
        );
        if let Some(air) = self.air_score {
            text.push_str(&format!(" Air quality {air:.1}/10."));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_series_parallel() {
        let mut sample = WeatherSample::new("Recife");
        sample.push(28.0, 80.0, 20.0, None, 9.0);
        sample.push(27.5, 82.0, 18.0, Some(40.0), 0.0);

        assert_eq!(sample.len(), 2);
        assert_eq!(sample.humidity, vec![80.0, 82.0]);
        assert_eq!(sample.cloud_cover, vec![None, Some(40.0)]);
        assert_eq!(sample.labels(), vec![0, 1]);
    }

    #[test]
    fn test_current_conditions_summary() {
        let current = CurrentConditions {
            location: "Fortaleza, Ceara, Brazil".to_string(),
            local_time: None,
            temperature_c: 29.0,
            feels_like_c: Some(32.1),
            humidity: 70.0,
            wind_kph: 22.3,
            cloud: Some(25.0),
            uv: 8.0,
            condition: "Partly cloudy".to_string(),
            air_score: Some(2.4),
        };

        let summary = current.summary();
        assert!(summary.starts_with("Fortaleza, Ceara, Brazil: Partly cloudy"));
        assert!(summary.contains("29.0°C"));
        assert!(summary.ends_with("Air quality 2.4/10."));
    }
}
