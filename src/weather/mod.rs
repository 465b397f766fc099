//! Weather API client for `WeatherAPI.com`
//!
//! Every call is a single GET with no retry; transport and API errors are
//! returned to the caller unchanged.

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::WeatherConfig;
use crate::models::{CurrentConditions, Location, WeatherSample};
use crate::{CityScienceError, Result};

pub mod weatherapi;

pub use weatherapi::ForecastResponse;

/// Async client for the forecast and current-conditions endpoints
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    bulletin_days: u32,
    max_samples: usize,
}

impl WeatherApiClient {
    /// Create a new weather API client
    pub fn new(config: &WeatherConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("cityscience/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bulletin_days: config.bulletin_days,
            max_samples: config.max_samples,
        })
    }

    /// Fetch a multi-day forecast, optionally with hourly air quality
    #[instrument(skip(self))]
    pub async fn forecast(&self, query: &str, days: u32, air_quality: bool) -> Result<ForecastResponse> {
        let url = format!(
            "{}/forecast.json?key={}&q={}&days={}&aqi={}&alerts=no",
            self.base_url,
            self.api_key,
            urlencoding::encode(query),
            days,
            if air_quality { "yes" } else { "no" }
        );
        self.fetch(&url, query).await
    }

    /// Series used by bulletin prompts
    pub async fn bulletin_sample(&self, city: &str) -> Result<WeatherSample> {
        let response = self.forecast(city, self.bulletin_days, false).await?;
        let sample = WeatherSample::from_forecast(city, &response, self.max_samples)?;
        debug!("Built {} samples per metric for '{}'", sample.len(), city);
        Ok(sample)
    }

    /// Current conditions plus measured air quality for one place
    pub async fn current_conditions(&self, city: &str) -> Result<CurrentConditions> {
        let response = self.forecast(city, 1, true).await?;
        CurrentConditions::from_response(&response)
    }

    /// Resolve coordinates to the nearest named place
    #[instrument(skip(self))]
    pub async fn lookup_coordinates(&self, latitude: f64, longitude: f64) -> Result<Location> {
        let query = Location::coordinate_query(latitude, longitude);
        let url = format!(
            "{}/current.json?key={}&q={}&aqi=no",
            self.base_url,
            self.api_key,
            urlencoding::encode(&query)
        );
        let response = self.fetch(&url, &query).await?;
        Ok(Location::from(&response.location))
    }

    async fn fetch(&self, url: &str, query: &str) -> Result<ForecastResponse> {
        let start_time = Instant::now();
        debug!("Requesting weather for '{}'", query);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<weatherapi::ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            warn!("Weather API rejected '{}': {}", query, message);
            return Err(CityScienceError::api(format!("{query}: {message}")));
        }

        let forecast: ForecastResponse = response.json().await.map_err(|e| {
            CityScienceError::api(format!(
                "Invalid weather data received for '{query}': {}",
                e.without_url()
            ))
        })?;

        let elapsed = start_time.elapsed();
        info!(
            "Weather for '{}' resolved to {}, {} in {:.3}s",
            query,
            forecast.location.name,
            forecast.location.region,
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!("Slow weather API response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(forecast)
    }
}
