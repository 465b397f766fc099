//! City quality scoring
//!
//! Raw forecast averages are mapped onto a 1-10 scale with clamped linear
//! min-max normalization, rounded to one decimal.

use rand::{Rng, RngExt};

use crate::models::{CityScore, ScoreValues};
use crate::weather::weatherapi::{ForecastDay, ForecastResponse};
use crate::{CityScienceError, Result};

pub mod air_quality;

pub use air_quality::{AirEstimate, estimate_air_quality, hourly_air_score, measured_air_score};

/// Normalization bounds per metric
pub const HEAT_RANGE: (f64, f64) = (-10.0, 40.0);
pub const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
pub const WIND_RANGE: (f64, f64) = (0.0, 100.0);
pub const UV_RANGE: (f64, f64) = (0.0, 11.0);
pub const AIR_RANGE: (f64, f64) = (0.0, 10.0);
pub const COMFORT_RANGE: (f64, f64) = (0.0, 10.0);

/// Cloud cover assumed when the first forecast day has no hourly records
const DEFAULT_CLOUD: f64 = 50.0;

/// Clamp `value` into `[min, max]` and rescale linearly onto `[1, 10]`.
///
/// Fails when the range is empty or any argument is not finite.
pub fn normalize(value: f64, min: f64, max: f64) -> Result<f64> {
    if !(value.is_finite() && min.is_finite() && max.is_finite()) || min >= max {
        return Err(CityScienceError::InvalidRange { min, max });
    }
    let clamped = value.clamp(min, max);
    let scaled = 1.0 + (clamped - min) * 9.0 / (max - min);
    Ok(round_one_decimal(scaled))
}

#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Comfort on the 1-10 scale: clouds and wind each remove up to 5 points
pub fn comfort_score(avg_cloud: f64, avg_wind: f64) -> Result<f64> {
    let raw = 10.0 - (avg_cloud / 10.0).min(10.0) * 0.5 - (avg_wind / 10.0).min(10.0) * 0.5;
    normalize(raw, COMFORT_RANGE.0, COMFORT_RANGE.1)
}

/// Averages over every forecast day of a location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastAverages {
    /// Mean of daily average temperatures in °C
    pub temperature: f64,
    /// Mean of daily average humidity in %
    pub humidity: f64,
    /// Mean of daily maximum wind in km/h
    pub wind: f64,
    pub uv: f64,
    /// Mean hourly cloud cover of the first day in %
    pub cloud: f64,
}

impl ForecastAverages {
    pub fn from_days(days: &[ForecastDay]) -> Result<Self> {
        let Some(first) = days.first() else {
            return Err(CityScienceError::api("Forecast contains no days"));
        };
        let count = days.len() as f64;
        let mean = |f: fn(&ForecastDay) -> f64| days.iter().map(f).sum::<f64>() / count;

        let clouds: Vec<f64> = first
            .hour
            .iter()
            .map(|h| h.cloud.unwrap_or(0.0))
            .collect();
        let cloud = if clouds.is_empty() {
            DEFAULT_CLOUD
        } else {
            clouds.iter().sum::<f64>() / clouds.len() as f64
        };

        Ok(Self {
            temperature: mean(|d| d.day.avgtemp_c),
            humidity: mean(|d| d.day.avghumidity),
            wind: mean(|d| d.day.maxwind_kph),
            uv: mean(|d| d.day.uv),
            cloud,
        })
    }
}

/// Score one location from its forecast response.
///
/// Uses measured air quality when any hourly record carries pollutants,
/// otherwise the weather-based proxy. `rng` drives the jitter, the proxy
/// noise and the choice of summary sentence.
pub fn score_city<R: Rng + ?Sized>(response: &ForecastResponse, rng: &mut R) -> Result<CityScore> {
    let days = response.forecast_days()?;
    let averages = ForecastAverages::from_days(days)?;
    let region = response.location.region_key();

    let hourly_air = days
        .iter()
        .flat_map(|d| d.hour.iter())
        .filter_map(|h| h.air_quality.as_ref());
    let avg_air = match measured_air_score(hourly_air, rng) {
        Some(score) => score,
        None => {
            estimate_air_quality(averages.temperature, averages.wind, averages.humidity, rng)
                .avg_air
        }
    };

    let comfort = comfort_score(averages.cloud, averages.wind)?;
    let values = ScoreValues {
        heat: normalize(averages.temperature, HEAT_RANGE.0, HEAT_RANGE.1)?,
        humidity: normalize(averages.humidity, HUMIDITY_RANGE.0, HUMIDITY_RANGE.1)?,
        wind: normalize(averages.wind, WIND_RANGE.0, WIND_RANGE.1)?,
        uv: normalize(averages.uv, UV_RANGE.0, UV_RANGE.1)?,
        air: normalize(avg_air, AIR_RANGE.0, AIR_RANGE.1)?,
        comfort,
    };

    let summary = summary_sentence(&region, &averages, avg_air, comfort, rng.random_range(0..3));

    Ok(CityScore {
        lat: response.location.lat,
        lon: response.location.lon,
        region,
        summary,
        values,
    })
}

fn summary_sentence(
    region: &str,
    averages: &ForecastAverages,
    avg_air: f64,
    comfort: f64,
    variant: usize,
) -> String {
    let ForecastAverages {
        temperature,
        humidity,
        wind,
        uv,
        cloud,
    } = *averages;
    match variant {
        0 => format!(
            "{region} has an average temperature of {temperature:.1}°C over the next 14 days, humidity {humidity:.0}%, air quality {avg_air:.1}/10, winds {wind:.1} km/h, cloud cover {cloud:.0}%, and UV {uv:.1}."
        ),
        1 => format!(
            "In {region}, the 14-day forecast shows {temperature:.1}°C on average with humidity at {humidity:.0}%. Air quality {avg_air:.1}/10, UV {uv:.1}, and comfort {comfort:.1}/10."
        ),
        _ => format!(
            "{region} weekly outlook: mean {temperature:.1}°C, {humidity:.0}% humidity, air quality {avg_air:.1}/10, UV {uv:.1}, comfort {comfort:.1}/10. Values from the last 14 days"
        ),
    }
}
