//! `WeatherAPI.com` response structures and conversion utilities

use serde::Deserialize;

use crate::models::{CurrentConditions, Location, WeatherSample, region_key};
use crate::{CityScienceError, Result};

/// Forecast response; `forecast.json` always carries `forecast`,
/// `current.json` does not
#[derive(Debug, Deserialize, Clone)]
pub struct ForecastResponse {
    pub location: LocationData,
    pub current: Option<CurrentData>,
    pub forecast: Option<ForecastData>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationData {
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub localtime: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CurrentData {
    pub temp_c: f64,
    pub feelslike_c: Option<f64>,
    pub humidity: f64,
    pub wind_kph: f64,
    pub cloud: Option<f64>,
    pub uv: f64,
    pub condition: Option<Condition>,
    pub air_quality: Option<AirQuality>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Condition {
    pub text: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastData {
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastDay {
    pub date: String,
    pub day: DayData,
    #[serde(default)]
    pub hour: Vec<HourData>,
}

/// Daily aggregate; the API sends no cloud cover at this level
#[derive(Debug, Deserialize, Clone)]
pub struct DayData {
    pub avgtemp_c: f64,
    pub maxtemp_c: Option<f64>,
    pub mintemp_c: Option<f64>,
    pub avghumidity: f64,
    pub maxwind_kph: f64,
    pub cloud: Option<f64>,
    pub uv: f64,
    pub condition: Option<Condition>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HourData {
    pub time: Option<String>,
    pub temp_c: f64,
    pub humidity: f64,
    pub wind_kph: f64,
    pub cloud: Option<f64>,
    pub uv: f64,
    pub air_quality: Option<AirQuality>,
}

/// Pollutant concentrations in µg/m³
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct AirQuality {
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

impl AirQuality {
    /// True when the API sent the object without any pollutant
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [self.co, self.no2, self.o3, self.so2, self.pm2_5, self.pm10]
            .iter()
            .all(Option::is_none)
    }
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: Option<i64>,
    pub message: String,
}

impl ForecastResponse {
    /// Forecast days, failing when the response carries none
    pub fn forecast_days(&self) -> Result<&[ForecastDay]> {
        match &self.forecast {
            Some(forecast) if !forecast.forecastday.is_empty() => Ok(&forecast.forecastday),
            _ => Err(CityScienceError::api(format!(
                "No forecast days returned for {}",
                self.location.name
            ))),
        }
    }
}

impl LocationData {
    /// Deduplication key of the resolved place
    #[must_use]
    pub fn region_key(&self) -> String {
        region_key(&self.name, &self.region)
    }
}

impl From<&LocationData> for Location {
    fn from(data: &LocationData) -> Self {
        let location = Location::new(data.lat, data.lon, data.name.clone(), data.region.clone());
        match &data.country {
            Some(country) => location.with_country(country.clone()),
            None => location,
        }
    }
}

impl WeatherSample {
    /// Build the prompt series: every daily record, then hourly records of
    /// the last day, until each series holds `max_samples` values
    pub fn from_forecast(
        location: &str,
        response: &ForecastResponse,
        max_samples: usize,
    ) -> Result<Self> {
        let days = response.forecast_days()?;
        let mut sample = WeatherSample::new(location);

        for day in days {
            if sample.len() >= max_samples {
                break;
            }
            let data = &day.day;
            sample.push(
                data.avgtemp_c,
                data.avghumidity,
                data.maxwind_kph,
                data.cloud,
                data.uv,
            );
        }

        if let Some(last_day) = days.last() {
            for hour in &last_day.hour {
                if sample.len() >= max_samples {
                    break;
                }
                sample.push(hour.temp_c, hour.humidity, hour.wind_kph, hour.cloud, hour.uv);
            }
        }

        Ok(sample)
    }
}

impl CurrentConditions {
    /// Extract current conditions; `air_score` is the measured pollutant score
    pub fn from_response(response: &ForecastResponse) -> Result<Self> {
        let current = response.current.as_ref().ok_or_else(|| {
            CityScienceError::api(format!(
                "No current conditions returned for {}",
                response.location.name
            ))
        })?;
        let location = &response.location;
        let place = match &location.country {
            Some(country) if location.region.is_empty() => format!("{}, {country}", location.name),
            Some(country) => format!("{}, {}, {country}", location.name, location.region),
            None => location.name.clone(),
        };

        Ok(Self {
            location: place,
            local_time: location.localtime.clone(),
            temperature_c: current.temp_c,
            feels_like_c: current.feelslike_c,
            humidity: current.humidity,
            wind_kph: current.wind_kph,
            cloud: current.cloud,
            uv: current.uv,
            condition: current
                .condition
                .as_ref()
                .map_or_else(|| "Unknown".to_string(), |c| c.text.clone()),
            air_score: current
                .air_quality
                .as_ref()
                .filter(|aq| !aq.is_empty())
                .map(crate::scoring::air_quality::hourly_air_score),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    /// Forecast JSON with `days` days of `hours` hourly records each
    pub fn forecast_json(days: usize, hours: usize, with_air: bool) -> Value {
        let forecastday: Vec<Value> = (0..days)
            .map(|d| {
                let hour: Vec<Value> = (0..hours)
                    .map(|h| {
                        let mut record = json!({
                            "time": format!("2025-10-0{} {:02}:00", d + 1, h),
                            "temp_c": 20.0 + h as f64,
                            "humidity": 60,
                            "wind_kph": 10.0,
                            "cloud": 40,
                            "uv": 1.0
                        });
                        if with_air {
                            record["air_quality"] = json!({
                                "co": 500.0, "no2": 100.0, "o3": 100.0,
                                "so2": 25.0, "pm2_5": 12.5, "pm10": 25.0,
                                "us-epa-index": 1
                            });
                        }
                        record
                    })
                    .collect();
                json!({
                    "date": format!("2025-10-0{}", d + 1),
                    "day": {
                        "avgtemp_c": 25.0 + d as f64,
                        "maxtemp_c": 30.0,
                        "mintemp_c": 20.0,
                        "avghumidity": 70,
                        "maxwind_kph": 20.0,
                        "uv": 8.0,
                        "condition": {"text": "Sunny"}
                    },
                    "hour": hour
                })
            })
            .collect();

        json!({
            "location": {
                "name": "Fortaleza",
                "region": "Ceara",
                "country": "Brazil",
                "lat": -3.72,
                "lon": -38.54,
                "localtime": "2025-10-01 12:00"
            },
            "current": {
                "temp_c": 29.0,
                "feelslike_c": 32.0,
                "humidity": 70,
                "wind_kph": 22.0,
                "cloud": 25,
                "uv": 8.0,
                "condition": {"text": "Partly cloudy"}
            },
            "forecast": {"forecastday": forecastday}
        })
    }
}
