//! Configuration management for the City Science application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::CityScienceError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the City Science application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CityScienceConfig {
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Text generation API configuration
    pub generation: GenerationConfig,
    /// Web server configuration
    pub server: ServerConfig,
    /// City scoring batch configuration
    pub batch: BatchConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// WeatherAPI.com key
    pub api_key: Option<String>,
    /// Base URL for the weather API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Forecast days requested for bulletins
    pub bulletin_days: u32,
    /// Maximum number of samples per metric handed to the prompt
    pub max_samples: usize,
}

/// Generative text API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Gemini API key
    pub api_key: Option<String>,
    /// Base URL for the generative language API
    pub base_url: String,
    /// Model identifier
    pub model: String,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with the static site (pages, scripts, styles)
    pub static_dir: String,
    /// File the latest bulletin is written to
    pub output_html: String,
    /// Maximum accepted request body in KiB
    pub body_limit_kb: usize,
}

/// City scoring batch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// City list, `city,country` CSV or one "City, Country" per line
    pub cities_file: String,
    /// JSON array of scored regions
    pub regions_file: String,
    /// Forecast days averaged per city
    pub forecast_days: u32,
    /// Persist progress every N processed cities
    pub save_every: usize,
    /// Pause between cities in milliseconds
    pub delay_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "http://api.weatherapi.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_bulletin_days() -> u32 {
    3
}

fn default_max_samples() -> usize {
    14
}

fn default_generation_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_output_html() -> String {
    "bulletin.html".to_string()
}

fn default_body_limit_kb() -> usize {
    64
}

fn default_cities_file() -> String {
    "citys.csv".to_string()
}

fn default_regions_file() -> String {
    "regions.json".to_string()
}

fn default_batch_forecast_days() -> u32 {
    14
}

fn default_save_every() -> usize {
    100
}

fn default_delay_ms() -> u64 {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            bulletin_days: default_bulletin_days(),
            max_samples: default_max_samples(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_generation_base_url(),
            model: default_generation_model(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            output_html: default_output_html(),
            body_limit_kb: default_body_limit_kb(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            cities_file: default_cities_file(),
            regions_file: default_regions_file(),
            forecast_days: default_batch_forecast_days(),
            save_every: default_save_every(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CityScienceConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CITYSCIENCE_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("CITYSCIENCE")
                .prefix_separator("_")
                .separator("__"),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CityScienceConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cityscience").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.bulletin_days == 0 {
            self.weather.bulletin_days = default_bulletin_days();
        }
        if self.weather.max_samples == 0 {
            self.weather.max_samples = default_max_samples();
        }
        if self.generation.base_url.is_empty() {
            self.generation.base_url = default_generation_base_url();
        }
        if self.generation.model.is_empty() {
            self.generation.model = default_generation_model();
        }
        if self.server.output_html.is_empty() {
            self.server.output_html = default_output_html();
        }
        if self.server.body_limit_kb == 0 {
            self.server.body_limit_kb = default_body_limit_kb();
        }
        if self.batch.forecast_days == 0 {
            self.batch.forecast_days = default_batch_forecast_days();
        }
        if self.batch.save_every == 0 {
            self.batch.save_every = default_save_every();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys; both are optional until a command needs them
    pub fn validate_api_keys(&self) -> Result<()> {
        for (name, key) in [
            ("Weather", &self.weather.api_key),
            ("Generation", &self.generation.api_key),
        ] {
            if let Some(key) = key {
                if key.trim().is_empty() {
                    return Err(CityScienceError::config(format!(
                        "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }

                if key.len() > 200 {
                    return Err(CityScienceError::config(format!(
                        "{name} API key appears to be invalid (too long). Please check your API key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                CityScienceError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        // WeatherAPI.com serves at most 14 forecast days
        if self.weather.bulletin_days > 14 || self.batch.forecast_days > 14 {
            return Err(CityScienceError::config("Forecast days cannot exceed 14").into());
        }

        if self.weather.max_samples > 48 {
            return Err(CityScienceError::config("Sample count cannot exceed 48").into());
        }

        if self.server.body_limit_kb > 10 * 1024 {
            return Err(CityScienceError::config("Body limit cannot exceed 10240 KiB").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CityScienceError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CityScienceError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Weather", &self.weather.base_url),
            ("Generation", &self.generation.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CityScienceError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Weather API key, required by every command that fetches forecasts
    pub fn weather_api_key(&self) -> crate::Result<&str> {
        self.weather.api_key.as_deref().ok_or_else(|| {
            CityScienceError::config(
                "Missing weather API key (set CITYSCIENCE_WEATHER__API_KEY)",
            )
        })
    }

    /// Generation API key, required by bulletin commands and the web server
    pub fn generation_api_key(&self) -> crate::Result<&str> {
        self.generation.api_key.as_deref().ok_or_else(|| {
            CityScienceError::config(
                "Missing generation API key (set CITYSCIENCE_GENERATION__API_KEY)",
            )
        })
    }
}
