//! `CityScience` - environmental bulletins and city quality scores
//!
//! This library fetches weather forecasts, scores cities on a 1-10 scale,
//! assembles prompts for generated bulletins and serves them over HTTP.

pub mod api;
pub mod batch;
pub mod bulletin;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod models;
pub mod prompt;
pub mod report;
pub mod scoring;
pub mod summary;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use batch::{BatchOptions, BatchReport, RegionStore, run_batch};
pub use bulletin::BulletinService;
pub use config::CityScienceConfig;
pub use error::CityScienceError;
pub use generation::{GeminiClient, TextGenerator};
pub use logging::{Verbosity, init_logging};
pub use models::{CityScore, CurrentConditions, Location, ScoreValues, WeatherSample};
pub use prompt::{BulletinRequest, build_prompt};
pub use scoring::{normalize, score_city};
pub use weather::WeatherApiClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CityScienceError>;
