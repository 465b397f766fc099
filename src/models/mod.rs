//! Data models for the City Science application
//!
//! - Location: resolved place names and coordinates
//! - Weather: per-request samples and current conditions
//! - City: scored regions persisted by the batch

pub mod city;
pub mod location;
pub mod weather;

pub use city::{CityScore, ScoreValues};
pub use location::{Location, region_key};
pub use weather::{CurrentConditions, WeatherSample};
