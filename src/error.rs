//! Error types and handling for the City Science application

use thiserror::Error;

/// Main error type for the City Science application
#[derive(Error, Debug)]
pub enum CityScienceError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Form and input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Text generation service errors
    #[error("Generation error: {message}")]
    Generation { message: String },

    /// Normalization bounds that cannot produce a finite score
    #[error("Invalid normalization range: min={min}, max={max}")]
    InvalidRange { min: f64, max: f64 },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON (de)serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Transport errors from the HTTP client, without the request URL
    #[error("HTTP error: {source}")]
    Http { source: reqwest::Error },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

// Request URLs carry API keys in their query string
impl From<reqwest::Error> for CityScienceError {
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source: source.without_url(),
        }
    }
}

impl CityScienceError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new generation error
    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CityScienceError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            CityScienceError::Api { .. } | CityScienceError::Http { .. } => {
                "Unable to reach the weather service. Please check the city name and try again."
                    .to_string()
            }
            CityScienceError::Validation { message } => message.clone(),
            CityScienceError::Generation { .. } => {
                "The bulletin could not be generated right now. Please try again later."
                    .to_string()
            }
            CityScienceError::InvalidRange { .. } => {
                "Score normalization failed for this location.".to_string()
            }
            CityScienceError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            CityScienceError::Json { .. } => "Stored data could not be read.".to_string(),
            CityScienceError::General { message } => message.clone(),
        }
    }
}
