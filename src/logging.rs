//! Logging setup.
//!
//! The configured level applies to this crate only; `RUST_LOG` takes
//! precedence when set.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

/// Verbosity requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Use the configured level.
    #[default]
    Normal,
    /// Debug and above.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Build from the `-q` flag and the number of `-v` flags.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// Resolve the effective level, falling back to the configured one.
    #[must_use]
    pub fn level(&self, configured: &str) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
            Self::Normal => configured.parse().unwrap_or(Level::INFO),
        }
    }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logging(config: &LoggingConfig, verbosity: Verbosity) {
    let level = verbosity.level(&config.level);
    let default_filter = format!("cityscience={level},tower_http=warn");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    let _ = if config.format == "json" {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .try_init()
    };
}
