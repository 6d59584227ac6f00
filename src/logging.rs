//! Tracing subscriber bootstrap for services embedding the toolkit.
//!
//! Library code only emits `tracing` events; the hosting binary calls
//! [`init`] once at startup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. `"info,exam_2fa=debug"`.
    pub filter: String,
    /// JSON lines instead of human-readable output. Always on when built
    /// with the `logs-json` feature.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Default config with the filter taken from `RUST_LOG` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(filter) = std::env::var(EnvFilter::DEFAULT_ENV) {
            if !filter.trim().is_empty() {
                config.filter = filter;
            }
        }
        config
    }

    pub fn json_output(&self) -> bool {
        self.json || cfg!(feature = "logs-json")
    }

    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        EnvFilter::try_new(&self.filter).map_err(|source| LoggingError::Filter {
            filter: self.filter.clone(),
            source,
        })
    }
}

/// Install the global subscriber. Fails instead of panicking when one is
/// already set, so tests and embedding hosts can call it unconditionally.
pub fn init(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = config.env_filter()?;

    let (plain, json) = if config.json_output() {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .flatten_event(true);
        (None, Some(layer))
    } else {
        (Some(fmt::layer().with_target(true)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .try_init()?;

    tracing::info!(filter = %config.filter, json = config.json_output(), "Logging initialized");
    Ok(())
}
