//! Installing a `tracing` subscriber.
//!
//! The library itself only emits events. Binaries and tests that want to
//! see them call [`init_logging`] once at startup.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_DIRECTIVE: &str = "clusterflow=info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_directive")]
    pub default_directive: String,
}

fn default_directive() -> String {
    DEFAULT_DIRECTIVE.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            default_directive: default_directive(),
        }
    }
}

impl LoggingConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the fallback filter directive.
    #[must_use]
    pub fn with_default_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }

    /// Reads `CLUSTERFLOW_LOG_FORMAT`; an unknown value falls back to text.
    #[must_use]
    pub fn from_env() -> Self {
        let format = std::env::var("CLUSTERFLOW_LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        Self::new().with_format(format)
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_directive))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
    }
}

/// Installs a global subscriber.
///
/// Returns false if one was already installed, in which case nothing
/// changes.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.filter());
    let result = match config.format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };
    result.is_ok()
}
