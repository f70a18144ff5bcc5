/// Tracing and structured logging configuration
use serde::Deserialize;
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format for development
    #[default]
    Human,
    /// JSON format for log aggregation
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            _ => Ok(OutputFormat::Human),
        }
    }
}

/// Builds the filter: `RUST_LOG` wins, then `LOG_LEVEL`, then `default_level`.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_level.to_string());
        EnvFilter::new(format!("twinkv={},tower=warn,axum=info", level))
    })
}

/// Install the global subscriber.
///
/// `LOG_FORMAT` overrides `format` when set. Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
///
/// # Environment Variables
/// * `RUST_LOG` - Log level filter (e.g., "twinkv=debug,tower=warn")
/// * `LOG_LEVEL` - Level for this crate if RUST_LOG is not set
/// * `LOG_FORMAT` - "json" or "human"
pub fn init_tracing(format: OutputFormat, default_level: &str) {
    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|s| OutputFormat::from_str(&s).ok())
        .unwrap_or(format);
    let filter = env_filter(default_level);

    let installed = match format {
        OutputFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_ansi(true),
            )
            .try_init(),
        OutputFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(?format, "tracing initialized");
    }
}
