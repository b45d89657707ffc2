//! Logging - tracing subscriber for hosts embedding the session
//!
//! `RUST_LOG` filters as usual (default [`DEFAULT_FILTER`]).
//! `QUANTINIUM_LOG_FORMAT` picks the output: `pretty` (default), `compact` or `json`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "quantinium=info";
pub const FORMAT_ENV: &str = "QUANTINIUM_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    /// One JSON object per line, for log shippers.
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }

    /// Format named by `QUANTINIUM_LOG_FORMAT`. Unset or unrecognized: pretty.
    pub fn from_env() -> Self {
        std::env::var(FORMAT_ENV).ok().and_then(|v| Self::parse(&v)).unwrap_or_default()
    }
}

pub fn init_logging() { init_logging_with(LogFormat::from_env()); }

/// Install the global subscriber on stderr. Returns false if one was already installed.
pub fn init_logging_with(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
    installed.is_ok()
}
