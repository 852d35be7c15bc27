//! Structured logging setup. `RUST_LOG` wins when set; otherwise the
//! configured level seeds the filter.

use std::fmt;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

#[derive(Debug)]
pub enum TelemetryError {
    InvalidFilter { directive: String, source: ParseError },
    AlreadyInitialized(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidFilter { directive, .. } => {
                write!(f, "invalid log filter directive '{directive}'")
            }
            TelemetryError::AlreadyInitialized(err) => {
                write!(f, "log subscriber installation failed: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidFilter { source, .. } => Some(source),
            TelemetryError::AlreadyInitialized(err) => Some(&**err),
        }
    }
}

/// Install the global subscriber: compact single-line output without
/// ANSI colour, suitable for container log collectors.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_directives(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::AlreadyInitialized)
}

fn parse_directives(raw: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(raw).map_err(|source| TelemetryError::InvalidFilter {
        directive: raw.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_directives_are_rejected() {
        let err = parse_directives("not==a==filter").expect_err("directive should not parse");
        assert!(err.to_string().contains("not==a==filter"));
    }

    #[test]
    fn plain_levels_parse() {
        assert!(parse_directives("debug").is_ok());
        assert!(parse_directives("mealbridge=info,tower=warn").is_ok());
    }
}
