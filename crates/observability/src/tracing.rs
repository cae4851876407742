//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line (default).
    #[default]
    Json,
    /// Human-readable single-line output for terminals.
    Compact,
}

impl LogFormat {
    /// `LODGE_LOG_FORMAT=compact` selects [`LogFormat::Compact`]; anything else is JSON.
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LODGE_LOG_FORMAT").ok().as_deref())
    }

    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("compact") => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// Filtering is configurable via `RUST_LOG` (default `info`). Safe to call
/// multiple times (subsequent calls are no-ops).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_json() {
        assert_eq!(LogFormat::parse(None), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" Compact ")), LogFormat::Compact);
    }

    #[test]
    fn init_is_idempotent() {
        init(LogFormat::Compact);
        init(LogFormat::Json);
        ::tracing::info!("still logging after repeated init");
    }
}
