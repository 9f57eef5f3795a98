//! Process-wide logging, installed once from `main`.

use std::io::{self, IsTerminal};

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Used when `RUST_LOG` is unset.
    pub default_filter: String,
    pub ansi: bool,
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            default_filter: "info".into(),
            ansi: io::stdout().is_terminal(),
        }
    }
}

/// Handle proving the subscriber and panic hook are installed.
#[derive(Debug)]
pub struct Telemetry {
    filter: String,
}

impl Telemetry {
    /// Installs the global subscriber and a panic hook that logs panics.
    ///
    /// # Errors
    /// [`TelemetryError::AlreadyInitialized`] on a second call.
    pub fn init(cfg: TelemetryConfig) -> Result<Self, TelemetryError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(f) => f,
            Err(_) => EnvFilter::try_new(&cfg.default_filter).map_err(|e| TelemetryError::Filter {
                filter: cfg.default_filter.clone(),
                reason: e.to_string(),
            })?,
        };
        let shown = filter.to_string();

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_timer(ChronoRfc3339Utc)
                    .with_target(true)
                    .with_ansi(cfg.ansi)
                    .compact(),
            )
            .try_init()
            .map_err(|_| TelemetryError::AlreadyInitialized)?;

        install_panic_hook();
        tracing::info!(target: "atlas", filter = %shown, "telemetry initialized");
        Ok(Self { filter: shown })
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(target: "atlas", panic = %info, %location, "panic");
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_an_error() {
        let cfg = TelemetryConfig {
            default_filter: "info".into(),
            ansi: false,
        };
        let first = Telemetry::init(cfg.clone());
        assert!(first.is_ok());
        assert!(matches!(
            Telemetry::init(cfg),
            Err(TelemetryError::AlreadyInitialized)
        ));
    }
}
