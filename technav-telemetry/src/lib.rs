//! Logging setup for TechNav binaries, plus an in-memory event capture layer
//! for asserting on log output in tests.
//!
//! The filter comes from `RUST_LOG` and falls back to [`DEFAULT_FILTER`].
//!
//! ```rust,ignore
//! technav_telemetry::init_telemetry("technav")?;
//! tracing::info!(owner = "u1", "stored document");
//! ```

pub mod capture;

pub use capture::{CapturedEvent, EventCaptureLayer, SharedEventLog};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber for '{service}': {message}")]
    Init { service: String, message: String },
}

/// Build the env filter, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a human-readable subscriber writing to stderr.
pub fn init_telemetry(service_name: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| TelemetryError::Init {
            service: service_name.to_string(),
            message: e.to_string(),
        })?;

    tracing::debug!(service = service_name, "telemetry initialised");
    Ok(())
}

/// Install a JSON-lines subscriber writing to stderr, one object per event.
pub fn init_json_telemetry(service_name: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| TelemetryError::Init {
            service: service_name.to_string(),
            message: e.to_string(),
        })?;

    tracing::debug!(service = service_name, "json telemetry initialised");
    Ok(())
}
