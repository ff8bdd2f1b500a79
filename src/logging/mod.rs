// Logging module for structured logging using the tracing crate

use parking_lot::Mutex;
use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Default filter directive when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event, for log aggregation systems
    Json,
}

static INSTALLED: Mutex<Option<LogFormat>> = Mutex::new(None);

/// Initialize the tracing subscriber for structured logging
///
/// Installs a plain-text subscriber filtered by `RUST_LOG`, or `info` when the
/// variable is unset. The library never calls this itself; the host does, once,
/// at startup.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or another global
/// subscriber was installed by someone else.
///
/// # Examples
///
/// ```
/// use project_identifier::logging::init_subscriber;
///
/// init_subscriber().expect("Failed to initialize logging");
/// tracing::info!("Host started");
/// ```
pub fn init_subscriber() -> Result<(), Box<dyn Error + Send + Sync>> {
    init_subscriber_with(LogFormat::Text, DEFAULT_FILTER)
}

/// Initialize the subscriber with an explicit format and fallback filter.
///
/// Calling it again after a successful installation is a no-op.
pub fn init_subscriber_with(
    format: LogFormat,
    default_filter: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut installed = INSTALLED.lock();
    if installed.is_some() {
        return Ok(());
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Text => builder.try_init()?,
        LogFormat::Json => builder.json().try_init()?,
    }

    *installed = Some(format);
    tracing::debug!(format = ?format, "Logging initialized");
    Ok(())
}
