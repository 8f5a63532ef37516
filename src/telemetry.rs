//! Logging setup and advisory telemetry.
//!
//! Structured logging via `tracing`, counters via the `metrics` facade,
//! and the fixed-shape memory snapshot reported to the host.

use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging (default for production).
    #[default]
    Json,
    /// Human-readable pretty printing (for development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format (JSON or Pretty).
    pub format: LogFormat,
    /// Log level filter (e.g., "info", "kindling=trace").
    pub level: String,
    /// Optional file path for log output. If None, logs to stderr.
    pub output_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
            output_path: None,
        }
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Failed to open log file: {0}")]
    FileOpen(String),
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

/// Initialize the tracing subscriber with the given configuration.
///
/// Call once at host startup; a second call reports
/// [`LogError::AlreadyInitialized`].
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LogError::InvalidFilter(e.to_string()))?;
    let registry = tracing_subscriber::registry().with(filter);

    match (config.format, &config.output_path) {
        (LogFormat::Json, Some(path)) => {
            let file = std::fs::File::create(path)
                .map_err(|e| LogError::FileOpen(e.to_string()))?;
            registry
                .with(fmt::layer().json().with_writer(std::sync::Mutex::new(file)))
                .try_init()
                .map_err(|_| LogError::AlreadyInitialized)
        }
        (LogFormat::Json, None) => registry
            .with(fmt::layer().json())
            .try_init()
            .map_err(|_| LogError::AlreadyInitialized),
        (LogFormat::Pretty, _) => registry
            .with(fmt::layer().pretty())
            .try_init()
            .map_err(|_| LogError::AlreadyInitialized),
    }
}

/// Advisory resource snapshot exposed to the host.
///
/// Fixed 4-slot layout for compatibility with telemetry consumers:
/// compute load, resident memory, accelerator memory, accelerator load.
/// Values are best-effort and must not drive control decisions; slots an
/// implementation cannot measure stay at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryUsage {
    /// Compute-unit load, percent.
    pub cpu_load: f32,
    /// Resident memory attributable to the session, MiB.
    pub resident_mb: f32,
    /// Dedicated accelerator memory in use, MiB.
    pub accel_mb: f32,
    /// Accelerator load, percent.
    pub accel_load: f32,
}

impl MemoryUsage {
    /// The wire shape consumed by hosts: `[cpu_load, resident_mb,
    /// accel_mb, accel_load]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.cpu_load, self.resident_mb, self.accel_mb, self.accel_load]
    }
}

/// Record one emitted piece.
pub fn record_piece_generated() {
    metrics::counter!("kindling_pieces_generated_total").increment(1);
}

/// Record a rejected decode batch, split by phase.
pub fn record_decode_failure(phase: &'static str) {
    metrics::counter!("kindling_decode_failures_total", "phase" => phase).increment(1);
}

/// Record a completed model load.
pub fn record_session_loaded() {
    metrics::counter!("kindling_sessions_loaded_total").increment(1);
}

/// Record a session reset.
pub fn record_session_reset() {
    metrics::counter!("kindling_session_resets_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_all_zero() {
        assert_eq!(MemoryUsage::default().to_array(), [0.0; 4]);
    }

    #[test]
    fn array_layout_is_stable() {
        let usage = MemoryUsage {
            cpu_load: 5.0,
            resident_mb: 512.0,
            accel_mb: 128.0,
            accel_load: 1.0,
        };
        assert_eq!(usage.to_array(), [5.0, 512.0, 128.0, 1.0]);
    }

    #[test]
    fn default_log_config_is_json_info() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert!(config.output_path.is_none());
    }
}
