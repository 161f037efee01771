//! Structured Logging for the PoolForge Backend
//!
//! Provides production-ready structured logging with:
//! - JSON output for log aggregation services
//! - Correlation IDs for request tracing
//! - Lifecycle event logging for pools and deposits
//!
//! # Usage
//!
//! ```rust,ignore
//! use poolforge::logging::{init_logging, LogLevel};
//!
//! // Initialize at startup
//! init_logging(LogLevel::Info, true)?; // JSON mode for production
//!
//! // Log events
//! info!(target: "poolforge::api", request_id = %id, "Processing approval");
//! ```

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// API request/response events
    Api,
    /// Pool lifecycle events
    Pool,
    /// Deposit ledger events
    Deposit,
    /// Webhook reconciliation events
    Webhook,
    /// System events (startup, shutdown)
    System,
    /// Error events
    Error,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (ISO 8601)
    pub timestamp: String,
    /// Log level
    pub level: String,
    /// Event category
    pub category: EventCategory,
    /// Human-readable message
    pub message: String,
    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Duration in milliseconds (for timed events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: format!("{:?}", level).to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            duration_ms: None,
            error: None,
        }
    }

    /// Add correlation ID
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Add error details
    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    /// Log this event to JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

// ============================================================================
// Lifecycle Event Logging
// ============================================================================

/// Log an API request
pub fn log_api_request(method: &str, path: &str, correlation_id: &str) {
    let event = LogEvent::new(
        LogLevel::Info,
        EventCategory::Api,
        format!("{} {}", method, path),
    )
    .with_correlation_id(correlation_id)
    .with_data(serde_json::json!({
        "method": method,
        "path": path
    }));

    tracing::info!(target: "poolforge::api", "{}", event.to_json());
}

/// Log an API response
pub fn log_api_response(method: &str, path: &str, status: u16, duration_ms: u64, correlation_id: &str) {
    let level = if status >= 500 {
        LogLevel::Error
    } else if status >= 400 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    };

    let event = LogEvent::new(
        level,
        EventCategory::Api,
        format!("{} {} -> {}", method, path, status),
    )
    .with_correlation_id(correlation_id)
    .with_duration(duration_ms)
    .with_data(serde_json::json!({
        "method": method,
        "path": path,
        "status": status
    }));

    match level {
        LogLevel::Error => tracing::error!(target: "poolforge::api", "{}", event.to_json()),
        LogLevel::Warn => tracing::warn!(target: "poolforge::api", "{}", event.to_json()),
        _ => tracing::info!(target: "poolforge::api", "{}", event.to_json()),
    }
}

/// Log a pool lifecycle event
pub fn log_pool_event(event_type: &str, pool_id: &str, status: &str, error: Option<&str>) {
    let success = error.is_none();
    let level = if success { LogLevel::Info } else { LogLevel::Error };
    let mut event = LogEvent::new(level, EventCategory::Pool, event_type)
        .with_correlation_id(pool_id)
        .with_data(serde_json::json!({
            "pool_id": pool_id,
            "status": status,
            "success": success
        }));

    if let Some(err) = error {
        event = event.with_error("POOL_ERROR", err);
    }

    if success {
        tracing::info!(target: "poolforge::pool", "{}", event.to_json());
    } else {
        tracing::error!(target: "poolforge::pool", "{}", event.to_json());
    }
}

/// Log a deposit ledger event
pub fn log_deposit_event(
    event_type: &str,
    pool_id: u64,
    user_address: &str,
    amount: &str,
    error: Option<&str>,
) {
    let success = error.is_none();
    let level = if success { LogLevel::Info } else { LogLevel::Warn };
    let mut event = LogEvent::new(level, EventCategory::Deposit, event_type).with_data(
        serde_json::json!({
            "pool_id": pool_id,
            "user_address": user_address,
            "amount": amount,
            "success": success
        }),
    );

    if let Some(err) = error {
        event = event.with_error("DEPOSIT_ERROR", err);
    }

    if success {
        tracing::info!(target: "poolforge::ledger", "{}", event.to_json());
    } else {
        tracing::warn!(target: "poolforge::ledger", "{}", event.to_json());
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Minimum log level to output
/// * `json_format` - Use JSON format (recommended for production)
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let lvl = format!("{:?}", level).to_lowercase();
        EnvFilter::new(format!("poolforge={},tower_http={},axum={}", lvl, lvl, lvl))
    });

    if json_format {
        // JSON format for production
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        // Pretty format for development
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from PoolForgeConfig
pub fn init_from_config(config: &crate::config::PoolForgeConfig) -> Result<(), LoggingError> {
    let level = LogLevel::from(config.log_level.as_str());
    let json_format = config.environment == crate::config::Environment::Production;

    init_logging(level, json_format)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

// ============================================================================
// Request ID Generation
// ============================================================================

/// Generate a unique correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    format!("{:x}-{:04x}", timestamp & 0xFFFFFFFF, rand::random::<u16>())
}

// ============================================================================
// Tests
// ============================================================================
