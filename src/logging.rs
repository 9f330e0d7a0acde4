//! # Structured Logging Module
//!
//! Environment-aware structured logging for debugging batch pipelines and
//! sequence operators. Console output only; the engines perform no file I/O.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        // Use try_init to avoid panic if a global subscriber already exists
        let result = tracing_subscriber::fmt()
            .with_target(true)
            .with_level(true)
            .with_env_filter(EnvFilter::new(log_level))
            .try_init();

        if result.is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            environment = %environment,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("STEPSEQ_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for batch operations
pub fn log_batch_operation(
    operation: &str,
    batch_id: &str,
    operation_index: Option<usize>,
    status: &str,
    details: Option<&str>,
) {
    tracing::debug!(
        operation = %operation,
        batch_id = %batch_id,
        operation_index = operation_index,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "BATCH_OPERATION"
    );
}

/// Log structured data for sequence operators
pub fn log_sequence_operation(operation: &str, item_count: usize, details: Option<&str>) {
    tracing::trace!(
        operation = %operation,
        item_count = item_count,
        details = details,
        "SEQUENCE_OPERATION"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("unknown"), "debug");
    }
}
