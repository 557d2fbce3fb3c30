//! Timeout utilities for external tool invocations.
//!
//! Every collaborator call (section listing, symbol listing, demangling,
//! section dumping, dependency listing) runs under a deadline. A call that
//! exceeds it fails with [`ScanError::Timeout`], which callers treat the same
//! way as a missing tool.

use crate::error::{Result, ScanError};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error};

/// Default timeout duration in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300; // 5 minutes

/// Timeout configuration for one tool invocation
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Maximum duration for the operation
    pub duration: Duration,
    /// Whether to log timeout errors
    pub log_warnings: bool,
    /// Tool or operation name for logging and error reporting
    pub operation_name: String,
}

impl TimeoutConfig {
    /// Create a new timeout configuration
    pub fn new(seconds: u64, operation: impl Into<String>) -> Self {
        Self {
            duration: Duration::from_secs(seconds),
            log_warnings: true,
            operation_name: operation.into(),
        }
    }

    /// Override the duration with millisecond precision
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Execute an async operation with a timeout
pub async fn with_timeout<T, F>(config: TimeoutConfig, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    debug!(
        "Starting operation '{}' with timeout of {:?}",
        config.operation_name, config.duration
    );

    match timeout(config.duration, future).await {
        Ok(result) => {
            debug!("Operation '{}' finished", config.operation_name);
            result
        }
        Err(_) => {
            if config.log_warnings {
                error!(
                    "Operation '{}' timed out after {:?}",
                    config.operation_name, config.duration
                );
            }

            Err(ScanError::Timeout {
                tool: config.operation_name,
                seconds: config.duration.as_secs(),
            })
        }
    }
}

/// Drive [`with_timeout`] to completion from synchronous code.
///
/// Each call owns a current-thread runtime, so this is safe to call from
/// rayon worker threads.
pub fn block_on_with_timeout<T, F>(config: TimeoutConfig, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(with_timeout(config, future))
}
