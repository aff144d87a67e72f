//! Resource waiting with exponential backoff and cancellation support.
//!
//! Provides a generic abstraction for waiting on AWS resources (or any async condition)
//! to become ready, with configurable exponential backoff, jitter, and cancellation.
//!
//! Time is measured with `tokio::time`, so tests running on a paused runtime
//! advance through the whole wait budget instantly.

use backon::{BackoffBuilder, ExponentialBuilder};
use cf_teardown_common::defaults::{
    DEFAULT_POLL_INITIAL_DELAY_SECS, DEFAULT_POLL_MAX_DELAY_SECS,
    DEFAULT_PROPAGATION_MAX_ATTEMPTS, DEFAULT_PROPAGATION_TIMEOUT_SECS,
};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for resource waiting with exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
    /// Maximum number of checks before timeout
    pub max_attempts: u32,
    /// Randomize delays to spread out concurrent pollers
    pub jitter: bool,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(DEFAULT_POLL_INITIAL_DELAY_SECS),
            max_delay: Duration::from_secs(DEFAULT_POLL_MAX_DELAY_SECS),
            timeout: Duration::from_secs(DEFAULT_PROPAGATION_TIMEOUT_SECS),
            max_attempts: DEFAULT_PROPAGATION_MAX_ATTEMPTS,
            jitter: true,
        }
    }
}

/// Why a wait ended without the resource becoming ready
#[derive(Debug, Error, PartialEq)]
pub enum WaitError<E> {
    #[error("Timeout waiting for {resource} after {waited:?} ({attempts} attempts)")]
    Timeout {
        resource: String,
        waited: Duration,
        attempts: u32,
    },

    #[error("Wait for {resource} cancelled")]
    Cancelled { resource: String },

    /// The check itself failed with a non-retryable error
    #[error("{0}")]
    Check(E),
}

/// Wait for a resource to become ready with exponential backoff.
///
/// Uses `backon::ExponentialBuilder` for delay calculation and `tokio::select!`
/// for cancellation support.
///
/// # Arguments
/// * `config` - Wait configuration
/// * `cancel` - Optional cancellation token
/// * `check` - Async function that returns `Ok(Some(value))` when ready, `Ok(None)` to retry
/// * `resource_name` - Name for logging
///
/// # Returns
/// * `Ok(value)` - Resource is ready
/// * `Err` - Timeout, cancelled, or check returned an error
///
/// Once the budget is spent no further check is started; the last sleep is
/// clipped so it never overshoots the timeout.
pub async fn wait_for_resource<T, E, F, Fut>(
    config: &WaitConfig,
    cancel: Option<&CancellationToken>,
    mut check: F,
    resource_name: &str,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Debug,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    let mut builder = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_max_times(config.max_attempts as usize);
    if config.jitter {
        builder = builder.with_jitter();
    }
    let mut delays = builder.build();

    loop {
        // Check cancellation before each attempt
        if cancel.is_some_and(|token| token.is_cancelled()) {
            return Err(WaitError::Cancelled {
                resource: resource_name.to_string(),
            });
        }

        let waited = start.elapsed();
        if waited >= config.timeout || attempts >= config.max_attempts {
            return Err(WaitError::Timeout {
                resource: resource_name.to_string(),
                waited,
                attempts,
            });
        }

        attempts += 1;

        match check().await {
            Ok(Some(value)) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(value);
            }
            Ok(None) => {
                let remaining = config.timeout.saturating_sub(start.elapsed());
                let delay = delays.next().unwrap_or(config.max_delay).min(remaining);
                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, retrying"
                );

                // Wait with cancellation support
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = async {
                        if let Some(token) = cancel {
                            token.cancelled().await
                        } else {
                            std::future::pending::<()>().await
                        }
                    } => {
                        return Err(WaitError::Cancelled {
                            resource: resource_name.to_string(),
                        });
                    }
                }
            }
            Err(e) => {
                warn!(resource = %resource_name, error = ?e, "Resource check failed");
                return Err(WaitError::Check(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> WaitConfig {
        WaitConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            timeout: Duration::from_secs(60),
            max_attempts: 1_000,
            jitter: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ready_after_a_few_polls() {
        let calls = AtomicU32::new(0);

        let value = wait_for_resource(
            &fast_config(),
            None,
            || {
                let calls = &calls;
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok::<_, String>((n == 3).then_some(n))
                }
            },
            "test-resource",
        )
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_stops_polling() {
        let start = Instant::now();
        let call_times = Mutex::new(Vec::new());

        let err = wait_for_resource(
            &fast_config(),
            None,
            || {
                let call_times = &call_times;
                async move {
                    call_times.lock().unwrap().push(start.elapsed());
                    Ok::<Option<()>, String>(None)
                }
            },
            "stuck-resource",
        )
        .await
        .unwrap_err();

        let WaitError::Timeout { waited, attempts, .. } = err else {
            panic!("expected timeout, got {err:?}");
        };
        let call_times = call_times.into_inner().unwrap();
        assert_eq!(attempts as usize, call_times.len());
        assert!(waited >= Duration::from_secs(60));
        assert!(
            call_times.iter().all(|t| *t < Duration::from_secs(60)),
            "no check may start after the budget is spent: {call_times:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_ceiling_is_enforced() {
        let calls = AtomicU32::new(0);
        let config = WaitConfig {
            max_attempts: 3,
            ..fast_config()
        };

        let err = wait_for_resource(
            &config,
            None,
            || {
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<Option<()>, String>(None)
                }
            },
            "stuck-resource",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WaitError::Timeout { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_check() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = AtomicU32::new(0);

        let err = wait_for_resource(
            &fast_config(),
            Some(&token),
            || {
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<Option<()>, String>(None)
                }
            },
            "resource",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WaitError::Cancelled { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_sleep() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            canceller.cancel();
        });

        let err = wait_for_resource(
            &fast_config(),
            Some(&token),
            || async { Ok::<Option<()>, String>(None) },
            "resource",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WaitError::Cancelled { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn check_error_is_returned_immediately() {
        let err = wait_for_resource(
            &fast_config(),
            None,
            || async { Err::<Option<()>, _>("access denied".to_string()) },
            "resource",
        )
        .await
        .unwrap_err();

        assert_eq!(err, WaitError::Check("access denied".to_string()));
    }
}
