use anyhow::{Context, Result};
use ethers::providers::ProviderError;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::ConfigError;

/// Retry configuration for read-side chain operations. Transactions are
/// never retried; this backs chain-id fetches and round polling only.
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 10000,
            exponential_base: 2.0,
        }
    }
}

/// Execute async operation with exponential backoff retry
pub async fn retry_with_backoff<F, Fut, T>(operation: F, config: &RetryConfig) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= config.max_attempts => {
                return Err(e).context(format!("failed after {} attempts", attempt));
            }
            Err(e) => {
                if !is_retryable_error(&e) {
                    return Err(e);
                }

                // exponential backoff
                sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = (delay_ms as f64 * config.exponential_base) as u64;
                delay_ms = delay_ms.min(config.max_delay_ms);
            }
        }
    }
}

/// Determine if error is retryable
fn is_retryable_error(err: &anyhow::Error) -> bool {
    // revert errors are never retryable
    let text = err.to_string();
    if text.contains("revert") || text.contains("execution reverted") {
        return false;
    }

    // network errors are retryable
    if text.contains("network") || text.contains("timeout") || text.contains("connection") {
        return true;
    }

    // transient provider errors are retryable
    if err.downcast_ref::<ProviderError>().is_some() {
        return true;
    }

    // default to retryable, e.g. a freshly selected round not settled yet
    true
}

/// Validate a percentage field before it reaches an owner setter
pub fn validate_pct(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value > 100 {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            max: 100,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() -> Result<()> {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            exponential_base: 2.0,
        };

        let result = retry_with_backoff(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    bail!("connection reset");
                }
                Ok(n)
            },
            &config,
        )
        .await?;

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test]
    async fn reverts_are_not_retried() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            exponential_base: 2.0,
        };

        let result: Result<()> = retry_with_backoff(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                bail!("execution reverted: NotAuthorized()");
            },
            &config,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1, "a revert must abort immediately");
    }

    #[test]
    fn pct_validation() {
        assert!(validate_pct("fee_pct", 5).is_ok());
        assert!(validate_pct("fee_pct", 100).is_ok());
        assert!(validate_pct("fee_pct", 101).is_err());
    }
}
