//! Retry policy for operations that fail with [`ErrorKind::Busy`].
//!
//! The policy is plain configuration; callers wrap a store call in
//! [`RetryPolicy::run`] instead of sleeping inline.

use std::{fmt::Display, future::Future, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::Classify;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  /// Total attempts including the first. `1` disables retries.
  pub max_attempts:       u32,
  pub initial_backoff_ms: u64,
  pub max_backoff_ms:     u64,
  pub multiplier:         f64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts:       3,
      initial_backoff_ms: 25,
      max_backoff_ms:     500,
      multiplier:         2.0,
    }
  }
}

impl RetryPolicy {
  /// A policy that never retries.
  pub fn none() -> Self {
    Self { max_attempts: 1, ..Self::default() }
  }

  /// Delay before retry number `attempt` (1-based).
  pub fn backoff(&self, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32) as i32;
    let millis = self.initial_backoff_ms as f64 * self.multiplier.max(1.0).powi(exponent);
    Duration::from_millis(millis.min(self.max_backoff_ms as f64) as u64)
  }

  /// Run `op`, retrying while it fails with a retryable error and attempts
  /// remain. Any other error is returned immediately.
  pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
  {
    let max_attempts = self.max_attempts.max(1);
    let mut attempt = 1;
    loop {
      match op().await {
        Err(e) if e.kind().is_retryable() && attempt < max_attempts => {
          let delay = self.backoff(attempt);
          tracing::warn!(
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %e,
            "store busy; retrying"
          );
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        other => return other,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;
  use crate::Error;

  #[test]
  fn backoff_grows_and_caps() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.backoff(1), Duration::from_millis(25));
    assert_eq!(policy.backoff(2), Duration::from_millis(50));
    assert_eq!(policy.backoff(3), Duration::from_millis(100));
    assert_eq!(policy.backoff(10), Duration::from_millis(500));
  }

  fn fast(max_attempts: u32) -> RetryPolicy {
    RetryPolicy { max_attempts, initial_backoff_ms: 1, max_backoff_ms: 1, multiplier: 1.0 }
  }

  #[tokio::test]
  async fn retries_busy_until_success() {
    let calls = &AtomicU32::new(0);
    let result = fast(3)
      .run("test", move || async move {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 { Err(Error::Busy) } else { Ok(7) }
      })
      .await;
    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn gives_up_after_max_attempts() {
    let calls = &AtomicU32::new(0);
    let result: Result<(), _> = fast(2)
      .run("test", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Busy)
      })
      .await;
    assert!(matches!(result, Err(Error::Busy)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn does_not_retry_other_errors() {
    let calls = &AtomicU32::new(0);
    let result: Result<(), _> = fast(5)
      .run("test", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::InvalidArgument("nope".into()))
      })
      .await;
    assert!(result.is_err());
    assert!(!result.unwrap_err().kind().is_retryable());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
