use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::warn;

use crate::error::Result;

pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_WAIT: Duration = Duration::from_secs(15);

/// Fixed-wait retry. The wait doubles as rate-limit avoidance, so it does not
/// back off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            wait: RETRY_WAIT,
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let remaining = max_attempts - attempt;
                    warn!(label, attempt, remaining, error = %e, "request failed");

                    if remaining == 0 || !e.is_retryable() {
                        return Err(e);
                    }
                }
            }

            sleep(self.wait).await;
        }
    }
}
