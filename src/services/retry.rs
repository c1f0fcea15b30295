//! 指数退避重试

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::{AppResult, LlmError};

/// 重试策略：第 n 次失败后等待 `unit * backoff_base^n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多尝试次数（包括第一次）
    pub max_attempts: u32,
    pub backoff_base: u64,
    pub unit: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
            unit: Duration::from_secs(1),
        }
    }

    /// 第 `attempt` 次（从 0 开始）失败后的等待时间
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_base.saturating_pow(attempt);
        self.unit
            .saturating_mul(u32::try_from(factor).unwrap_or(u32::MAX))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

/// 按策略重试异步操作，全部失败后返回 `RetriesExhausted`
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut last_error = String::new();

    for attempt in 0..policy.max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_error = e.to_string();
                if attempt + 1 < policy.max_attempts {
                    let wait = policy.delay_after(attempt);
                    warn!(
                        "{} 失败 (尝试 {}/{}), {:?} 后重试: {}",
                        label,
                        attempt + 1,
                        policy.max_attempts,
                        wait,
                        e
                    );
                    sleep(wait).await;
                } else {
                    error!("{} 在 {} 次尝试后仍然失败: {}", label, policy.max_attempts, e);
                }
            }
        }
    }

    Err(LlmError::RetriesExhausted {
        attempts: policy.max_attempts,
        last_error,
    }
    .into())
}
