use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff settings for calls to collaborators (event stream,
/// document service).
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_millis(500),
            jitter_max: Some(Duration::from_millis(50)),
        }
    }
}

impl RetryConfig {
    /// Short budget for lookups that sit on the generation path.
    pub fn quick() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_millis(200),
            jitter_max: Some(Duration::from_millis(25)),
        }
    }

    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            jitter_max: None,
        }
    }

    fn delay(&self, backoff: Duration) -> Duration {
        match self.jitter_max {
            Some(jitter) if !jitter.is_zero() => {
                let extra = rand::rng().random_range(0..=jitter.as_millis() as u64);
                backoff + Duration::from_millis(extra)
            }
            _ => backoff,
        }
    }
}

/// Runs `f` until it succeeds or `max_attempts` calls have failed, returning
/// the last error in that case.
pub async fn retry_async_with_config<F, Fut, T, E>(config: RetryConfig, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0usize;
    let mut backoff = config.base_backoff;

    loop {
        attempt += 1;
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= config.max_attempts.max(1) => return Err(e),
            Err(e) => {
                tracing::debug!(attempt, error = %e, "Retrying after failure");
                let wait = config.delay(backoff);
                tokio::time::sleep(wait).await;
                backoff = std::cmp::min(backoff * 2, config.max_backoff);
            }
        }
    }
}
