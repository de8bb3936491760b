//! Backoff schedule for retried HTTP calls.
//!
//! Delays grow geometrically from `initial_backoff` and are capped at
//! `max_backoff`. A random fraction of up to `jitter` is shaved off each
//! delay so clients that failed together do not retry together. When the
//! node sends `Retry-After`, that hint wins over the computed delay but is
//! still capped.

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Fraction in `0.0..=1.0`; the delay is drawn from `[d * (1 - jitter), d]`.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Un-jittered delay before retry number `attempt` (1-based), or `None`
    /// once the retry allowance is spent.
    pub fn base_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.config.max_retries {
            return None;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let grown_ms =
            self.config.initial_backoff.as_millis() as f64 * self.config.multiplier.powi(exponent);
        let cap_ms = self.config.max_backoff.as_millis() as f64;
        Some(Duration::from_millis(grown_ms.min(cap_ms).max(0.0) as u64))
    }

    /// Delay before retry number `attempt`, honouring a server hint.
    pub fn next_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Option<Duration> {
        let base = self.base_delay(attempt)?;
        if let Some(hint) = retry_after {
            return Some(hint.min(self.config.max_backoff));
        }
        let jitter = self.config.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return Some(base);
        }
        let shave = rand::thread_rng().gen_range(0.0..=jitter);
        let ms = base.as_millis() as f64 * (1.0 - shave);
        Some(Duration::from_millis(ms.round() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32, jitter: f64) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(1_000),
            multiplier: 2.0,
            jitter,
        })
    }

    #[test]
    fn schedule_grows_then_caps() {
        let p = policy(6, 0.0);
        let delays: Vec<_> = (1..=6).filter_map(|a| p.next_delay(a, None)).collect();
        let ms: Vec<_> = delays.iter().map(Duration::as_millis).collect();
        assert_eq!(ms, vec![100, 200, 400, 800, 1_000, 1_000]);
        assert!(p.next_delay(7, None).is_none());
        assert!(p.next_delay(0, None).is_none());
    }

    #[test]
    fn jitter_only_shortens() {
        let p = policy(3, 0.5);
        for _ in 0..100 {
            let d = p.next_delay(2, None).unwrap();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(200), "{d:?}");
        }
    }

    #[test]
    fn retry_after_overrides_backoff_up_to_the_cap() {
        let p = policy(3, 0.5);
        assert_eq!(
            p.next_delay(1, Some(Duration::from_millis(750))),
            Some(Duration::from_millis(750))
        );
        assert_eq!(
            p.next_delay(1, Some(Duration::from_secs(60))),
            Some(Duration::from_millis(1_000))
        );
        assert!(p.next_delay(4, Some(Duration::ZERO)).is_none());
    }

    #[test]
    fn none_never_retries() {
        assert!(RetryPolicy::new(RetryConfig::none()).next_delay(1, None).is_none());
    }
}
