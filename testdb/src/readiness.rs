//! Waiting for a freshly launched server to come up.
//!
//! [`wait_until`] polls a check with exponential backoff until it succeeds,
//! the policy's time or attempt budget runs out, or a [`CancellationToken`]
//! fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{Error, Result};

/// Longest single sleep between cancellation checks.
const SLEEP_SLICE: Duration = Duration::from_millis(25);

/// How long and how often to poll for readiness.
///
/// The default waits up to five seconds, starting at 100ms between checks
/// and doubling up to one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Total time budget.
    pub timeout: Duration,
    /// Delay before the first check.
    pub initial_interval: Duration,
    /// Upper bound for the delay between checks.
    pub max_interval: Duration,
    /// Maximum number of checks, `None` for unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl ReadinessPolicy {
    /// Sleep `delay`, then check exactly once.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use testdb::readiness::ReadinessPolicy;
    ///
    /// let policy = ReadinessPolicy::fixed_delay(Duration::from_secs(5));
    /// assert_eq!(policy.max_attempts, Some(1));
    /// ```
    #[must_use]
    pub const fn fixed_delay(delay: Duration) -> Self {
        Self {
            timeout: delay,
            initial_interval: delay,
            max_interval: delay,
            max_attempts: Some(1),
        }
    }
}

/// Cooperative cancellation flag shared between a waiter and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every wait observing this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`CancellationToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of [`wait_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The check succeeded.
    Ready {
        /// Number of checks performed.
        attempts: u32,
        /// Time spent waiting.
        elapsed: Duration,
    },
    /// The budget ran out first.
    TimedOut {
        /// Number of checks performed.
        attempts: u32,
        /// Time spent waiting.
        elapsed: Duration,
    },
}

impl Readiness {
    /// Whether the check succeeded.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Poll `check` under `policy` until it returns `true`.
///
/// Each round sleeps the current interval (clamped to the remaining time),
/// then checks. The interval doubles after each failed check, up to
/// `max_interval`.
///
/// # Errors
///
/// [`Error::Cancelled`] when `cancel` fires; any error from `check` is
/// returned as is.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use testdb::readiness::{wait_until, ReadinessPolicy};
///
/// let policy = ReadinessPolicy {
///     timeout: Duration::from_millis(200),
///     initial_interval: Duration::from_millis(1),
///     max_interval: Duration::from_millis(10),
///     max_attempts: None,
/// };
/// let mut calls = 0;
/// let outcome = wait_until(&policy, None, || {
///     calls += 1;
///     Ok(calls == 3)
/// })
/// .unwrap();
/// assert!(outcome.is_ready());
/// ```
pub fn wait_until<F>(
    policy: &ReadinessPolicy,
    cancel: Option<&CancellationToken>,
    mut check: F,
) -> Result<Readiness>
where
    F: FnMut() -> Result<bool>,
{
    let started = Instant::now();
    let mut interval = policy.initial_interval;
    let mut attempts = 0u32;

    loop {
        let remaining = policy.timeout.saturating_sub(started.elapsed());
        sleep_cancellable(interval.min(remaining), cancel)?;

        attempts += 1;
        if check()? {
            let elapsed = started.elapsed();
            debug!("ready after {attempts} attempt(s), {}ms", elapsed.as_millis());
            return Ok(Readiness::Ready { attempts, elapsed });
        }

        let elapsed = started.elapsed();
        let out_of_attempts = policy.max_attempts.is_some_and(|max| attempts >= max);
        if out_of_attempts || elapsed >= policy.timeout {
            debug!("not ready after {attempts} attempt(s), {}ms", elapsed.as_millis());
            return Ok(Readiness::TimedOut { attempts, elapsed });
        }

        interval = (interval * 2).min(policy.max_interval);
    }
}

fn sleep_cancellable(duration: Duration, cancel: Option<&CancellationToken>) -> Result<()> {
    let Some(token) = cancel else {
        thread::sleep(duration);
        return Ok(());
    };

    let deadline = Instant::now() + duration;
    loop {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }
        thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}
