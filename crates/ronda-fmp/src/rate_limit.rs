//! Rolling-window rate limiter.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// Limits grants to `max_requests` in any trailing `window`.
///
/// Callers queue on a fair async mutex, so waiters are served in arrival
/// order. `acquire` never fails; under overload it only waits longer.
/// Time comes from `tokio::time`, so a paused test clock drives it.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    turnstile: tokio::sync::Mutex<()>,
    grants: Mutex<VecDeque<Instant>>,
    paused_until: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Default budget: 300 requests per 60 seconds.
    pub const DEFAULT_MAX_REQUESTS: usize = 300;
    /// Default window.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

    /// Create a limiter. A zero budget is raised to one.
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            turnstile: tokio::sync::Mutex::new(()),
            grants: Mutex::new(VecDeque::with_capacity(max_requests)),
            paused_until: Mutex::new(None),
        }
    }

    /// Budget per window.
    #[must_use]
    pub const fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Wait until one more request fits the budget, then record it.
    pub async fn acquire(&self) {
        let _turn = self.turnstile.lock().await;
        loop {
            let now = Instant::now();
            let wake = self.try_grant(now);
            match wake {
                None => return,
                Some(at) => {
                    debug!(wait_ms = (at - now).as_millis() as u64, "rate limiter waiting");
                    sleep_until(at).await;
                }
            }
        }
    }

    /// Pause all grants for `duration` from now, e.g. after a 429 with `Retry-After`.
    ///
    /// A shorter pause never cuts an existing longer one.
    pub fn penalize(&self, duration: Duration) {
        let until = Instant::now() + duration;
        let mut paused = lock(&self.paused_until);
        if paused.is_none_or(|current| current < until) {
            *paused = Some(until);
        }
    }

    /// Grants recorded inside the current trailing window.
    #[must_use]
    pub fn in_flight_window(&self) -> usize {
        let mut grants = lock(&self.grants);
        self.prune(&mut grants, Instant::now());
        grants.len()
    }

    /// Record a grant at `now`, or return when to try again.
    fn try_grant(&self, now: Instant) -> Option<Instant> {
        {
            let mut paused = lock(&self.paused_until);
            match *paused {
                Some(until) if until > now => return Some(until),
                Some(_) => *paused = None,
                None => {}
            }
        }

        let mut grants = lock(&self.grants);
        self.prune(&mut grants, now);
        if grants.len() < self.max_requests {
            grants.push_back(now);
            return None;
        }
        grants.front().map(|oldest| *oldest + self.window)
    }

    fn prune(&self, grants: &mut VecDeque<Instant>, now: Instant) {
        while grants
            .front()
            .is_some_and(|oldest| *oldest + self.window <= now)
        {
            grants.pop_front();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_REQUESTS, Self::DEFAULT_WINDOW)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
