//! Sliding-window rate limiter for the forecast API.
//!
//! A call is admitted only when every window has room; otherwise the
//! caller sleeps until the oldest call of the fullest window expires.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

const ONE_MINUTE: Duration = Duration::from_secs(60);
const ONE_HOUR: Duration = Duration::from_secs(3600);

struct Window {
    limit: usize,
    period: Duration,
    calls: VecDeque<Instant>,
}

impl Window {
    /// Time to wait before this window admits a call at `now`.
    fn wait_at(&mut self, now: Instant) -> Option<Duration> {
        while self
            .calls
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= self.period)
        {
            self.calls.pop_front();
        }

        if self.calls.len() < self.limit {
            return None;
        }
        self.calls
            .front()
            .map(|&oldest| (oldest + self.period).saturating_duration_since(now))
    }
}

/// Limits calls across any number of `(limit, period)` windows.
pub struct RateLimiter {
    windows: Mutex<Vec<Window>>,
}

impl RateLimiter {
    /// Creates a limiter from `(max calls, period)` pairs. A limit of
    /// zero is treated as one.
    #[must_use]
    pub fn new(limits: &[(usize, Duration)]) -> Self {
        let windows = limits
            .iter()
            .map(|&(limit, period)| Window {
                limit: limit.max(1),
                period,
                calls: VecDeque::new(),
            })
            .collect();
        Self {
            windows: Mutex::new(windows),
        }
    }

    /// Per-minute and per-hour limits.
    #[must_use]
    pub fn per_minute_and_hour(per_minute: usize, per_hour: usize) -> Self {
        Self::new(&[(per_minute, ONE_MINUTE), (per_hour, ONE_HOUR)])
    }

    /// Records a call at `now` if every window has room.
    ///
    /// # Errors
    ///
    /// Returns the time to wait before retrying if any window is full.
    /// Nothing is recorded in that case.
    pub async fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        let mut windows = self.windows.lock().await;

        let wait = windows.iter_mut().filter_map(|w| w.wait_at(now)).max();
        if let Some(wait) = wait {
            return Err(wait);
        }

        for window in windows.iter_mut() {
            window.calls.push_back(now);
        }
        Ok(())
    }

    /// Waits until a call is admitted, then records it.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire_at(Instant::now()).await {
                Ok(()) => return,
                Err(wait) => {
                    log::debug!("Rate limit reached, waiting {:.1}s", wait.as_secs_f64());
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
