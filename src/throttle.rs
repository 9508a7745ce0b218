//! Per-client rate limiter: at most `limit` admissions per one-second window.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result, THROTTLE_POLL_INTERVAL, THROTTLE_WINDOW};

#[derive(Debug, Default)]
struct RateWindow {
    started_at: Option<Instant>,
    times_called: usize,
    last_admitted: Option<Instant>,
    /// Set while one caller is waiting out the window; everyone else polls.
    in_throttle: bool,
}

enum Turn {
    Reset(Duration),
    Poll,
}

#[derive(Debug, Default)]
pub struct Throttle {
    window: Mutex<RateWindow>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    fn window(&self) -> MutexGuard<'_, RateWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until the caller may issue a request. A `limit` of 0 disables throttling.
    ///
    /// The caller that finds the window full becomes the one that resets it, once a
    /// full window has passed since the last admission. Other blocked callers poll
    /// every [`THROTTLE_POLL_INTERVAL`] and re-evaluate from scratch.
    pub async fn wait(&self, limit: usize, cancel: &CancellationToken) -> Result<()> {
        if limit == 0 {
            return Ok(());
        }

        loop {
            let turn = {
                let mut window = self.window();
                let now = Instant::now();
                let started_at = *window.started_at.get_or_insert(now);

                if window.times_called < limit && now.duration_since(started_at) < THROTTLE_WINDOW {
                    window.times_called += 1;
                    window.last_admitted = Some(now);
                    return Ok(());
                }

                if window.in_throttle {
                    Turn::Poll
                } else {
                    window.in_throttle = true;
                    let reopens_at = window
                        .last_admitted
                        .map_or(now, |admitted| admitted + THROTTLE_WINDOW);
                    Turn::Reset(reopens_at.saturating_duration_since(now))
                }
            };

            match turn {
                Turn::Poll => sleep_or_cancel(THROTTLE_POLL_INTERVAL, cancel).await?,
                Turn::Reset(wait) => {
                    let waited = sleep_or_cancel(wait, cancel).await;
                    let mut window = self.window();
                    window.in_throttle = false;
                    waited?;
                    window.times_called = 0;
                    window.started_at = Some(Instant::now());
                }
            }
        }
    }
}

/// Sleeps for `duration` unless `cancel` fires first.
pub(crate) async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled),
        _ = sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::task::JoinSet;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_limit_without_waiting() {
        let throttle = Throttle::new();
        let cancel = CancellationToken::new();
        let start = Instant::now();

        for _ in 0..5 {
            throttle.wait(5, &cancel).await.unwrap();
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_limit_never_blocks() {
        let throttle = Throttle::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        for _ in 0..100 {
            throttle.wait(0, &cancel).await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn never_admits_more_than_limit_per_rolling_second() {
        let limit = 3;
        let throttle = Arc::new(Throttle::new());
        let admitted = Arc::new(Mutex::new(Vec::new()));

        let mut set = JoinSet::new();
        for _ in 0..(limit * 3 + 1) {
            let throttle = throttle.clone();
            let admitted = admitted.clone();
            set.spawn(async move {
                throttle.wait(limit, &CancellationToken::new()).await.unwrap();
                admitted.lock().unwrap().push(Instant::now());
            });
        }
        while let Some(task) = set.join_next().await {
            task.unwrap();
        }

        let mut times = admitted.lock().unwrap().clone();
        times.sort();
        assert_eq!(times.len(), limit * 3 + 1);
        for span in times.windows(limit + 1) {
            assert!(span[limit] - span[0] >= THROTTLE_WINDOW);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_period_does_not_cost_a_window() {
        let throttle = Throttle::new();
        let cancel = CancellationToken::new();

        throttle.wait(1, &cancel).await.unwrap();
        sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        throttle.wait(1, &cancel).await.unwrap();
        assert!(start.elapsed() < THROTTLE_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_waiters_unblock_within_one_poll_interval() {
        let throttle = Arc::new(Throttle::new());
        let cancel = CancellationToken::new();
        throttle.wait(1, &cancel).await.unwrap();

        // First waiter takes the reset role, second one polls.
        let mut waiters = Vec::new();
        for _ in 0..2 {
            let throttle = throttle.clone();
            let cancel = cancel.clone();
            waiters.push(tokio::spawn(async move { throttle.wait(1, &cancel).await }));
        }

        sleep(Duration::from_millis(100)).await;
        let cancelled_at = Instant::now();
        cancel.cancel();

        for waiter in waiters {
            let res = waiter.await.unwrap();
            assert!(matches!(res, Err(Error::Cancelled)));
        }
        assert!(cancelled_at.elapsed() <= THROTTLE_POLL_INTERVAL);
        assert!(!throttle.window().in_throttle);
    }
}
