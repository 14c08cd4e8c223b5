//! Bounded polling. Every wait in this crate flows through [`poll_until`]; no
//! component loops against the remote UI without a deadline.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Poll `probe` at `interval` until it yields a value or `budget` elapses.
///
/// The probe runs at least once regardless of budget, and once more at the
/// deadline before giving up, so a budget shorter than the interval still gets
/// two chances. Returns `None` on exhaustion; the caller decides whether that
/// is absence or a timeout error.
pub async fn poll_until<T, F, Fut>(budget: Duration, interval: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + budget;
    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        let remaining = deadline - now;
        tokio::time::sleep(remaining.min(interval)).await;
        if Instant::now() >= deadline {
            // Final probe at the deadline.
            return probe().await;
        }
    }
}

/// Fixed settle delay after an action that triggers a re-render.
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}
