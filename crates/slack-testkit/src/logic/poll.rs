//! Log polling
//!
//! Assertions against the session logs tolerate requests that have not
//! arrived yet: while a log is completely empty the probe is retried on a
//! short schedule. A non-empty log resolves immediately, even when the
//! filtered subset is empty; only total silence is worth waiting out.

use std::time::Duration;

use crate::error::{HarnessError, LogKind};

/// How many retries a poll gets before giving up
pub const RETRY_BUDGET: u32 = 3;

const BASE_DELAY_MS: f64 = 2000.0;
const MIN_DELAY_MS: f64 = 250.0;
const MAX_DELAY_MS: f64 = 1000.0;

/// Wait before the next probe, given how many retries remain
///
/// The waits grow as the budget drains: 250ms, then 500ms, then 1s.
pub fn retry_delay(retries_remaining: u32) -> Duration {
    let raw = BASE_DELAY_MS * 0.5_f64.powi(retries_remaining as i32);
    Duration::from_millis(raw.clamp(MIN_DELAY_MS, MAX_DELAY_MS) as u64)
}

/// Probe a log until it has content or the retry budget is spent
///
/// `probe` returns `None` while the underlying log is still empty and
/// `Some(filtered)` once anything has been recorded. The final probe runs
/// after the last wait, so a request landing during it still counts.
pub async fn poll_log<T, F>(log: LogKind, mut probe: F) -> Result<Vec<T>, HarnessError>
where
    F: FnMut() -> Option<Vec<T>>,
{
    let mut retries_remaining = RETRY_BUDGET;
    loop {
        if let Some(matches) = probe() {
            return Ok(matches);
        }
        if retries_remaining == 0 {
            return Err(HarnessError::LogNeverPopulated { log });
        }
        tokio::time::sleep(retry_delay(retries_remaining)).await;
        retries_remaining -= 1;
    }
}
