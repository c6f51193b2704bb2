use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SubsecRound, Utc};

/// Hands out work ids derived from the submission time in milliseconds.
///
/// Ids are strictly increasing within the process: when two submissions land
/// in the same millisecond the second one gets `previous + 1`.
#[derive(Debug, Default)]
pub struct WorkIdAllocator {
    last: AtomicI64,
}

impl WorkIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id together with the millisecond-precision
    /// submission timestamp it was derived from.
    pub fn next(&self) -> (i64, DateTime<Utc>) {
        self.next_at(Utc::now())
    }

    fn next_at(&self, now: DateTime<Utc>) -> (i64, DateTime<Utc>) {
        let submitted_at = now.trunc_subsecs(3);
        let millis = submitted_at.timestamp_millis();

        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = millis.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return (candidate, submitted_at),
                Err(actual) => current = actual,
            }
        }
    }
}
