//! Time sources and deadlines
//!
//! Flows read the current time through [`Clock`] so expiry rules can be
//! pinned to exact instants in tests. Deadlines are plain
//! `tokio::time::Instant`s; dropping an operation's future cancels it.

use std::future::Future;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tokio::time::Instant;

use super::errors::{DomainError, DomainResult};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Run `operation` until `deadline`.
///
/// On expiry the operation's future is dropped, which rolls back any
/// transaction it still holds, and `DeadlineExceeded` is returned.
pub async fn with_deadline<F, T>(deadline: Instant, operation: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    match tokio::time::timeout_at(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::DeadlineExceeded),
    }
}
