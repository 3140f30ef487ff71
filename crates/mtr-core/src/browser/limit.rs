//! Upper bound on simultaneously running browser sessions.
//!
//! Each session is a full browser process, so concurrent resolutions take a
//! permit before launching and hold it until the session is closed.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::ResolveError;

/// Shared session budget. Cloning shares the same underlying permits.
#[derive(Debug, Clone)]
pub struct SessionLimiter {
    max: usize,
    semaphore: Arc<Semaphore>,
}

/// Returns its slot to the limiter when dropped.
#[derive(Debug)]
pub struct SessionPermit {
    _permit: OwnedSemaphorePermit,
}

impl SessionLimiter {
    /// Create a limiter with the given maximum (e.g. from config). Zero is treated as one.
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            max,
            semaphore: Arc::new(Semaphore::new(max)),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Sessions currently holding a permit.
    pub fn in_use(&self) -> usize {
        self.max.saturating_sub(self.semaphore.available_permits())
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> Result<SessionPermit, ResolveError> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map(|permit| SessionPermit { _permit: permit })
            .map_err(|_| ResolveError::Aborted("session limiter closed".to_string()))
    }

    /// Takes a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<SessionPermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| SessionPermit { _permit: permit })
    }
}
