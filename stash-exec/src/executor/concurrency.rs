use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds how many requests of a concurrent sequence are in flight.
#[derive(Clone)]
pub struct WorkerLimit {
    slots: Arc<Semaphore>,
}

impl WorkerLimit {
    pub fn new(workers: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub async fn acquire(&self) -> WorkerPermit {
        // The semaphore is never closed, so acquisition only fails on a bug.
        match Arc::clone(&self.slots).acquire_owned().await {
            Ok(permit) => WorkerPermit {
                _permit: Some(permit),
            },
            Err(_) => WorkerPermit { _permit: None },
        }
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}

pub struct WorkerPermit {
    _permit: Option<OwnedSemaphorePermit>,
}
