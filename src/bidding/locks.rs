// region:    --- Imports
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;
use tracing::warn;

use crate::error::AppError;

// endregion: --- Imports

// region:    --- Product Locks

/// Per-product critical sections for bid submissions.
///
/// Two bids racing on the same auction must not both validate against a
/// stale snapshot, so the ledger's read-validate-write sequence runs
/// under the product's lock. Acquisition is bounded: a submission that
/// cannot enter within the timeout fails retryably instead of queueing
/// indefinitely.
pub struct ProductLocks {
    acquire_timeout: Duration,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProductLocks {
    pub fn new(acquire_timeout: Duration) -> Self {
        Self {
            acquire_timeout,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Acquire the critical section for `product_id`, waiting at most the
    /// configured timeout. The guard releases on drop.
    pub async fn acquire(&self, product_id: &str) -> Result<OwnedMutexGuard<()>, AppError> {
        let lock = {
            let mut locks = self.locks.lock().expect("product lock registry poisoned");
            // An entry whose only owner is the registry has no holder and
            // no waiter; dropping it here keeps the map from growing with
            // every product ever bid on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                locks
                    .entry(product_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        match timeout(self.acquire_timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!(
                    "{:<12} --> lock on product {} contended past {:?}",
                    "Locks", product_id, self.acquire_timeout
                );
                Err(AppError::Contended)
            }
        }
    }

    /// Number of products currently tracked by the registry.
    pub fn tracked_products(&self) -> usize {
        self.locks
            .lock()
            .expect("product lock registry poisoned")
            .len()
    }
}

// endregion: --- Product Locks
