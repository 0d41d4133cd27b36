//! Named sequence locks
//!
//! One exclusive async lock per (region, voucher type). The lock is the
//! sole serialization point for allocation: it is held across the
//! candidate read, the external push, and the commit, so only one
//! allocation can be in flight per key. Different keys never contend.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Bounded lock acquisition failed
#[derive(Debug, thiserror::Error)]
#[error("timed out after {wait_ms}ms waiting for sequence lock {region}/{voucher_type}")]
pub struct LockTimeout {
    pub region: String,
    pub voucher_type: String,
    pub wait_ms: u64,
}

/// Registry of named exclusive locks
#[derive(Debug, Default)]
pub struct SequenceLocks {
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl SequenceLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the exclusive lock for a key, waiting at most `wait`.
    ///
    /// The returned guard keeps the lock held until dropped; timing out
    /// is an ordinary contention outcome, not a fault.
    pub async fn acquire(
        &self,
        region: &str,
        voucher_type: &str,
        wait: Duration,
    ) -> Result<OwnedMutexGuard<()>, LockTimeout> {
        // Clone the Arc out before awaiting so the map shard is not held
        let lock = Arc::clone(
            self.locks
                .entry((region.to_string(), voucher_type.to_string()))
                .or_default()
                .value(),
        );

        tokio::time::timeout(wait, lock.lock_owned())
            .await
            .map_err(|_| LockTimeout {
                region: region.to_string(),
                voucher_type: voucher_type.to_string(),
                wait_ms: wait.as_millis() as u64,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_acquire_release() {
        let locks = SequenceLocks::new();

        let guard = locks
            .acquire("nepal", "sales", Duration::from_millis(100))
            .await
            .unwrap();
        drop(guard);

        locks
            .acquire("nepal", "sales", Duration::from_millis(100))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_second_acquirer_times_out_while_held() {
        let locks = SequenceLocks::new();

        let _guard = locks
            .acquire("nepal", "sales", Duration::from_millis(100))
            .await
            .unwrap();

        let result = locks
            .acquire("nepal", "sales", Duration::from_millis(50))
            .await;
        let err = result.err().expect("second acquire should time out");
        assert_eq!(err.region, "nepal");
        assert_eq!(err.voucher_type, "sales");
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_contend() {
        let locks = SequenceLocks::new();

        let _sales = locks
            .acquire("nepal", "sales", Duration::from_millis(50))
            .await
            .unwrap();

        // A different voucher type proceeds immediately
        locks
            .acquire("nepal", "purchase", Duration::from_millis(50))
            .await
            .unwrap();
    }
}
