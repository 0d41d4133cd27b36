//! Sequence allocator — the idempotent submission protocol
//!
//! For one logical voucher the allocator produces a number that can
//! never collide with a previously committed one and never leaves a gap
//! behind a number the destination actually saw committed:
//!
//! 1. Ledger short-circuit: a key that already committed reuses its
//!    recorded number, with no lock and no second push.
//! 2. The named (region, voucher type) lock serializes everything from
//!    the candidate read to the commit.
//! 3. `next = current + 1` is only persisted after the destination
//!    confirms acceptance, together with the ledger row, in one
//!    transaction. A rejected push persists nothing.
//!
//! There is deliberately no internal retry: a retried request arrives
//! with the same idempotency key and either short-circuits on the ledger
//! or draws a fresh candidate.

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use shared::voucher::VoucherLineItem;

use super::format::format_voucher_no;
use super::locks::{LockTimeout, SequenceLocks};
use crate::cloud::{PushRejection, VoucherGateway};
use crate::config::DestinationConfig;
use crate::db::{counters, ledger};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one allocation attempt
#[derive(Debug, Clone)]
pub struct AllocatedVoucher {
    pub voucher_no: String,
    /// True when the number came from the ledger instead of a fresh push
    pub reused: bool,
}

/// Why an allocation attempt failed
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error(transparent)]
    LockTimeout(#[from] LockTimeout),

    #[error("{0}")]
    Rejected(PushRejection),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The destination accepted the voucher but the local commit failed.
    /// The cloud now holds a number our ledger does not; a plain retry
    /// would push a duplicate.
    #[error("Voucher {voucher_no} accepted by cloud but local commit failed: {reason}")]
    CommitFailed { voucher_no: String, reason: String },
}

impl From<sqlx::Error> for AllocationError {
    fn from(e: sqlx::Error) -> Self {
        AllocationError::Storage(e.to_string())
    }
}

/// Allocates voucher numbers and drives the push-then-commit protocol
#[derive(Clone)]
pub struct SequenceAllocator {
    pool: SqlitePool,
    locks: Arc<SequenceLocks>,
    lock_wait: Duration,
}

impl SequenceAllocator {
    pub fn new(pool: SqlitePool, locks: Arc<SequenceLocks>, lock_wait: Duration) -> Self {
        Self {
            pool,
            locks,
            lock_wait,
        }
    }

    /// Allocate a number for one logical voucher and push it.
    ///
    /// Returns the committed voucher number, or the previously committed
    /// one when the idempotency key has already been through this path.
    pub async fn submit_numbered(
        &self,
        gateway: &dyn VoucherGateway,
        destination: &DestinationConfig,
        item: &VoucherLineItem,
    ) -> Result<AllocatedVoucher, AllocationError> {
        let key = item.idempotency_key.as_str();

        // 1. Already committed? Reuse the recorded number.
        if let Some(existing) = ledger::lookup(&self.pool, key).await? {
            tracing::debug!(
                idempotency_key = %key,
                voucher_no = %existing.voucher_no,
                "Idempotency key already committed, reusing voucher number"
            );
            return Ok(AllocatedVoucher {
                voucher_no: existing.voucher_no,
                reused: true,
            });
        }

        // 2. Serialize allocation for this (region, voucher type). The
        //    guard is held through the push and the commit.
        let _guard = self
            .locks
            .acquire(&destination.region, &destination.voucher_type, self.lock_wait)
            .await?;

        // 3. Candidate = last committed + 1.
        counters::ensure_row(
            &self.pool,
            &destination.region,
            &destination.voucher_type,
            &destination.fiscal_year,
        )
        .await?;
        let current = counters::read_current(
            &self.pool,
            &destination.region,
            &destination.voucher_type,
            &destination.fiscal_year,
        )
        .await?;
        let next = current + 1;
        let voucher_no = format_voucher_no(&destination.voucher_prefix, next);

        // 4. Push while still holding the lock. A rejection discards the
        //    candidate; the same value is offered on the next attempt.
        let document = item.cloud_document(&voucher_no);
        gateway
            .push(destination, &document)
            .await
            .map_err(AllocationError::Rejected)?;

        // 5. Accepted: advance the counter and record the key together.
        if let Err(e) = self.commit(destination, key, next, &voucher_no).await {
            tracing::error!(
                region = %destination.region,
                voucher_type = %destination.voucher_type,
                voucher_no = %voucher_no,
                idempotency_key = %key,
                error = %e,
                "NUMBERING INCONSISTENCY: cloud accepted the voucher but the local commit failed"
            );
            return Err(AllocationError::CommitFailed {
                voucher_no,
                reason: e.to_string(),
            });
        }

        tracing::info!(
            region = %destination.region,
            voucher_type = %destination.voucher_type,
            voucher_no = %voucher_no,
            "Voucher committed"
        );

        Ok(AllocatedVoucher {
            voucher_no,
            reused: false,
        })
    }

    /// Counter bump + ledger insert in one transaction
    async fn commit(
        &self,
        destination: &DestinationConfig,
        idempotency_key: &str,
        next: i64,
        voucher_no: &str,
    ) -> Result<(), BoxError> {
        let mut tx = self.pool.begin().await?;
        counters::commit_next(
            &mut tx,
            &destination.region,
            &destination.voucher_type,
            &destination.fiscal_year,
            next,
        )
        .await?;
        ledger::record(
            &mut tx,
            idempotency_key,
            &destination.region,
            &destination.voucher_type,
            voucher_no,
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::PushRejection;
    use crate::config::NumberingMode;
    use crate::db::connect_in_memory;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex as StdMutex;

    fn nepal_sales() -> DestinationConfig {
        DestinationConfig {
            region: "nepal".into(),
            voucher_type: "sales".into(),
            cloud_url: "http://stub".into(),
            auth_token: "token".into(),
            success_code: "200".into(),
            voucher_prefix: "AQNS".into(),
            numbering: NumberingMode::Sequential,
            fiscal_year: String::new(),
        }
    }

    fn item(key: &str) -> VoucherLineItem {
        VoucherLineItem {
            idempotency_key: key.into(),
            region: "nepal".into(),
            voucher_type: "sales".into(),
            business: serde_json::Map::new(),
        }
    }

    /// Stub gateway: accepts or rejects everything, records pushed documents
    struct StubGateway {
        accept: bool,
        delay: Duration,
        pushed: StdMutex<Vec<Value>>,
    }

    impl StubGateway {
        fn accepting() -> Self {
            Self {
                accept: true,
                delay: Duration::ZERO,
                pushed: StdMutex::new(Vec::new()),
            }
        }

        fn rejecting() -> Self {
            Self {
                accept: false,
                delay: Duration::ZERO,
                pushed: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VoucherGateway for StubGateway {
        async fn push(
            &self,
            _destination: &DestinationConfig,
            document: &Value,
        ) -> Result<(), PushRejection> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.pushed.lock().unwrap().push(document.clone());
            if self.accept {
                Ok(())
            } else {
                Err(PushRejection::new("Rejected by cloud: stub says no"))
            }
        }
    }

    async fn allocator() -> SequenceAllocator {
        let pool = connect_in_memory().await.unwrap();
        SequenceAllocator::new(pool, Arc::new(SequenceLocks::new()), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_committed_numbers_are_sequential() {
        let alloc = allocator().await;
        let gateway = StubGateway::accepting();
        let dest = nepal_sales();

        for (i, expected) in [(1, "AQNS/001"), (2, "AQNS/002"), (3, "AQNS/003")] {
            let got = alloc
                .submit_numbered(&gateway, &dest, &item(&format!("k-{i}")))
                .await
                .unwrap();
            assert_eq!(got.voucher_no, expected);
            assert!(!got.reused);
        }

        let current = counters::read_current(&alloc.pool, "nepal", "sales", "")
            .await
            .unwrap();
        assert_eq!(current, 3);
    }

    #[tokio::test]
    async fn test_rejection_leaves_no_trace() {
        let alloc = allocator().await;
        let dest = nepal_sales();

        let err = alloc
            .submit_numbered(&StubGateway::rejecting(), &dest, &item("k-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::Rejected(_)));

        // Counter untouched, no ledger row
        let current = counters::read_current(&alloc.pool, "nepal", "sales", "")
            .await
            .unwrap();
        assert_eq!(current, 0);
        assert!(ledger::lookup(&alloc.pool, "k-1").await.unwrap().is_none());

        // The discarded candidate is re-offered on the next attempt
        let got = alloc
            .submit_numbered(&StubGateway::accepting(), &dest, &item("k-1"))
            .await
            .unwrap();
        assert_eq!(got.voucher_no, "AQNS/001");
    }

    #[tokio::test]
    async fn test_resubmission_reuses_committed_number() {
        let alloc = allocator().await;
        let gateway = StubGateway::accepting();
        let dest = nepal_sales();

        let first = alloc
            .submit_numbered(&gateway, &dest, &item("k-1"))
            .await
            .unwrap();
        let second = alloc
            .submit_numbered(&gateway, &dest, &item("k-1"))
            .await
            .unwrap();

        assert_eq!(first.voucher_no, second.voucher_no);
        assert!(second.reused);
        // Only the first attempt reached the gateway
        assert_eq!(gateway.pushed.lock().unwrap().len(), 1);
        // Counter advanced exactly once
        let current = counters::read_current(&alloc.pool, "nepal", "sales", "")
            .await
            .unwrap();
        assert_eq!(current, 1);
    }

    #[tokio::test]
    async fn test_pushed_document_carries_assigned_number() {
        let alloc = allocator().await;
        let gateway = StubGateway::accepting();
        let dest = nepal_sales();

        let mut voucher = item("k-1");
        voucher
            .business
            .insert("partyname".into(), Value::String("Himal Traders".into()));

        alloc
            .submit_numbered(&gateway, &dest, &voucher)
            .await
            .unwrap();

        let pushed = gateway.pushed.lock().unwrap();
        assert_eq!(pushed[0]["voucherno"], "AQNS/001");
        assert_eq!(pushed[0]["partyname"], "Himal Traders");
        assert!(pushed[0].get("idempotencyKey").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_allocations_never_share_a_number() {
        let alloc = allocator().await;
        let dest = nepal_sales();

        let gateway = Arc::new(StubGateway {
            accept: true,
            delay: Duration::from_millis(30),
            pushed: StdMutex::new(Vec::new()),
        });

        let mut handles = Vec::new();
        for i in 0..4 {
            let alloc = alloc.clone();
            let dest = dest.clone();
            let gateway = Arc::clone(&gateway);
            handles.push(tokio::spawn(async move {
                alloc
                    .submit_numbered(gateway.as_ref(), &dest, &item(&format!("k-{i}")))
                    .await
                    .unwrap()
                    .voucher_no
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort();
        assert_eq!(numbers, ["AQNS/001", "AQNS/002", "AQNS/003", "AQNS/004"]);
    }
}
