//! Batch submission orchestrator
//!
//! Drives a batch of voucher line items through the sequence allocator
//! and the cloud gateway, strictly one at a time. Sequential processing
//! is deliberate: it avoids stacking a second layer of concurrency on
//! top of the per-(region, voucher type) lock. Every per-item failure is
//! folded into its result entry; the loop never aborts the batch.

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use shared::voucher::{SubmissionResult, VoucherLineItem};

use crate::cloud::VoucherGateway;
use crate::config::{Config, NumberingMode};
use crate::numbering::{SequenceAllocator, SequenceLocks};

/// Orchestrates one submission batch
pub struct SubmissionService {
    allocator: SequenceAllocator,
    gateway: Arc<dyn VoucherGateway>,
    config: Arc<Config>,
}

impl SubmissionService {
    pub fn new(
        pool: SqlitePool,
        locks: Arc<SequenceLocks>,
        gateway: Arc<dyn VoucherGateway>,
        config: Arc<Config>,
    ) -> Self {
        let allocator =
            SequenceAllocator::new(pool, locks, Duration::from_millis(config.lock_wait_ms));
        Self {
            allocator,
            gateway,
            config,
        }
    }

    /// Process a batch in input order; always one result per item.
    pub async fn submit_batch(&self, items: &[VoucherLineItem]) -> Vec<SubmissionResult> {
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            match self.submit_item(item).await {
                Ok(voucher_no) => {
                    results.push(SubmissionResult::accepted(&item.idempotency_key, voucher_no));
                }
                Err(message) => {
                    tracing::warn!(
                        idempotency_key = %item.idempotency_key,
                        region = %item.region,
                        voucher_type = %item.voucher_type,
                        message = %message,
                        "Voucher submission failed"
                    );
                    results.push(SubmissionResult::failed(&item.idempotency_key, message));
                }
            }
        }

        results
    }

    /// One logical voucher: validate, route, number, push
    async fn submit_item(&self, item: &VoucherLineItem) -> Result<String, String> {
        if item.idempotency_key.trim().is_empty() {
            return Err("Missing idempotencyKey".to_string());
        }

        let destination = self
            .config
            .destination(&item.region, &item.voucher_type)
            .ok_or_else(|| {
                format!(
                    "No destination configured for {}/{}",
                    item.region, item.voucher_type
                )
            })?;

        match destination.numbering {
            NumberingMode::Sequential => {
                let allocated = self
                    .allocator
                    .submit_numbered(self.gateway.as_ref(), destination, item)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(allocated.voucher_no)
            }
            NumberingMode::SourceInvoice => {
                // Purchase pathway: the source system's invoice number is
                // the voucher number, so there is no counter to contend on.
                let invoice = item
                    .invoice_no()
                    .ok_or_else(|| "Missing invoiceno for pass-through destination".to_string())?;
                let voucher_no = format!("{}/{}", destination.voucher_prefix, invoice);

                let document = item.cloud_document(&voucher_no);
                self.gateway
                    .push(destination, &document)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(voucher_no)
            }
        }
    }
}
