//! Idempotency Ledger Model

use serde::{Deserialize, Serialize};

/// Append-only mapping from a caller-supplied idempotency key to the
/// voucher number the destination system accepted under it.
///
/// Created only inside the same transaction that bumps the counter.
/// Never updated, never deleted: once a key is here, resubmissions reuse
/// `voucher_no` instead of allocating again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct IdempotencyRecord {
    pub idempotency_key: String,
    pub region: String,
    pub voucher_type: String,
    pub voucher_no: String,
    pub created_at: i64,
}
