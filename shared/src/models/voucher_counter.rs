//! Voucher Counter Model

use serde::{Deserialize, Serialize};

/// One durable sequence row per (region, voucher type, fiscal year).
///
/// `current_no` is the last number committed after confirmed external
/// acceptance. It only ever increases; a row is never deleted and a
/// committed number is never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VoucherCounter {
    pub region: String,
    pub voucher_type: String,
    /// Empty string means the counter is not scoped to a fiscal year
    pub fiscal_year: String,
    pub current_no: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
