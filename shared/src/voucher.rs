//! Voucher batch submission protocol types
//!
//! Used by the bridge UI to push selected voucher records to
//! bridge-server, and by bridge-server to report per-item outcomes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum line items accepted in one submission batch
pub const MAX_SUBMIT_BATCH_ITEMS: usize = 200;

/// A batch of voucher line items to submit to a destination cloud API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitBatchRequest {
    /// Line items in submission order
    pub data: Vec<VoucherLineItem>,
}

/// One logical voucher to submit
///
/// Only the three routing fields are typed. Every other field (amounts,
/// ledger allocation lines, narration, dates) is carried verbatim in
/// `business` and forwarded to the destination untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherLineItem {
    /// Caller-generated token identifying this logical voucher across retries
    #[serde(rename = "idempotencyKey", default)]
    pub idempotency_key: String,
    /// Destination region, e.g. "nepal"
    #[serde(default)]
    pub region: String,
    /// Voucher type within the region, e.g. "sales" or "purchase"
    #[serde(rename = "vouchertype", default)]
    pub voucher_type: String,
    /// Business fields passed through verbatim
    #[serde(flatten)]
    pub business: Map<String, Value>,
}

impl VoucherLineItem {
    /// Build the document sent to the destination cloud API: the business
    /// fields plus the assigned voucher number.
    ///
    /// The routing fields (idempotencyKey, region, vouchertype) are
    /// internal and never go over the wire.
    pub fn cloud_document(&self, voucher_no: &str) -> Value {
        let mut doc = self.business.clone();
        doc.insert(
            "voucherno".to_string(),
            Value::String(voucher_no.to_string()),
        );
        Value::Object(doc)
    }

    /// Source-system invoice number, used by pass-through numbered
    /// destinations instead of the sequence counter
    pub fn invoice_no(&self) -> Option<String> {
        match self.business.get("invoiceno") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Per-item submission outcome, reported in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Key of the line item this result belongs to
    #[serde(rename = "idempotencyKey")]
    pub idempotency_key: String,
    /// Whether the voucher was accepted by the destination
    pub ok: bool,
    /// Assigned voucher number (present when ok)
    #[serde(rename = "voucherNo", skip_serializing_if = "Option::is_none")]
    pub voucher_no: Option<String>,
    /// Failure reason (present when not ok)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubmissionResult {
    /// Result for an accepted (or previously committed) voucher
    pub fn accepted(key: impl Into<String>, voucher_no: impl Into<String>) -> Self {
        Self {
            idempotency_key: key.into(),
            ok: true,
            voucher_no: Some(voucher_no.into()),
            message: None,
        }
    }

    /// Result for a failed voucher
    pub fn failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            idempotency_key: key.into(),
            ok: false,
            voucher_no: None,
            message: Some(message.into()),
        }
    }
}

/// Response for a submission batch
///
/// Always one result per input item, in input order; the batch itself
/// succeeds (HTTP 200) even when individual items fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitBatchResponse {
    pub results: Vec<SubmissionResult>,
}
