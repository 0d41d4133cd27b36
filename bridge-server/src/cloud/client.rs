//! CloudVoucherClient — HTTP client for pushing vouchers to destination
//! cloud accounting APIs

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::DestinationConfig;

/// Rejection outcome for one pushed voucher.
///
/// Transport failures, non-2xx responses, malformed bodies, and
/// payload-level rejections all normalize into this one type so the
/// allocator's commit-on-acceptance logic has a single branch to check.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct PushRejection {
    pub message: String,
}

impl PushRejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Gateway to a destination cloud accounting API
///
/// `Ok(())` means the destination confirmed acceptance of exactly this
/// document; every other outcome is a [`PushRejection`] and must not be
/// committed.
#[async_trait]
pub trait VoucherGateway: Send + Sync {
    async fn push(
        &self,
        destination: &DestinationConfig,
        document: &Value,
    ) -> Result<(), PushRejection>;
}

/// reqwest-backed gateway
pub struct CloudVoucherClient {
    client: Client,
}

impl CloudVoucherClient {
    /// Build the client with a per-request timeout.
    ///
    /// A timed-out push is treated as a rejection (nothing committed);
    /// whether the destination processed it is unknowable here, which is
    /// why retries go through the idempotency ledger instead.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VoucherGateway for CloudVoucherClient {
    async fn push(
        &self,
        destination: &DestinationConfig,
        document: &Value,
    ) -> Result<(), PushRejection> {
        let body = serde_json::json!({ "data": [document] });

        let response = self
            .client
            .post(&destination.cloud_url)
            .header("auth-token", &destination.auth_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PushRejection::new(format!("Cloud push request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PushRejection::new(format!(
                "Cloud push failed with status {status}: {text}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PushRejection::new(format!("Failed to parse cloud response: {e}")))?;

        interpret_push_response(&payload, &destination.success_code)
    }
}

/// Interpret the destination's response envelope.
///
/// The body carries per-item status objects, either as a bare array or
/// nested under `data`. The first entry decides (one document per push);
/// numeric codes are normalized to strings before comparing with the
/// destination's configured success sentinel.
pub(crate) fn interpret_push_response(
    payload: &Value,
    success_code: &str,
) -> Result<(), PushRejection> {
    let entries = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Err(PushRejection::new("Cloud response has no status entries")),
        },
        _ => return Err(PushRejection::new("Cloud response has no status entries")),
    };

    let entry = entries
        .first()
        .ok_or_else(|| PushRejection::new("Cloud response has no status entries"))?;

    let code = match entry.get("code").or_else(|| entry.get("status")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(PushRejection::new("Cloud response entry has no status code")),
    };

    if code == success_code {
        return Ok(());
    }

    let message = entry
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("status code {code}"));
    Err(PushRejection::new(format!("Rejected by cloud: {message}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_matching_sentinel_in_data_array() {
        let payload = json!({ "data": [{ "code": "200", "message": "created" }] });
        assert!(interpret_push_response(&payload, "200").is_ok());
    }

    #[test]
    fn test_accepts_bare_array_and_status_key() {
        let payload = json!([{ "status": "101" }]);
        assert!(interpret_push_response(&payload, "101").is_ok());
    }

    #[test]
    fn test_normalizes_numeric_codes() {
        let payload = json!({ "data": [{ "code": 200 }] });
        assert!(interpret_push_response(&payload, "200").is_ok());
    }

    #[test]
    fn test_rejection_carries_cloud_message() {
        let payload = json!({ "data": [{ "code": "400", "message": "duplicate voucherno" }] });
        let err = interpret_push_response(&payload, "200").unwrap_err();
        assert!(err.message.contains("duplicate voucherno"));
    }

    #[test]
    fn test_sentinel_mismatch_without_message() {
        let payload = json!([{ "code": "500" }]);
        let err = interpret_push_response(&payload, "101").unwrap_err();
        assert!(err.message.contains("status code 500"));
    }

    #[test]
    fn test_malformed_bodies_are_rejections() {
        for payload in [json!({}), json!("ok"), json!({ "data": [] }), json!([{}])] {
            assert!(interpret_push_response(&payload, "200").is_err());
        }
    }
}
