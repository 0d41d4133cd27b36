//! POST /api/vouchers/submit — submit a voucher batch to its destination

use axum::Json;
use axum::extract::State;

use shared::error::{AppError, ErrorCode};
use shared::voucher::{MAX_SUBMIT_BATCH_ITEMS, SubmitBatchRequest, SubmitBatchResponse};

use crate::state::AppState;

/// Handle a submission batch
///
/// Every line item gets its own result, in input order; the response is
/// HTTP 200 even when individual items fail. HTTP-level failure is
/// reserved for batch-level problems (malformed body, oversized batch,
/// storage down before any item is processed).
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(request): Json<SubmitBatchRequest>,
) -> Result<Json<SubmitBatchResponse>, AppError> {
    if request.data.is_empty() {
        return Err(AppError::validation("Submission batch is empty"));
    }
    if request.data.len() > MAX_SUBMIT_BATCH_ITEMS {
        return Err(AppError::with_message(
            ErrorCode::BatchTooLarge,
            format!(
                "Batch too large: {} items (max {MAX_SUBMIT_BATCH_ITEMS})",
                request.data.len()
            ),
        ));
    }

    let results = state.submission().submit_batch(&request.data).await;

    let accepted = results.iter().filter(|r| r.ok).count();
    tracing::info!(
        total = results.len(),
        accepted,
        rejected = results.len() - accepted,
        "Submission batch processed"
    );

    Ok(Json(SubmitBatchResponse { results }))
}
