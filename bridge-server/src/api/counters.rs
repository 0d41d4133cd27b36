//! Numbering inspection endpoints
//!
//! Read-only views over the counter table and the idempotency ledger,
//! for finance admins checking what was actually committed.

use axum::Json;
use axum::extract::{Path, State};

use shared::error::AppError;
use shared::models::{IdempotencyRecord, VoucherCounter};

use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

/// GET /api/counters — committed sequence positions per route
pub async fn list_counters(
    State(state): State<AppState>,
) -> Result<Json<Vec<VoucherCounter>>, ServiceError> {
    let rows = db::counters::list(&state.pool).await?;
    Ok(Json(rows))
}

/// GET /api/ledger/{idempotency_key} — committed mapping for one key
pub async fn lookup_ledger(
    State(state): State<AppState>,
    Path(idempotency_key): Path<String>,
) -> Result<Json<IdempotencyRecord>, ServiceError> {
    let record = db::ledger::lookup(&state.pool, &idempotency_key)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Idempotency record {idempotency_key}")))?;
    Ok(Json(record))
}
