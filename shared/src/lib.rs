//! Shared types for the Voucher Bridge workspace
//!
//! Common types used across the workspace: the batch submission wire
//! protocol, row models for the numbering store, the unified error
//! system, and utility helpers.

pub mod error;
pub mod models;
pub mod util;
pub mod voucher;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use voucher::{
    MAX_SUBMIT_BATCH_ITEMS, SubmissionResult, SubmitBatchRequest, SubmitBatchResponse,
    VoucherLineItem,
};
