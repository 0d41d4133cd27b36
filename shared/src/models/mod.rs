//! Persistence row models for the numbering store

mod idempotency_record;
mod voucher_counter;

pub use idempotency_record::IdempotencyRecord;
pub use voucher_counter::VoucherCounter;
