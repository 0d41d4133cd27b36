//! Destination cloud API gateway

pub mod client;

pub use client::{CloudVoucherClient, PushRejection, VoucherGateway};
