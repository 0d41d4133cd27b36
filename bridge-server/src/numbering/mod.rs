//! Voucher numbering core
//!
//! The sequence allocator and its two supports: the display formatter
//! and the per-(region, voucher type) named locks. Numbers are gapless
//! with respect to committed vouchers: a candidate that the destination
//! rejects is discarded without advancing anything, and the same value
//! is offered again on the next attempt.

pub mod allocator;
pub mod format;
pub mod locks;

pub use allocator::{AllocatedVoucher, AllocationError, SequenceAllocator};
pub use format::format_voucher_no;
pub use locks::{LockTimeout, SequenceLocks};
