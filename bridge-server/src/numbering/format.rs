//! Voucher number formatting

/// Format a sequence number as its display voucher number.
///
/// The numeric part is zero-padded to a minimum of three digits; larger
/// numbers keep their natural width. The prefix is fixed per
/// destination ("AQNS" for Nepal Sales).
pub fn format_voucher_no(prefix: &str, n: i64) -> String {
    format!("{prefix}/{n:03}")
}
