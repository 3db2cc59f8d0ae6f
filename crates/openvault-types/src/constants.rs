//! System-wide constants for the OpenVault settlement engine.

/// Decimal places used for all monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Default currency submitted to the payout gateway.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Default minimum withdrawal amount, in minor units at [`MONEY_SCALE`]
/// (100 = 1.00).
pub const DEFAULT_MIN_WITHDRAWAL_MINOR: i64 = 100;

/// Default bound on a single payout gateway call, in milliseconds.
pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 5_000;

/// Rejection reason recorded when an admin bulk action rejects a request
/// without a per-item reason.
pub const BULK_REJECTION_REASON: &str = "Rejected via admin bulk action";
