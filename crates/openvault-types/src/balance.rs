//! Wallet balance types.
//!
//! Every user has a `withdrawable` balance (usable for new withdrawal
//! requests) and a `locked` balance (held by withdrawal requests awaiting
//! approval or payout). Both fields are non-negative at all times; the
//! ledger store enforces this on every mutation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single wallet row for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletBalance {
    /// Available for new withdrawal requests.
    pub withdrawable: Decimal,
    /// Held by pending/approved/in-flight withdrawal requests.
    pub locked: Decimal,
}

impl WalletBalance {
    /// Create a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            withdrawable: Decimal::ZERO,
            locked: Decimal::ZERO,
        }
    }

    /// Total balance (withdrawable + locked). The only externally
    /// meaningful aggregate.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.withdrawable + self.locked
    }

    /// Whether this wallet holds no money at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.withdrawable.is_zero() && self.locked.is_zero()
    }
}

impl Default for WalletBalance {
    fn default() -> Self {
        Self::new()
    }
}
