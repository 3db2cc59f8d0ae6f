//! Configuration for the settlement engine.
//!
//! All tunables are passed explicitly at construction — nothing is read
//! from ambient globals or environment variables by the core.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration injected into the settlement engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Currency code submitted with every payout.
    pub currency: String,
    /// Minimum accepted withdrawal amount.
    pub min_withdrawal: Decimal,
    /// Upper bound on a single gateway call, in milliseconds. A call that
    /// exceeds this is treated as `GatewayUnavailable`, never as rejected.
    pub gateway_timeout_ms: u64,
}

impl SettlementConfig {
    /// The gateway timeout as a [`Duration`].
    #[must_use]
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            currency: constants::DEFAULT_CURRENCY.to_string(),
            min_withdrawal: Decimal::new(
                constants::DEFAULT_MIN_WITHDRAWAL_MINOR,
                constants::MONEY_SCALE,
            ),
            gateway_timeout_ms: constants::DEFAULT_GATEWAY_TIMEOUT_MS,
        }
    }
}
