//! Error types for the OpenVault settlement engine.
//!
//! All errors use the `OV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Wallet / ledger errors
//! - 2xx: Withdrawal lifecycle errors
//! - 3xx: Validation errors
//! - 4xx: Payout gateway errors
//! - 5xx: Funding / contribution errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ProjectId, RequestId, WithdrawalStatus};

/// Central error enum for all OpenVault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    // =================================================================
    // Wallet / Ledger Errors (1xx)
    // =================================================================
    /// Not enough withdrawable balance to lock the requested amount.
    #[error("OV_ERR_100: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// Not enough locked balance to unlock or debit. Guards against
    /// double-unlock and double-debit.
    #[error("OV_ERR_101: Insufficient locked balance: need {needed}, have {locked}")]
    InsufficientLocked { needed: Decimal, locked: Decimal },

    // =================================================================
    // Withdrawal Lifecycle Errors (2xx)
    // =================================================================
    /// No withdrawal request with this public identifier.
    #[error("OV_ERR_200: Withdrawal request not found: {0}")]
    RequestNotFound(RequestId),

    /// The request is not in the source state the transition requires.
    /// Signals a benign race (two approvals, a retried webhook); no
    /// mutation was performed.
    #[error("OV_ERR_201: Request {request_id} already processed (status {status})")]
    AlreadyProcessed {
        request_id: RequestId,
        status: WithdrawalStatus,
    },

    /// Rejection requires a reason for the audit record.
    #[error("OV_ERR_202: Rejection reason required for request {0}")]
    RejectionReasonRequired(RequestId),

    // =================================================================
    // Validation Errors (3xx)
    // =================================================================
    /// Amount must be strictly positive.
    #[error("OV_ERR_300: Non-positive amount: {amount}")]
    NonPositiveAmount { amount: Decimal },

    /// Amount is below the configured minimum withdrawal.
    #[error("OV_ERR_301: Amount {amount} below minimum withdrawal {minimum}")]
    BelowMinimumWithdrawal { amount: Decimal, minimum: Decimal },

    /// Destination details failed shape validation.
    #[error("OV_ERR_302: Invalid payout destination: {reason}")]
    InvalidDestination { reason: String },

    // =================================================================
    // Payout Gateway Errors (4xx)
    // =================================================================
    /// Transient gateway failure (timeout, unreachable). The request stays
    /// APPROVED with funds locked; the caller may retry settlement.
    #[error("OV_ERR_400: Payout gateway unavailable: {reason}")]
    GatewayUnavailable { reason: String },

    /// The gateway definitively rejected the payout. The request is FAILED
    /// and funds have been unlocked.
    #[error("OV_ERR_401: Payout rejected by gateway: {reason}")]
    GatewayRejected { reason: String },

    // =================================================================
    // Funding / Contribution Errors (5xx)
    // =================================================================
    /// No funding row registered for this project.
    #[error("OV_ERR_500: Project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The project has no positive funding goal; contributions are not
    /// accepted.
    #[error("OV_ERR_501: Project {0} is not accepting contributions")]
    FundingClosed(ProjectId),

    /// The funding goal has already been reached.
    #[error("OV_ERR_502: Project {0} is already fully funded")]
    GoalReached(ProjectId),

    /// The contribution would overshoot the funding goal. Hard error,
    /// never silently clamped.
    #[error("OV_ERR_503: Contribution {amount} exceeds remaining goal headroom {remaining}")]
    OverFundingCap { amount: Decimal, remaining: Decimal },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OV_ERR_900: Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Whether the caller may retry the same operation unchanged and
    /// reasonably expect it to succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GatewayUnavailable { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, VaultError>;
