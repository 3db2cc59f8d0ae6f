//! Withdrawal request model.
//!
//! A `WithdrawalRequest` is a permanent audit record: created once when a
//! user asks to withdraw, mutated only by the settlement state machine,
//! never deleted. Lifecycle:
//!
//! ```text
//! PENDING ──► APPROVED ──► PROCESSING ──► COMPLETED
//!    │            │             │
//!    │            └──────┬──────┘
//!    ▼                   ▼
//! REJECTED            FAILED
//! ```
//!
//! `CANCELLED` is reserved for future user-initiated cancellation; no core
//! operation produces it today.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PayoutDestination, RequestId, UserId};

/// Status of a withdrawal request. Closed enum — raw gateway strings are
/// translated at the adapter boundary and never stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawalStatus {
    /// Awaiting an admin/auto decision. Funds are locked.
    Pending,
    /// Decision made; payout not yet submitted (or submission is retryable).
    Approved,
    /// Payout submitted to the gateway, awaiting confirmation.
    Processing,
    /// Payout confirmed; funds have left the system. Terminal.
    Completed,
    /// Rejected at decision time; funds returned. Terminal.
    Rejected,
    /// Payout failed or was reversed; funds returned. Terminal.
    Failed,
    /// Reserved for user-initiated cancellation. Terminal.
    Cancelled,
}

impl WithdrawalStatus {
    /// Whether no further transition may leave this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// Payout method. Derived from the destination at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawalMethod {
    Upi,
    Bank,
}

impl fmt::Display for WithdrawalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upi => write!(f, "UPI"),
            Self::Bank => write!(f, "BANK"),
        }
    }
}

/// The actor that drove a state transition: a human admin or an automated
/// process (gateway reconciliation, scheduled settlement job).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Admin(UserId),
    System,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin(id) => write!(f, "admin:{id}"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single withdrawal request and its full audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Public, immutable identity.
    pub request_id: RequestId,
    /// Owning user.
    pub user_id: UserId,
    /// Requested amount, strictly positive.
    pub amount: Decimal,
    /// Payout method (mirrors the destination variant).
    pub method: WithdrawalMethod,
    /// Where the payout goes. Exposed to listings only in masked form.
    pub destination: PayoutDestination,
    /// Current lifecycle state.
    pub status: WithdrawalStatus,
    /// When the user submitted the request.
    pub requested_at: DateTime<Utc>,
    /// When the last transition was applied.
    pub processed_at: Option<DateTime<Utc>>,
    /// Who drove the last transition.
    pub processed_by: Option<Actor>,
    /// Populated only on REJECTED / FAILED.
    pub rejection_reason: Option<String>,
    /// External payout identifier mirrored from the gateway, once known.
    pub payout_id: Option<String>,
    /// Raw-ish gateway status string mirrored for support tooling. The
    /// state machine itself never reads this.
    pub payout_status: Option<String>,
}

impl WithdrawalRequest {
    /// Create a new PENDING request. The caller is responsible for locking
    /// funds in the same atomic unit.
    #[must_use]
    pub fn new(user_id: UserId, amount: Decimal, destination: PayoutDestination) -> Self {
        Self {
            request_id: RequestId::new(),
            user_id,
            amount,
            method: destination.method(),
            destination,
            status: WithdrawalStatus::Pending,
            requested_at: Utc::now(),
            processed_at: None,
            processed_by: None,
            rejection_reason: None,
            payout_id: None,
            payout_status: None,
        }
    }

    /// Destination in masked form, for history and admin listings.
    #[must_use]
    pub fn masked_destination(&self) -> String {
        self.destination.masked()
    }
}
