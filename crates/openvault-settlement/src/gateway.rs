//! Payout gateway adapter boundary.
//!
//! The gateway is an external collaborator: it moves real money and is
//! consumed, not implemented, here. This module fixes its contract:
//!
//! - [`PayoutGateway::submit`] takes a destination/amount/currency/reference
//!   and returns a payout id plus a [`PayoutStatus`].
//! - Raw status strings are parsed into the closed [`PayoutStatus`] enum at
//!   this boundary and never propagated inward.
//! - Adapters must bound the call by the configured gateway timeout and
//!   report an overrun as [`GatewayError::Timeout`], never as a rejection.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use openvault_types::{PayoutDestination, RequestId};

/// Closed set of payout states a gateway can report.
///
/// `Processed` is the only success-terminal; `Failed` and `Reversed` are
/// failure-terminals; everything else means the payout is still in flight
/// and will be confirmed by a later reconciliation or webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutStatus {
    Queued,
    Processing,
    Processed,
    Failed,
    Reversed,
}

impl PayoutStatus {
    /// Whether this status terminally confirms the payout succeeded.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Whether this status terminally confirms the payout failed.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Reversed)
    }

    /// Still awaiting a terminal confirmation.
    #[must_use]
    pub fn is_in_flight(self) -> bool {
        !self.is_success() && !self.is_failure()
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Failed => "failed",
            Self::Reversed => "reversed",
        };
        write!(f, "{s}")
    }
}

/// Raised when a gateway reports a status string outside the closed set.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown payout status: {0:?}")]
pub struct UnknownPayoutStatus(pub String);

impl FromStr for PayoutStatus {
    type Err = UnknownPayoutStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            "reversed" => Ok(Self::Reversed),
            other => Err(UnknownPayoutStatus(other.to_string())),
        }
    }
}

/// What the engine hands an adapter to execute one payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSubmission {
    pub destination: PayoutDestination,
    pub amount: Decimal,
    pub currency: String,
    /// The withdrawal request id, passed through as the gateway reference
    /// so the payout can be traced back.
    pub reference: RequestId,
}

/// A gateway's answer to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutReceipt {
    /// External payout identifier assigned by the gateway.
    pub payout_id: String,
    pub status: PayoutStatus,
}

/// Adapter-level failures, classified by what the engine may safely assume.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The call exceeded the configured bound. The payout may or may not
    /// have been accepted; the request stays APPROVED for a retry.
    #[error("gateway call timed out")]
    Timeout,

    /// The gateway could not be reached. Retryable.
    #[error("gateway unreachable: {reason}")]
    Unavailable { reason: String },

    /// The gateway definitively refused the payout. Terminal.
    #[error("gateway rejected payout: {reason}")]
    Rejected { reason: String },

    /// The gateway answered with something unusable (unknown status,
    /// unparsable body). No usable state was returned, so the engine fails
    /// the request open: FAILED with funds unlocked.
    #[error("malformed gateway response: {reason}")]
    Malformed { reason: String },
}

impl GatewayError {
    /// Whether the submission may be retried unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unavailable { .. })
    }
}

/// The narrow contract every payout adapter implements.
///
/// Implementations wrap a real transport (HTTP client, queue) and must:
/// - bound `submit` by the engine's configured timeout,
/// - translate raw status strings via [`PayoutStatus::from_str`] and map
///   unknown values to [`GatewayError::Malformed`],
/// - never panic across this boundary.
pub trait PayoutGateway: Send + Sync {
    fn submit(&self, submission: &PayoutSubmission)
        -> Result<PayoutReceipt, GatewayError>;
}

// ---------------------------------------------------------------------------
// MockGateway — scripted adapter for tests and local development
// ---------------------------------------------------------------------------

use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted in-process gateway.
///
/// Outcomes are replayed in FIFO order; when the script is exhausted the
/// mock answers with a `processed` receipt derived from the reference.
/// Every submission is recorded for assertion.
#[derive(Default)]
pub struct MockGateway {
    script: Mutex<VecDeque<Result<PayoutReceipt, GatewayError>>>,
    submissions: Mutex<Vec<PayoutSubmission>>,
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next outcome to replay.
    pub fn enqueue(&self, outcome: Result<PayoutReceipt, GatewayError>) {
        lock(&self.script).push_back(outcome);
    }

    /// Queue a receipt with the given status and a generated payout id.
    pub fn enqueue_status(&self, status: PayoutStatus) {
        self.enqueue(Ok(PayoutReceipt {
            payout_id: format!("pout_mock_{status}"),
            status,
        }));
    }

    /// Everything submitted so far, in order.
    pub fn submissions(&self) -> Vec<PayoutSubmission> {
        lock(&self.submissions).clone()
    }
}

impl PayoutGateway for MockGateway {
    fn submit(
        &self,
        submission: &PayoutSubmission,
    ) -> Result<PayoutReceipt, GatewayError> {
        lock(&self.submissions).push(submission.clone());
        lock(&self.script).pop_front().unwrap_or_else(|| {
            Ok(PayoutReceipt {
                payout_id: format!("pout_{}", submission.reference.0.simple()),
                status: PayoutStatus::Processed,
            })
        })
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
