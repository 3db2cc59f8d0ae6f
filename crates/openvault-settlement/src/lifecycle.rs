//! Withdrawal state machine: transition legality and application.
//!
//! The machine is split into *ensure* checks and *apply* mutations so the
//! engine can interleave the ledger effect between them while holding the
//! request row lock:
//!
//! ```text
//! ensure_*(&req)?           — legality, returns AlreadyProcessed on a race
//! ledger effect             — lock/unlock/debit on the wallet row
//! apply fn(&mut req, ...)   — infallible once the ensure passed
//! ```
//!
//! Apply functions never touch the ledger, and ensure functions never
//! mutate, so a failed ledger effect leaves the request exactly as found.

use chrono::{DateTime, Utc};

use openvault_types::{Actor, Result, VaultError, WithdrawalRequest, WithdrawalStatus};

use crate::gateway::PayoutReceipt;

/// An admin/auto decision over a PENDING request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

fn already_processed(req: &WithdrawalRequest) -> VaultError {
    VaultError::AlreadyProcessed {
        request_id: req.request_id,
        status: req.status,
    }
}

/// A decision (approve/reject) requires PENDING.
pub fn ensure_decidable(req: &WithdrawalRequest) -> Result<()> {
    if req.status == WithdrawalStatus::Pending {
        Ok(())
    } else {
        Err(already_processed(req))
    }
}

/// Submitting a payout requires APPROVED.
pub fn ensure_settleable(req: &WithdrawalRequest) -> Result<()> {
    if req.status == WithdrawalStatus::Approved {
        Ok(())
    } else {
        Err(already_processed(req))
    }
}

/// Reconciling a gateway-reported status requires APPROVED or PROCESSING.
pub fn ensure_reconcilable(req: &WithdrawalRequest) -> Result<()> {
    if matches!(
        req.status,
        WithdrawalStatus::Approved | WithdrawalStatus::Processing
    ) {
        Ok(())
    } else {
        Err(already_processed(req))
    }
}

/// PENDING → APPROVED. No ledger effect (funds were locked at creation).
pub fn approve(req: &mut WithdrawalRequest, actor: Actor, now: DateTime<Utc>) {
    debug_assert_eq!(req.status, WithdrawalStatus::Pending);
    req.status = WithdrawalStatus::Approved;
    req.processed_by = Some(actor);
    req.processed_at = Some(now);
    req.rejection_reason = None;
}

/// PENDING → REJECTED. The caller unlocks funds in the same atomic unit.
pub fn reject(req: &mut WithdrawalRequest, actor: Actor, reason: &str, now: DateTime<Utc>) {
    debug_assert_eq!(req.status, WithdrawalStatus::Pending);
    req.status = WithdrawalStatus::Rejected;
    req.rejection_reason = Some(reason.to_string());
    req.processed_by = Some(actor);
    req.processed_at = Some(now);
}

/// APPROVED → PROCESSING. Marks the payout as in flight so the gateway
/// call can happen without any row lock held.
pub fn begin_processing(req: &mut WithdrawalRequest) {
    debug_assert_eq!(req.status, WithdrawalStatus::Approved);
    req.status = WithdrawalStatus::Processing;
}

/// PROCESSING → APPROVED. Used when the gateway was unavailable: nothing
/// was confirmed either way, so the request returns to the retryable state.
pub fn revert_to_approved(req: &mut WithdrawalRequest) {
    debug_assert_eq!(req.status, WithdrawalStatus::Processing);
    req.status = WithdrawalStatus::Approved;
}

/// APPROVED/PROCESSING → COMPLETED. The caller debits locked funds in the
/// same atomic unit.
pub fn complete(
    req: &mut WithdrawalRequest,
    receipt: Option<&PayoutReceipt>,
    now: DateTime<Utc>,
) {
    debug_assert!(matches!(
        req.status,
        WithdrawalStatus::Approved | WithdrawalStatus::Processing
    ));
    req.status = WithdrawalStatus::Completed;
    req.processed_by = Some(Actor::System);
    req.processed_at = Some(now);
    req.rejection_reason = None;
    if let Some(receipt) = receipt {
        req.payout_id = Some(receipt.payout_id.clone());
        req.payout_status = Some(receipt.status.to_string());
    }
}

/// Any non-terminal state → FAILED. The caller unlocks funds in the same
/// atomic unit.
pub fn fail(
    req: &mut WithdrawalRequest,
    reason: &str,
    receipt: Option<&PayoutReceipt>,
    now: DateTime<Utc>,
) {
    debug_assert!(!req.status.is_terminal());
    req.status = WithdrawalStatus::Failed;
    req.rejection_reason = Some(reason.to_string());
    req.processed_by = Some(Actor::System);
    req.processed_at = Some(now);
    if let Some(receipt) = receipt {
        req.payout_id = Some(receipt.payout_id.clone());
        req.payout_status = Some(receipt.status.to_string());
    }
}

/// Mirror an in-flight gateway answer onto the request without changing
/// lifecycle state.
pub fn record_in_flight(req: &mut WithdrawalRequest, receipt: &PayoutReceipt) {
    debug_assert_eq!(req.status, WithdrawalStatus::Processing);
    req.payout_id = Some(receipt.payout_id.clone());
    req.payout_status = Some(receipt.status.to_string());
}
