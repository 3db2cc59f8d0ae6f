//! Settlement engine orchestration.
//!
//! Every public operation is safe to call from concurrent workers. The
//! engine owns the transition discipline:
//!
//! 1. Validate input shape before taking any lock.
//! 2. Acquire the request row lock, then (and only then) touch the wallet
//!    row — fixed acquisition order, so wallet/request pairs can never
//!    deadlock.
//! 3. Apply the ledger effect and the status change as one unit under the
//!    row lock; a failed ledger effect leaves the request untouched.
//! 4. Call the payout gateway with **no** row lock held: the request is
//!    marked PROCESSING first and reconciled afterward, so a slow network
//!    round trip never serializes unrelated withdrawals.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use openvault_ledger::WalletStore;
use openvault_types::{
    Actor, PayoutDestination, RequestId, Result, SettlementConfig, UserId, VaultError,
    WalletBalance, WithdrawalRequest, WithdrawalStatus, constants,
};

use crate::bulk::{BulkItemOutcome, BulkReport};
use crate::gateway::{GatewayError, PayoutGateway, PayoutSubmission};
use crate::lifecycle::{self, Decision};
use crate::request_store::RequestStore;

/// Orchestrates the withdrawal lifecycle against the ledger store and the
/// payout gateway.
pub struct SettlementEngine {
    config: SettlementConfig,
    wallets: Arc<WalletStore>,
    requests: RequestStore,
    gateway: Arc<dyn PayoutGateway>,
}

impl SettlementEngine {
    /// Build an engine over a shared wallet store and a gateway adapter.
    /// All tunables come in through `config`; nothing is read from ambient
    /// globals.
    #[must_use]
    pub fn new(
        config: SettlementConfig,
        wallets: Arc<WalletStore>,
        gateway: Arc<dyn PayoutGateway>,
    ) -> Self {
        Self {
            config,
            wallets,
            requests: RequestStore::new(),
            gateway,
        }
    }

    /// The configuration this engine was built with.
    #[must_use]
    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // User-facing operations
    // ------------------------------------------------------------------

    /// Submit a withdrawal request: validate, lock funds, create PENDING.
    ///
    /// # Errors
    /// - [`VaultError::NonPositiveAmount`] / [`VaultError::BelowMinimumWithdrawal`]
    /// - [`VaultError::InvalidDestination`]
    /// - [`VaultError::InsufficientBalance`] — nothing is created.
    pub fn request_withdrawal(
        &self,
        user: UserId,
        amount: Decimal,
        destination: PayoutDestination,
    ) -> Result<WithdrawalRequest> {
        if amount <= Decimal::ZERO {
            return Err(VaultError::NonPositiveAmount { amount });
        }
        if amount < self.config.min_withdrawal {
            return Err(VaultError::BelowMinimumWithdrawal {
                amount,
                minimum: self.config.min_withdrawal,
            });
        }
        destination.validate()?;

        // Lock funds first; request creation cannot fail afterward, so
        // balance and request state stay consistent.
        self.wallets.lock_funds(user, amount)?;
        let request = WithdrawalRequest::new(user, amount, destination);
        self.requests.insert(request.clone());

        tracing::info!(
            request = %request.request_id,
            %user,
            %amount,
            method = %request.method,
            "withdrawal requested, funds locked"
        );
        Ok(request)
    }

    /// Wallet balance for a user, creating the wallet lazily.
    pub fn wallet_balance(&self, user: UserId) -> WalletBalance {
        self.wallets.get_or_create(user)
    }

    /// A user's withdrawal history, newest first. Always reflects the true
    /// current state of each request.
    pub fn withdrawal_history(&self, user: UserId) -> Vec<WithdrawalRequest> {
        self.requests.history(user)
    }

    // ------------------------------------------------------------------
    // Admin operations
    // ------------------------------------------------------------------

    /// Approve or reject a PENDING request.
    ///
    /// # Errors
    /// - [`VaultError::RequestNotFound`]
    /// - [`VaultError::AlreadyProcessed`] — benign race, no mutation.
    /// - [`VaultError::RejectionReasonRequired`] — rejecting without a reason.
    pub fn decide_withdrawal(
        &self,
        id: RequestId,
        decision: Decision,
        actor: Actor,
        reason: Option<&str>,
    ) -> Result<WithdrawalRequest> {
        let row = self.requests.row(id).ok_or(VaultError::RequestNotFound(id))?;
        let mut req = lock(&row);
        lifecycle::ensure_decidable(&req)?;

        match decision {
            Decision::Approve => {
                lifecycle::approve(&mut req, actor, Utc::now());
                self.requests
                    .reindex(id, WithdrawalStatus::Pending, WithdrawalStatus::Approved);
                tracing::info!(request = %id, %actor, "withdrawal approved");
            }
            Decision::Reject => {
                let reason = reason
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or(VaultError::RejectionReasonRequired(id))?;
                self.wallets.unlock_funds(req.user_id, req.amount)?;
                lifecycle::reject(&mut req, actor, reason, Utc::now());
                self.requests
                    .reindex(id, WithdrawalStatus::Pending, WithdrawalStatus::Rejected);
                tracing::info!(request = %id, %actor, reason, "withdrawal rejected, funds unlocked");
            }
        }
        Ok(req.clone())
    }

    /// Apply one decision to many requests independently. A single
    /// request's failure never aborts the rest; `AlreadyProcessed` races
    /// are counted, not surfaced as failures.
    ///
    /// Bulk rejections record [`constants::BULK_REJECTION_REASON`]; admins
    /// refine reasons per request afterwards if needed.
    pub fn bulk_decide(
        &self,
        ids: &[RequestId],
        decision: Decision,
        actor: Actor,
    ) -> BulkReport {
        let reason = match decision {
            Decision::Approve => None,
            Decision::Reject => Some(constants::BULK_REJECTION_REASON),
        };

        let mut report = BulkReport::new();
        for &id in ids {
            let outcome = match self.decide_withdrawal(id, decision, actor, reason) {
                Ok(_) => BulkItemOutcome::Applied,
                Err(VaultError::AlreadyProcessed { .. }) => BulkItemOutcome::AlreadyProcessed,
                Err(err) => {
                    tracing::warn!(request = %id, error = %err, "bulk decision failed for request");
                    BulkItemOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };
            tracing::debug!(request = %id, ?outcome, "bulk decision item");
            report.record(id, outcome);
        }

        tracing::info!(
            total = report.items.len(),
            applied = report.applied(),
            already_processed = report.already_processed(),
            failed = report.failed(),
            "bulk decision finished"
        );
        report
    }

    /// Request ids currently awaiting a decision.
    pub fn pending_requests(&self) -> Vec<RequestId> {
        self.requests.with_status(WithdrawalStatus::Pending)
    }

    // ------------------------------------------------------------------
    // Payout settlement
    // ------------------------------------------------------------------

    /// Submit an APPROVED request's payout to the gateway and reconcile
    /// the result.
    ///
    /// The request is marked PROCESSING under its row lock, the lock is
    /// released for the gateway round trip, and the answer is reconciled
    /// under the lock again.
    ///
    /// # Errors
    /// - [`VaultError::RequestNotFound`] / [`VaultError::AlreadyProcessed`]
    /// - [`VaultError::GatewayUnavailable`] — transient; the request is
    ///   back in APPROVED with funds still locked, retry later.
    /// - [`VaultError::GatewayRejected`] — terminal; the request is FAILED
    ///   and funds have been unlocked.
    pub fn settle_payout(&self, id: RequestId) -> Result<WithdrawalRequest> {
        let row = self.requests.row(id).ok_or(VaultError::RequestNotFound(id))?;

        // Phase 1: mark in flight.
        let submission = {
            let mut req = lock(&row);
            lifecycle::ensure_settleable(&req)?;
            lifecycle::begin_processing(&mut req);
            self.requests
                .reindex(id, WithdrawalStatus::Approved, WithdrawalStatus::Processing);
            PayoutSubmission {
                destination: req.destination.clone(),
                amount: req.amount,
                currency: self.config.currency.clone(),
                reference: id,
            }
        };

        // Phase 2: network round trip, no row lock held.
        let answer = self.gateway.submit(&submission);

        // Phase 3: reconcile under the lock.
        let mut req = lock(&row);
        if req.status != WithdrawalStatus::Processing {
            // A webhook reconciliation raced us and already applied a
            // terminal state; nothing left to do.
            tracing::warn!(request = %id, status = %req.status, "payout reconciled concurrently");
            return Ok(req.clone());
        }

        match answer {
            Ok(receipt) if receipt.status.is_success() => {
                self.wallets.debit_locked(req.user_id, req.amount)?;
                lifecycle::complete(&mut req, Some(&receipt), Utc::now());
                self.requests
                    .reindex(id, WithdrawalStatus::Processing, WithdrawalStatus::Completed);
                tracing::info!(
                    request = %id,
                    payout = %receipt.payout_id,
                    "payout completed, locked funds debited"
                );
                Ok(req.clone())
            }
            Ok(receipt) if receipt.status.is_failure() => {
                let reason = format!("gateway reported payout {}", receipt.status);
                self.wallets.unlock_funds(req.user_id, req.amount)?;
                lifecycle::fail(&mut req, &reason, Some(&receipt), Utc::now());
                self.requests
                    .reindex(id, WithdrawalStatus::Processing, WithdrawalStatus::Failed);
                tracing::warn!(request = %id, payout = %receipt.payout_id, %reason, "payout failed");
                Err(VaultError::GatewayRejected { reason })
            }
            Ok(receipt) => {
                // Still in flight: mirror the gateway's answer and leave
                // PROCESSING for a later reconciliation or webhook.
                lifecycle::record_in_flight(&mut req, &receipt);
                tracing::info!(
                    request = %id,
                    payout = %receipt.payout_id,
                    status = %receipt.status,
                    "payout in flight"
                );
                Ok(req.clone())
            }
            Err(err) if err.is_retryable() => {
                lifecycle::revert_to_approved(&mut req);
                self.requests
                    .reindex(id, WithdrawalStatus::Processing, WithdrawalStatus::Approved);
                tracing::warn!(request = %id, error = %err, "gateway unavailable, will retry");
                Err(VaultError::GatewayUnavailable {
                    reason: err.to_string(),
                })
            }
            Err(err) => {
                // Rejected or malformed: no usable in-flight state came
                // back, so fail open — the user gets the funds back rather
                // than a silently stuck balance.
                let reason = err.to_string();
                self.wallets.unlock_funds(req.user_id, req.amount)?;
                lifecycle::fail(&mut req, &reason, None, Utc::now());
                self.requests
                    .reindex(id, WithdrawalStatus::Processing, WithdrawalStatus::Failed);
                tracing::warn!(request = %id, %reason, "payout rejected, funds unlocked");
                Err(VaultError::GatewayRejected { reason })
            }
        }
    }

    /// Apply a gateway-reported status to a request — the webhook path.
    ///
    /// Accepts requests in APPROVED or PROCESSING. Terminal gateway states
    /// apply the corresponding transition and ledger effect; in-flight
    /// states move an APPROVED request to PROCESSING and mirror the
    /// receipt.
    ///
    /// # Errors
    /// - [`VaultError::RequestNotFound`]
    /// - [`VaultError::AlreadyProcessed`] — the request is terminal; a
    ///   retried webhook is a safe no-op.
    pub fn reconcile_payout(
        &self,
        id: RequestId,
        receipt: &crate::gateway::PayoutReceipt,
    ) -> Result<WithdrawalRequest> {
        let row = self.requests.row(id).ok_or(VaultError::RequestNotFound(id))?;
        let mut req = lock(&row);
        lifecycle::ensure_reconcilable(&req)?;
        let previous = req.status;

        if receipt.status.is_success() {
            self.wallets.debit_locked(req.user_id, req.amount)?;
            lifecycle::complete(&mut req, Some(receipt), Utc::now());
            self.requests.reindex(id, previous, WithdrawalStatus::Completed);
            tracing::info!(request = %id, payout = %receipt.payout_id, "payout confirmed via reconciliation");
        } else if receipt.status.is_failure() {
            let reason = format!("gateway reported payout {}", receipt.status);
            self.wallets.unlock_funds(req.user_id, req.amount)?;
            lifecycle::fail(&mut req, &reason, Some(receipt), Utc::now());
            self.requests.reindex(id, previous, WithdrawalStatus::Failed);
            tracing::warn!(request = %id, payout = %receipt.payout_id, "payout failure via reconciliation");
        } else {
            if previous == WithdrawalStatus::Approved {
                lifecycle::begin_processing(&mut req);
                self.requests
                    .reindex(id, previous, WithdrawalStatus::Processing);
            }
            lifecycle::record_in_flight(&mut req, receipt);
            tracing::debug!(request = %id, status = %receipt.status, "in-flight payout status mirrored");
        }
        Ok(req.clone())
    }
}

fn lock(
    row: &std::sync::Mutex<WithdrawalRequest>,
) -> std::sync::MutexGuard<'_, WithdrawalRequest> {
    match row.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// Keep GatewayError in the public error story: adapters surface it, the
// engine translates it into VaultError at the boundary above.
impl From<GatewayError> for VaultError {
    fn from(err: GatewayError) -> Self {
        if err.is_retryable() {
            Self::GatewayUnavailable {
                reason: err.to_string(),
            }
        } else {
            Self::GatewayRejected {
                reason: err.to_string(),
            }
        }
    }
}
