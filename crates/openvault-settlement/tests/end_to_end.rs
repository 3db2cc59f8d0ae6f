//! End-to-end integration tests across the ledger and settlement crates.
//!
//! These tests exercise the full withdrawal lifecycle:
//! wallet -> request -> admin decision -> gateway payout -> reconciliation
//!
//! They verify realistic scenarios: rejection restoring balances, gateway
//! outages and retries, bulk admin actions, crowdfunding goal caps, and
//! conservation of money under concurrent load.

use std::sync::Arc;

use rust_decimal::Decimal;

use openvault_ledger::{FundingStore, WalletStore};
use openvault_settlement::{
    Decision, GatewayError, MockGateway, PayoutGateway, PayoutReceipt, PayoutStatus,
    SettlementEngine,
};
use openvault_types::{
    Actor, PaymentId, PayoutDestination, ProjectId, SettlementConfig, UserId, VaultError,
    WithdrawalStatus,
};

fn money(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Helper: wallet store, scriptable gateway, and an engine wired over both.
struct Harness {
    wallets: Arc<WalletStore>,
    gateway: Arc<MockGateway>,
    engine: SettlementEngine,
}

impl Harness {
    fn new() -> Self {
        let wallets = Arc::new(WalletStore::new());
        let gateway = Arc::new(MockGateway::new());
        let engine = SettlementEngine::new(
            SettlementConfig::default(),
            Arc::clone(&wallets),
            Arc::clone(&gateway) as Arc<dyn PayoutGateway>,
        );
        Self {
            wallets,
            gateway,
            engine,
        }
    }

    fn fund(&self, minor: i64) -> UserId {
        let user = UserId::new();
        self.wallets
            .credit_withdrawable(user, money(minor))
            .expect("credit should succeed");
        user
    }

    fn upi(&self) -> PayoutDestination {
        PayoutDestination::Upi {
            handle: "asha@okaxis".into(),
        }
    }

    fn bank(&self) -> PayoutDestination {
        PayoutDestination::Bank {
            account_name: "Asha Rao".into(),
            account_number: "001234567890".into(),
            ifsc: "HDFC0001234".into(),
        }
    }
}

#[test]
fn reject_restores_the_exact_locked_amount() {
    let h = Harness::new();
    let user = h.fund(10000); // 100.00

    let req = h
        .engine
        .request_withdrawal(user, money(4000), h.bank())
        .unwrap();
    let wallet = h.engine.wallet_balance(user);
    assert_eq!(wallet.withdrawable, money(6000));
    assert_eq!(wallet.locked, money(4000));

    let rejected = h
        .engine
        .decide_withdrawal(
            req.request_id,
            Decision::Reject,
            Actor::Admin(UserId::new()),
            Some("bad IFSC"),
        )
        .unwrap();
    assert_eq!(rejected.status, WithdrawalStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("bad IFSC"));
    assert!(rejected.processed_at.is_some());

    let wallet = h.engine.wallet_balance(user);
    assert_eq!(wallet.withdrawable, money(10000));
    assert_eq!(wallet.locked, Decimal::ZERO);
}

#[test]
fn approve_and_settle_debits_locked_funds_exactly_once() {
    let h = Harness::new();
    let user = h.fund(10000);
    let admin = Actor::Admin(UserId::new());

    let req = h
        .engine
        .request_withdrawal(user, money(4000), h.upi())
        .unwrap();
    let approved = h
        .engine
        .decide_withdrawal(req.request_id, Decision::Approve, admin, None)
        .unwrap();
    assert_eq!(approved.status, WithdrawalStatus::Approved);
    assert_eq!(approved.processed_by, Some(admin));

    h.gateway.enqueue_status(PayoutStatus::Processed);
    let settled = h.engine.settle_payout(req.request_id).unwrap();
    assert_eq!(settled.status, WithdrawalStatus::Completed);
    assert!(settled.payout_id.is_some());
    assert_eq!(settled.payout_status.as_deref(), Some("processed"));

    let wallet = h.engine.wallet_balance(user);
    assert_eq!(wallet.withdrawable, money(6000));
    assert_eq!(wallet.locked, Decimal::ZERO);

    // Settling again is a benign no-op error, no double debit.
    let err = h.engine.settle_payout(req.request_id).unwrap_err();
    assert!(matches!(err, VaultError::AlreadyProcessed { .. }));
    assert_eq!(h.engine.wallet_balance(user).total(), money(6000));
}

#[test]
fn gateway_outage_keeps_funds_locked_until_retry_lands() {
    let h = Harness::new();
    let user = h.fund(5000);

    let req = h
        .engine
        .request_withdrawal(user, money(5000), h.upi())
        .unwrap();
    h.engine
        .decide_withdrawal(req.request_id, Decision::Approve, Actor::System, None)
        .unwrap();

    h.gateway.enqueue(Err(GatewayError::Timeout));
    h.gateway.enqueue(Err(GatewayError::Unavailable {
        reason: "connection refused".into(),
    }));
    for _ in 0..2 {
        let err = h.engine.settle_payout(req.request_id).unwrap_err();
        assert!(matches!(err, VaultError::GatewayUnavailable { .. }));
        assert!(err.is_retryable());
        // Request is back in APPROVED, money still locked.
        let wallet = h.engine.wallet_balance(user);
        assert_eq!(wallet.locked, money(5000));
        assert_eq!(wallet.withdrawable, Decimal::ZERO);
    }

    h.gateway.enqueue_status(PayoutStatus::Processed);
    let settled = h.engine.settle_payout(req.request_id).unwrap();
    assert_eq!(settled.status, WithdrawalStatus::Completed);
    assert_eq!(h.engine.wallet_balance(user).total(), Decimal::ZERO);
    // Three submissions crossed the wire in total.
    assert_eq!(h.gateway.submissions().len(), 3);
}

#[test]
fn gateway_rejection_fails_the_request_and_returns_funds() {
    let h = Harness::new();
    let user = h.fund(5000);

    let req = h
        .engine
        .request_withdrawal(user, money(3000), h.bank())
        .unwrap();
    h.engine
        .decide_withdrawal(req.request_id, Decision::Approve, Actor::System, None)
        .unwrap();

    h.gateway.enqueue(Err(GatewayError::Rejected {
        reason: "beneficiary account closed".into(),
    }));
    let err = h.engine.settle_payout(req.request_id).unwrap_err();
    assert!(matches!(err, VaultError::GatewayRejected { .. }));
    assert!(!err.is_retryable());

    let history = h.engine.withdrawal_history(user);
    assert_eq!(history[0].status, WithdrawalStatus::Failed);

    let wallet = h.engine.wallet_balance(user);
    assert_eq!(wallet.withdrawable, money(5000));
    assert_eq!(wallet.locked, Decimal::ZERO);
}

#[test]
fn withdrawal_amount_boundaries() {
    let h = Harness::new();
    let user = h.fund(10000);

    // Exact balance is allowed.
    let req = h
        .engine
        .request_withdrawal(user, money(10000), h.upi())
        .unwrap();
    assert_eq!(req.amount, money(10000));
    assert_eq!(h.engine.wallet_balance(user).withdrawable, Decimal::ZERO);

    // One paisa over the remaining balance is not.
    let err = h
        .engine
        .request_withdrawal(user, money(100), h.upi())
        .unwrap_err();
    assert!(matches!(err, VaultError::InsufficientBalance { .. }));

    // Exactly the minimum is allowed once funds return.
    h.engine
        .decide_withdrawal(
            req.request_id,
            Decision::Reject,
            Actor::System,
            Some("test teardown"),
        )
        .unwrap();
    let at_min = h
        .engine
        .request_withdrawal(user, money(100), h.upi())
        .unwrap();
    assert_eq!(at_min.amount, money(100));
    // One paisa under the minimum is not.
    let err = h
        .engine
        .request_withdrawal(user, money(99), h.upi())
        .unwrap_err();
    assert!(matches!(err, VaultError::BelowMinimumWithdrawal { .. }));
}

#[test]
fn concurrent_decisions_apply_exactly_once() {
    let h = Harness::new();
    let user = h.fund(10000);
    let req = h
        .engine
        .request_withdrawal(user, money(4000), h.upi())
        .unwrap();

    let engine = &h.engine;
    let applied = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(move || {
                    engine
                        .decide_withdrawal(
                            req.request_id,
                            Decision::Reject,
                            Actor::System,
                            Some("duplicate admin click"),
                        )
                        .is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(false))
            .filter(|ok| *ok)
            .count()
    });

    // Exactly one rejection landed, so funds were unlocked exactly once.
    assert_eq!(applied, 1);
    let wallet = h.engine.wallet_balance(user);
    assert_eq!(wallet.withdrawable, money(10000));
    assert_eq!(wallet.locked, Decimal::ZERO);
}

#[test]
fn bulk_decide_counts_mixed_outcomes() {
    let h = Harness::new();
    let admin = Actor::Admin(UserId::new());

    let alice = h.fund(10000);
    let bob = h.fund(10000);
    let a = h
        .engine
        .request_withdrawal(alice, money(2000), h.upi())
        .unwrap();
    let b = h
        .engine
        .request_withdrawal(bob, money(3000), h.bank())
        .unwrap();
    let c = h
        .engine
        .request_withdrawal(bob, money(1000), h.upi())
        .unwrap();
    // c was already rejected before the bulk action ran.
    h.engine
        .decide_withdrawal(c.request_id, Decision::Reject, Actor::System, Some("stale"))
        .unwrap();

    let report = h.engine.bulk_decide(
        &[a.request_id, b.request_id, c.request_id],
        Decision::Approve,
        admin,
    );
    assert_eq!(report.applied(), 2);
    assert_eq!(report.already_processed(), 1);
    assert_eq!(report.failed(), 0);

    // The race item was left untouched and the applied ones are APPROVED.
    for id in [a.request_id, b.request_id] {
        let history_status = h
            .engine
            .withdrawal_history(if id == a.request_id { alice } else { bob })
            .into_iter()
            .find(|r| r.request_id == id)
            .map(|r| r.status);
        assert_eq!(history_status, Some(WithdrawalStatus::Approved));
    }
}

#[test]
fn history_is_newest_first_and_complete() {
    let h = Harness::new();
    let user = h.fund(10000);

    let first = h
        .engine
        .request_withdrawal(user, money(1000), h.upi())
        .unwrap();
    let second = h
        .engine
        .request_withdrawal(user, money(2000), h.upi())
        .unwrap();
    h.engine
        .decide_withdrawal(first.request_id, Decision::Reject, Actor::System, Some("dup"))
        .unwrap();

    let history = h.engine.withdrawal_history(user);
    assert_eq!(history.len(), 2);
    assert!(history[0].requested_at >= history[1].requested_at);
    // The listing reflects current state, not the state at creation.
    let first_row = history
        .iter()
        .find(|r| r.request_id == first.request_id)
        .unwrap();
    assert_eq!(first_row.status, WithdrawalStatus::Rejected);

    assert_eq!(h.engine.pending_requests(), vec![second.request_id]);
}

#[test]
fn queued_payout_completes_through_reconciliation() {
    let h = Harness::new();
    let user = h.fund(5000);

    let req = h
        .engine
        .request_withdrawal(user, money(5000), h.bank())
        .unwrap();
    h.engine
        .decide_withdrawal(req.request_id, Decision::Approve, Actor::System, None)
        .unwrap();

    h.gateway.enqueue(Ok(PayoutReceipt {
        payout_id: "pout_webhook".into(),
        status: PayoutStatus::Queued,
    }));
    let in_flight = h.engine.settle_payout(req.request_id).unwrap();
    assert_eq!(in_flight.status, WithdrawalStatus::Processing);
    assert_eq!(in_flight.payout_id.as_deref(), Some("pout_webhook"));
    assert_eq!(h.engine.wallet_balance(user).locked, money(5000));

    // Provider later reports a reversal; funds come back.
    let failed = h
        .engine
        .reconcile_payout(
            req.request_id,
            &PayoutReceipt {
                payout_id: "pout_webhook".into(),
                status: PayoutStatus::Reversed,
            },
        )
        .unwrap();
    assert_eq!(failed.status, WithdrawalStatus::Failed);
    assert_eq!(failed.payout_status.as_deref(), Some("reversed"));

    let wallet = h.engine.wallet_balance(user);
    assert_eq!(wallet.withdrawable, money(5000));
    assert_eq!(wallet.locked, Decimal::ZERO);
}

#[test]
fn money_is_conserved_under_a_concurrent_withdrawal_storm() {
    let h = Harness::new();
    let user = h.fund(10000); // 100.00
    let engine = &h.engine;

    // Every payout the gateway sees succeeds by default, and 20 workers
    // race to withdraw 10.00 each from a 100.00 wallet.
    let completed = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..20)
            .map(|_| {
                scope.spawn(move || {
                    let req = engine.request_withdrawal(
                        user,
                        money(1000),
                        PayoutDestination::Upi {
                            handle: "asha@okaxis".into(),
                        },
                    )?;
                    engine.decide_withdrawal(
                        req.request_id,
                        Decision::Approve,
                        Actor::System,
                        None,
                    )?;
                    engine.settle_payout(req.request_id)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().map(|r| r.is_ok()).unwrap_or(false))
            .filter(|ok| *ok)
            .count()
    });

    // Exactly ten withdrawals fit into the balance.
    assert_eq!(completed, 10);
    let wallet = h.engine.wallet_balance(user);
    assert_eq!(wallet.withdrawable, Decimal::ZERO);
    assert_eq!(wallet.locked, Decimal::ZERO);
    assert_eq!(h.gateway.submissions().len(), 10);
}

#[test]
fn crowdfunding_contributions_respect_the_goal_and_idempotency() {
    let funding = FundingStore::new();
    let project = ProjectId::new();
    funding.register_project(project, money(50000)); // goal 500.00

    let asha = UserId::new();
    let first = funding
        .record_contribution(
            project,
            Some(asha),
            money(45000),
            PaymentId::new("p1"),
        )
        .unwrap();
    assert_eq!(first.amount, money(45000));

    let second = funding
        .record_contribution(project, None, money(5000), PaymentId::new("p2"))
        .unwrap();
    assert!(second.contributor.is_none());

    let progress = funding.funding_progress(project).unwrap();
    assert!(progress.is_fully_funded());
    assert_eq!(progress.raised, money(50000));

    // Replayed payment p1 resolves to the original row even though the
    // goal has been reached since.
    let replay = funding
        .record_contribution(
            project,
            Some(asha),
            money(45000),
            PaymentId::new("p1"),
        )
        .unwrap();
    assert_eq!(replay.id, first.id);
    assert_eq!(funding.funding_progress(project).unwrap().raised, money(50000));

    // A genuinely new payment is refused.
    let err = funding
        .record_contribution(project, None, money(100), PaymentId::new("p3"))
        .unwrap_err();
    assert!(matches!(err, VaultError::GoalReached(_)));

    let rows = funding.contributions_for(project).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].payment_id, PaymentId::new("p1"));
}

#[test]
fn contributions_fund_a_wallet_that_is_then_withdrawn() {
    let h = Harness::new();
    let funding = FundingStore::new();
    let project = ProjectId::new();
    let owner = UserId::new();
    funding.register_project(project, money(20000));

    funding
        .record_contribution(project, None, money(20000), PaymentId::new("p_full"))
        .unwrap();
    let raised = funding.funding_progress(project).unwrap().raised;
    h.wallets.credit_withdrawable(owner, raised).unwrap();

    let req = h.engine.request_withdrawal(owner, raised, h.bank()).unwrap();
    h.engine
        .decide_withdrawal(req.request_id, Decision::Approve, Actor::System, None)
        .unwrap();
    h.gateway.enqueue_status(PayoutStatus::Processed);
    let settled = h.engine.settle_payout(req.request_id).unwrap();

    assert_eq!(settled.status, WithdrawalStatus::Completed);
    assert_eq!(h.engine.wallet_balance(owner).total(), Decimal::ZERO);
}
