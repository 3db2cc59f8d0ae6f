//! # openvault-settlement
//!
//! **Settlement plane**: withdrawal lifecycle orchestration, payout
//! gateway adaptation, and admin bulk operations.
//!
//! ## Architecture
//!
//! [`SettlementEngine`] drives a withdrawal through its life:
//! 1. `request_withdrawal` — validate, lock funds, create PENDING
//! 2. `decide_withdrawal` — admin approves (APPROVED) or rejects
//!    (REJECTED, funds unlocked)
//! 3. `settle_payout` — mark PROCESSING, call the gateway with no row
//!    lock held, reconcile the answer
//! 4. `reconcile_payout` — apply asynchronous gateway callbacks
//!
//! Money moves only in lockstep with a status transition: locked on
//! PENDING, debited on COMPLETED, returned on REJECTED/FAILED. Across
//! all paths `withdrawable + locked + completed` is conserved.
//!
//! ## Gateway boundary
//!
//! The engine talks to providers through the [`PayoutGateway`] trait.
//! Adapters translate provider wire formats into [`PayoutReceipt`] /
//! [`GatewayError`]; the engine never sees provider-specific types.
//! [`MockGateway`] is a scriptable in-process adapter for tests.

pub mod bulk;
pub mod engine;
pub mod gateway;
pub mod lifecycle;
pub mod request_store;

pub use bulk::{BulkItem, BulkItemOutcome, BulkReport};
pub use engine::SettlementEngine;
pub use gateway::{
    GatewayError, MockGateway, PayoutGateway, PayoutReceipt, PayoutStatus, PayoutSubmission,
};
pub use lifecycle::Decision;
pub use request_store::RequestStore;
