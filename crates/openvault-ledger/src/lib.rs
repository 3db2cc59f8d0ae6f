//! # openvault-ledger
//!
//! **Ledger Store**: the persistent balance state every other component
//! mutates through.
//!
//! Two row families live here:
//!
//! 1. [`WalletStore`] — per-user wallet rows (`withdrawable` / `locked`),
//!    mutated only under that single row's exclusive lock. The settlement
//!    engine drives `lock_funds` / `unlock_funds` / `debit_locked` through
//!    it; contributions and refunds arrive via `credit_withdrawable`.
//! 2. [`FundingStore`] — per-project funding rows plus the contribution
//!    table with its unique external-payment-id index.
//!
//! Neither store ever locks two unrelated rows in one operation, which
//! keeps lock acquisition trivially deadlock-free.

pub mod funding;
pub mod wallet_store;

pub use funding::FundingStore;
pub use wallet_store::WalletStore;
