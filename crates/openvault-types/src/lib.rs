//! # openvault-types
//!
//! Shared types, errors, and configuration for the **OpenVault** wallet &
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`RequestId`], [`ProjectId`], [`ContributionId`], [`PaymentId`]
//! - **Balance model**: [`WalletBalance`]
//! - **Withdrawal model**: [`WithdrawalRequest`], [`WithdrawalStatus`], [`WithdrawalMethod`], [`Actor`]
//! - **Destinations**: [`PayoutDestination`] with shape validation
//! - **Contribution model**: [`Contribution`], [`ProjectFunding`]
//! - **Configuration**: [`SettlementConfig`]
//! - **Errors**: [`VaultError`] with `OV_ERR_` prefix codes

pub mod balance;
pub mod config;
pub mod constants;
pub mod contribution;
pub mod destination;
pub mod error;
pub mod ids;
pub mod withdrawal;

// Re-export all primary types at crate root for ergonomic imports:
//   use openvault_types::{WalletBalance, WithdrawalRequest, VaultError, ...};

pub use balance::*;
pub use config::*;
pub use contribution::*;
pub use destination::*;
pub use error::*;
pub use ids::*;
pub use withdrawal::*;

// Constants stay namespaced: `openvault_types::constants::FOO`.
