//! Contribution and project funding types.
//!
//! A contribution is only ever recorded after the external payment provider
//! has confirmed the charge, so the record itself is immutable: one row per
//! verified payment, unique on the external payment id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ContributionId, PaymentId, ProjectId, UserId};

/// A recorded crowdfunding contribution. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    pub project_id: ProjectId,
    /// `None` for anonymous contributions.
    pub contributor: Option<UserId>,
    /// Strictly positive.
    pub amount: Decimal,
    /// Idempotency key assigned by the payment provider.
    pub payment_id: PaymentId,
    pub recorded_at: DateTime<Utc>,
}

impl Contribution {
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        contributor: Option<UserId>,
        amount: Decimal,
        payment_id: PaymentId,
    ) -> Self {
        Self {
            id: ContributionId::new(),
            project_id,
            contributor,
            amount,
            payment_id,
            recorded_at: Utc::now(),
        }
    }
}

/// The funding subset of a project: goal and amount raised so far.
///
/// `raised` is monotonically non-decreasing and capped at `goal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFunding {
    pub goal: Decimal,
    pub raised: Decimal,
}

impl ProjectFunding {
    /// A fresh funding row with nothing raised yet.
    #[must_use]
    pub fn with_goal(goal: Decimal) -> Self {
        Self {
            goal,
            raised: Decimal::ZERO,
        }
    }

    /// Whether this project accepts contributions at all (goal must be set
    /// and positive).
    #[must_use]
    pub fn accepts_contributions(&self) -> bool {
        self.goal > Decimal::ZERO
    }

    /// Whether the goal has been reached.
    #[must_use]
    pub fn is_fully_funded(&self) -> bool {
        self.raised >= self.goal
    }

    /// Headroom left before the goal. Never negative.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        (self.goal - self.raised).max(Decimal::ZERO)
    }
}
