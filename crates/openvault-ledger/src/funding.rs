//! Contribution ledger: per-project funding rows with exactly-once
//! contribution recording.
//!
//! Contributions arrive only after the external payment provider has
//! already confirmed the charge, so there is no locked intermediate state
//! here. The hard problems are exactly-once recording under duplicate
//! confirmation delivery (unique external payment id) and goal-cap
//! correctness under concurrent contributors (per-project row lock).
//!
//! Lock order is fixed: project row first, then the payment index. The
//! reverse never happens.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use openvault_types::{
    Contribution, PaymentId, ProjectFunding, ProjectId, Result, UserId, VaultError,
};
use rust_decimal::Decimal;

/// One project's funding state plus its contribution rows.
struct ProjectRow {
    funding: ProjectFunding,
    contributions: Vec<Contribution>,
}

type SharedRow = Arc<Mutex<ProjectRow>>;

/// Records contributions toward project funding goals.
pub struct FundingStore {
    projects: RwLock<HashMap<ProjectId, SharedRow>>,
    /// Unique index on the external payment id. Duplicate confirmations
    /// resolve to the contribution recorded first.
    payments: Mutex<HashMap<PaymentId, Contribution>>,
}

impl FundingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            payments: Mutex::new(HashMap::new()),
        }
    }

    /// Register a project's funding row. First registration wins; calling
    /// again for the same project is a no-op.
    pub fn register_project(&self, project: ProjectId, funding_goal: Decimal) {
        let mut projects = write_map(&self.projects);
        projects.entry(project).or_insert_with(|| {
            Arc::new(Mutex::new(ProjectRow {
                funding: ProjectFunding::with_goal(funding_goal),
                contributions: Vec::new(),
            }))
        });
    }

    /// Record a verified contribution.
    ///
    /// Exactly-once: a retried confirmation with a `payment_id` that was
    /// already recorded returns the existing [`Contribution`] without any
    /// side effects — even if the goal has since been reached.
    ///
    /// # Errors
    /// - [`VaultError::ProjectNotFound`] — no funding row registered.
    /// - [`VaultError::FundingClosed`] — funding goal not positive.
    /// - [`VaultError::GoalReached`] — project already fully funded.
    /// - [`VaultError::NonPositiveAmount`] — amount not strictly positive.
    /// - [`VaultError::OverFundingCap`] — amount exceeds the remaining
    ///   headroom (hard error, never clamped).
    pub fn record_contribution(
        &self,
        project: ProjectId,
        contributor: Option<UserId>,
        amount: Decimal,
        payment_id: PaymentId,
    ) -> Result<Contribution> {
        let row = self
            .project_row(project)
            .ok_or(VaultError::ProjectNotFound(project))?;
        let mut row = lock_row(&row);

        // Idempotency lookup comes before every other check: a duplicate
        // must stay a safe no-op even after the goal is reached.
        {
            let payments = lock_payments(&self.payments);
            if let Some(existing) = payments.get(&payment_id) {
                tracing::debug!(
                    %payment_id,
                    contribution = %existing.id,
                    "duplicate payment confirmation; returning existing contribution"
                );
                return Ok(existing.clone());
            }
        }

        if !row.funding.accepts_contributions() {
            return Err(VaultError::FundingClosed(project));
        }
        if row.funding.is_fully_funded() {
            return Err(VaultError::GoalReached(project));
        }
        if amount <= Decimal::ZERO {
            return Err(VaultError::NonPositiveAmount { amount });
        }
        let remaining = row.funding.remaining();
        if amount > remaining {
            return Err(VaultError::OverFundingCap { amount, remaining });
        }

        let contribution = Contribution::new(project, contributor, amount, payment_id.clone());

        // Insert then increment, both under the project row lock. `raised`
        // never exceeds `goal`.
        {
            let mut payments = lock_payments(&self.payments);
            payments.insert(payment_id, contribution.clone());
        }
        row.contributions.push(contribution.clone());
        row.funding.raised = (row.funding.raised + amount).min(row.funding.goal);

        tracing::info!(
            %project,
            contribution = %contribution.id,
            %amount,
            raised = %row.funding.raised,
            goal = %row.funding.goal,
            "contribution recorded"
        );
        Ok(contribution)
    }

    /// Funding progress for a project.
    ///
    /// # Errors
    /// Returns [`VaultError::ProjectNotFound`] if the project has no
    /// funding row.
    pub fn funding_progress(&self, project: ProjectId) -> Result<ProjectFunding> {
        let row = self
            .project_row(project)
            .ok_or(VaultError::ProjectNotFound(project))?;
        let row = lock_row(&row);
        Ok(row.funding)
    }

    /// All contributions recorded for a project, oldest first.
    ///
    /// # Errors
    /// Returns [`VaultError::ProjectNotFound`] if the project has no
    /// funding row.
    pub fn contributions_for(&self, project: ProjectId) -> Result<Vec<Contribution>> {
        let row = self
            .project_row(project)
            .ok_or(VaultError::ProjectNotFound(project))?;
        let row = lock_row(&row);
        Ok(row.contributions.clone())
    }

    fn project_row(&self, project: ProjectId) -> Option<SharedRow> {
        let projects = match self.projects.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        projects.get(&project).map(Arc::clone)
    }
}

impl Default for FundingStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_row(row: &Mutex<ProjectRow>) -> MutexGuard<'_, ProjectRow> {
    match row.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn lock_payments(
    payments: &Mutex<HashMap<PaymentId, Contribution>>,
) -> MutexGuard<'_, HashMap<PaymentId, Contribution>> {
    match payments.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_map(
    projects: &RwLock<HashMap<ProjectId, SharedRow>>,
) -> std::sync::RwLockWriteGuard<'_, HashMap<ProjectId, SharedRow>> {
    match projects.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
