//! Per-user wallet rows with row-level exclusive locking.
//!
//! The store is the in-memory realization of a wallet table accessed via
//! `SELECT ... FOR UPDATE`: every mutation acquires that single wallet's
//! exclusive lock, checks the invariant, and applies the change while the
//! lock is held. No operation ever locks two wallets at once.
//!
//! Invariant enforced on every path:
//! `withdrawable >= 0 && locked >= 0` for every wallet at all times.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use openvault_types::{Result, UserId, VaultError, WalletBalance};
use rust_decimal::Decimal;

/// Row handle shared between the map and in-flight operations.
type WalletRow = Arc<Mutex<WalletBalance>>;

/// Source of truth for all user balances.
///
/// Wallet rows are created lazily on first access and never deleted.
/// Mutations are atomic per row: either the full move succeeds or the
/// balance is unchanged.
pub struct WalletStore {
    rows: RwLock<HashMap<UserId, WalletRow>>,
}

impl WalletStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Get or lazily create the wallet for a user, returning a snapshot.
    pub fn get_or_create(&self, user: UserId) -> WalletBalance {
        snapshot(&self.row(user))
    }

    /// Snapshot of a wallet without creating it. Zero balance if the user
    /// has never been seen.
    pub fn balance(&self, user: UserId) -> WalletBalance {
        let rows = read_map(&self.rows);
        rows.get(&user).map_or_else(WalletBalance::new, |row| snapshot(row))
    }

    /// Credit the withdrawable balance. Used when contributions or refunds
    /// add money to a wallet.
    ///
    /// # Errors
    /// Returns [`VaultError::NonPositiveAmount`] if `amount <= 0`.
    pub fn credit_withdrawable(&self, user: UserId, amount: Decimal) -> Result<WalletBalance> {
        require_positive(amount)?;
        let row = self.row(user);
        let mut wallet = lock_row(&row);
        wallet.withdrawable += amount;
        Ok(wallet.clone())
    }

    /// Atomically move `amount` from withdrawable to locked.
    ///
    /// # Errors
    /// - [`VaultError::NonPositiveAmount`] if `amount <= 0`.
    /// - [`VaultError::InsufficientBalance`] if withdrawable < amount.
    pub fn lock_funds(&self, user: UserId, amount: Decimal) -> Result<WalletBalance> {
        require_positive(amount)?;
        let row = self.row(user);
        let mut wallet = lock_row(&row);

        if wallet.withdrawable < amount {
            return Err(VaultError::InsufficientBalance {
                needed: amount,
                available: wallet.withdrawable,
            });
        }

        wallet.withdrawable -= amount;
        wallet.locked += amount;
        Ok(wallet.clone())
    }

    /// Atomically move `amount` from locked back to withdrawable. Used on
    /// rejection and on payout failure.
    ///
    /// # Errors
    /// - [`VaultError::NonPositiveAmount`] if `amount <= 0`.
    /// - [`VaultError::InsufficientLocked`] if locked < amount (guards
    ///   against double-unlock).
    pub fn unlock_funds(&self, user: UserId, amount: Decimal) -> Result<WalletBalance> {
        require_positive(amount)?;
        let row = self.row(user);
        let mut wallet = lock_row(&row);

        if wallet.locked < amount {
            return Err(VaultError::InsufficientLocked {
                needed: amount,
                locked: wallet.locked,
            });
        }

        wallet.locked -= amount;
        wallet.withdrawable += amount;
        Ok(wallet.clone())
    }

    /// Permanently remove `amount` from the locked balance. Funds leave the
    /// system after a confirmed payout; nothing is added back.
    ///
    /// # Errors
    /// - [`VaultError::NonPositiveAmount`] if `amount <= 0`.
    /// - [`VaultError::InsufficientLocked`] if locked < amount (guards
    ///   against double-debit).
    pub fn debit_locked(&self, user: UserId, amount: Decimal) -> Result<WalletBalance> {
        require_positive(amount)?;
        let row = self.row(user);
        let mut wallet = lock_row(&row);

        if wallet.locked < amount {
            return Err(VaultError::InsufficientLocked {
                needed: amount,
                locked: wallet.locked,
            });
        }

        wallet.locked -= amount;
        Ok(wallet.clone())
    }

    /// Number of wallet rows that exist.
    pub fn len(&self) -> usize {
        read_map(&self.rows).len()
    }

    /// Whether no wallet has been created yet.
    pub fn is_empty(&self) -> bool {
        read_map(&self.rows).is_empty()
    }

    /// Fetch the row handle for a user, creating it lazily. The map's write
    /// lock is held only for the insertion, never across a row mutation.
    fn row(&self, user: UserId) -> WalletRow {
        if let Some(row) = read_map(&self.rows).get(&user) {
            return Arc::clone(row);
        }
        let mut rows = match self.rows.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            rows.entry(user)
                .or_insert_with(|| Arc::new(Mutex::new(WalletBalance::new()))),
        )
    }
}

impl Default for WalletStore {
    fn default() -> Self {
        Self::new()
    }
}

fn require_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(VaultError::NonPositiveAmount { amount });
    }
    Ok(())
}

/// Acquire a row lock, recovering from poisoning: a worker that panicked
/// while holding the lock must not brick the wallet for everyone else.
fn lock_row(row: &Mutex<WalletBalance>) -> MutexGuard<'_, WalletBalance> {
    match row.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn read_map(
    rows: &RwLock<HashMap<UserId, WalletRow>>,
) -> std::sync::RwLockReadGuard<'_, HashMap<UserId, WalletRow>> {
    match rows.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn snapshot(row: &Mutex<WalletBalance>) -> WalletBalance {
    lock_row(row).clone()
}
