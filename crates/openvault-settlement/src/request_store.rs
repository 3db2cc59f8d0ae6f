//! Withdrawal request table with row-level locking and secondary indexes.
//!
//! Rows are `Arc<Mutex<WithdrawalRequest>>` handles: the engine locks a
//! request row for the duration of a transition, the in-memory equivalent
//! of `SELECT ... FOR UPDATE` on the request table. Secondary indexes
//! (by user, by status) serve history listings and the admin "find all
//! PENDING" query without scanning rows.
//!
//! Requests are append-only audit records: inserted once, never removed.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use openvault_types::{RequestId, UserId, WithdrawalRequest, WithdrawalStatus};

type RequestRow = Arc<Mutex<WithdrawalRequest>>;

/// Persistent-style store for withdrawal requests.
pub struct RequestStore {
    rows: RwLock<HashMap<RequestId, RequestRow>>,
    by_user: RwLock<HashMap<UserId, Vec<RequestId>>>,
    by_status: Mutex<HashMap<WithdrawalStatus, BTreeSet<RequestId>>>,
}

impl RequestStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            by_user: RwLock::new(HashMap::new()),
            by_status: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a freshly created request and index it.
    pub fn insert(&self, request: WithdrawalRequest) {
        let id = request.request_id;
        let user = request.user_id;
        let status = request.status;

        {
            let mut rows = write_guard(&self.rows);
            rows.insert(id, Arc::new(Mutex::new(request)));
        }
        {
            let mut by_user = write_guard(&self.by_user);
            by_user.entry(user).or_default().push(id);
        }
        lock_guard(&self.by_status)
            .entry(status)
            .or_default()
            .insert(id);
    }

    /// Row handle for a request, if it exists. The caller locks it for the
    /// duration of the transition.
    pub fn row(&self, id: RequestId) -> Option<RequestRow> {
        read_guard(&self.rows).get(&id).map(Arc::clone)
    }

    /// Point-in-time copy of a request.
    pub fn snapshot(&self, id: RequestId) -> Option<WithdrawalRequest> {
        self.row(id).map(|row| lock_guard(&row).clone())
    }

    /// Move a request between status index buckets. Called by the engine
    /// immediately after applying a transition, while the row lock is
    /// still held, so index and row never diverge visibly.
    pub fn reindex(&self, id: RequestId, from: WithdrawalStatus, to: WithdrawalStatus) {
        let mut by_status = lock_guard(&self.by_status);
        if let Some(bucket) = by_status.get_mut(&from) {
            bucket.remove(&id);
        }
        by_status.entry(to).or_default().insert(id);
    }

    /// All requests for a user, newest first.
    pub fn history(&self, user: UserId) -> Vec<WithdrawalRequest> {
        let ids: Vec<RequestId> = read_guard(&self.by_user)
            .get(&user)
            .cloned()
            .unwrap_or_default();

        let rows = read_guard(&self.rows);
        let mut requests: Vec<WithdrawalRequest> = ids
            .iter()
            .filter_map(|id| rows.get(id).map(|row| lock_guard(row).clone()))
            .collect();
        requests.sort_by(|a, b| {
            b.requested_at
                .cmp(&a.requested_at)
                .then(b.request_id.cmp(&a.request_id))
        });
        requests
    }

    /// Request ids currently in the given status, in id (creation) order.
    pub fn with_status(&self, status: WithdrawalStatus) -> Vec<RequestId> {
        lock_guard(&self.by_status)
            .get(&status)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of requests ever created.
    pub fn len(&self) -> usize {
        read_guard(&self.rows).len()
    }

    /// Whether no request has been created yet.
    pub fn is_empty(&self) -> bool {
        read_guard(&self.rows).is_empty()
    }
}

impl Default for RequestStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn read_guard<T>(l: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    match l.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_guard<T>(l: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    match l.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
