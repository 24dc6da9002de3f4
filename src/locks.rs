use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::AccountId;

type Slots = Arc<Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>>;

/// Per-account mutual exclusion for read-modify-write balance sequences.
///
/// Guards are taken in ascending account order, so two movements over the
/// same accounts can never wait on each other in a cycle. A slot only lives
/// while some movement holds or waits on it.
#[derive(Debug, Clone, Default)]
pub struct AccountLocks {
    slots: Slots,
}

/// Holds every account lock taken by one movement until dropped.
#[derive(Debug)]
pub struct AccountGuard {
    slots: Slots,
    held: Vec<(AccountId, OwnedMutexGuard<()>)>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: AccountId) -> Arc<AsyncMutex<()>> {
        // The map is only touched synchronously; the guard never crosses an await.
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(id).or_default().clone()
    }

    /// Number of accounts currently locked or waited on.
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub async fn lock(&self, id: AccountId) -> AccountGuard {
        self.lock_all(&[id]).await
    }

    pub async fn lock_all(&self, ids: &[AccountId]) -> AccountGuard {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        // Built up front so a cancelled acquisition still releases its slots.
        let mut guard = AccountGuard {
            slots: self.slots.clone(),
            held: Vec::with_capacity(ids.len()),
        };
        for id in ids {
            let held = self.slot(id).lock_owned().await;
            guard.held.push((id, held));
        }
        guard
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        let ids: Vec<AccountId> = self.held.drain(..).map(|(id, _)| id).collect();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        for id in ids {
            // Only the map's own handle left: nobody holds or waits on it.
            if slots.get(&id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
                slots.remove(&id);
            }
        }
    }
}
