use crate::domain_model::UserPair;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-process mutual exclusion per unordered user pair.
///
/// Storage row locks still guard against other processes; this only keeps
/// same-process writers of one pair from piling up on the database.
#[derive(Default)]
pub struct PairLocks {
    locks: DashMap<UserPair, Arc<Mutex<()>>>,
}

pub struct PairGuard<'a> {
    owner: &'a PairLocks,
    pair: UserPair,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PairLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, pair: UserPair) -> PairGuard<'_> {
        // clone the handle out so no shard lock is held across the await
        let mutex = self
            .locks
            .entry(pair)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let guard = mutex.lock_owned().await;

        PairGuard {
            owner: self,
            pair,
            guard: Some(guard),
        }
    }

    /// Number of pairs with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for PairGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // the map holds one reference; anything above that is a waiter
        self.owner
            .locks
            .remove_if(&self.pair, |_, m| Arc::strong_count(m) == 1);
    }
}
