use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::domain_port::{LedgerRepo, StorageTx};
use std::sync::Arc;

/// Both ledgers of a pair after a mutual removal, and whether either changed.
#[derive(Debug, Clone)]
pub struct MutualRemoval {
    /// Ledger of the user the removal was issued for.
    pub entry: FriendshipLedgerEntry,
    pub removed: bool,
}

/// Checked mutations of the per-user friend lists. Every write locks both rows
/// in id order and goes through the version compare-and-swap of the repo.
#[derive(Clone)]
pub struct FriendshipLedger {
    ledger_repo: Arc<dyn LedgerRepo>,
}

impl FriendshipLedger {
    pub fn new(ledger_repo: Arc<dyn LedgerRepo>) -> Self {
        Self { ledger_repo }
    }

    /// Opens the empty ledger of a new user.
    pub async fn open_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<FriendshipLedgerEntry, RelationError> {
        self.ledger_repo.create_in_tx(tx, user_id).await
    }

    async fn lock_both(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<(FriendshipLedgerEntry, FriendshipLedgerEntry), RelationError> {
        let (min, max) = self.ledger_repo.lock_pair_in_tx(tx, pair).await?;
        match (min, max) {
            (Some(min), Some(max)) => Ok((min, max)),
            _ => Err(RelationError::NotFound("ledger")),
        }
    }

    /// Appends each user to the other's ledger. `Conflict("already_friends")`
    /// if either side already lists the other.
    pub async fn add_mutual_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        a: UserId,
        b: UserId,
    ) -> Result<(), RelationError> {
        if a == b {
            return Err(RelationError::InvalidOperation("self_reference"));
        }
        let (mut min, mut max) = self.lock_both(tx, UserPair::new(a, b)).await?;

        let max_id = max.user_id;
        let min_id = min.user_id;
        if !min.push_friend(max_id) || !max.push_friend(min_id) {
            return Err(RelationError::Conflict("already_friends"));
        }

        self.ledger_repo.save_in_tx(tx, &min).await?;
        self.ledger_repo.save_in_tx(tx, &max).await?;

        Ok(())
    }

    /// Filters each user out of the other's ledger. Removing a friendship that
    /// is not there succeeds without writing.
    pub async fn remove_mutual_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user: UserId,
        friend: UserId,
    ) -> Result<MutualRemoval, RelationError> {
        if user == friend {
            return Err(RelationError::InvalidOperation("self_reference"));
        }
        let (mut min, mut max) = self.lock_both(tx, UserPair::new(user, friend)).await?;

        let max_id = max.user_id;
        let min_id = min.user_id;
        let dropped_min = min.remove_friend(max_id);
        let dropped_max = max.remove_friend(min_id);

        if dropped_min {
            min = self.ledger_repo.save_in_tx(tx, &min).await?;
        }
        if dropped_max {
            max = self.ledger_repo.save_in_tx(tx, &max).await?;
        }

        let entry = if min.user_id == user { min } else { max };
        Ok(MutualRemoval {
            entry,
            removed: dropped_min || dropped_max,
        })
    }

    /// Friend ids in insertion order. `NotFound("user")` without a ledger.
    pub async fn list_friends(&self, user_id: UserId) -> Result<Vec<UserId>, RelationError> {
        self.ledger_repo
            .get(user_id)
            .await?
            .map(|entry| entry.friends)
            .ok_or(RelationError::NotFound("user"))
    }

    pub async fn is_friend(&self, user_id: UserId, candidate: UserId) -> Result<bool, RelationError> {
        Ok(self
            .ledger_repo
            .get(user_id)
            .await?
            .is_some_and(|entry| entry.is_friend(candidate)))
    }

    pub async fn is_friend_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
        candidate: UserId,
    ) -> Result<bool, RelationError> {
        Ok(self
            .ledger_repo
            .get_in_tx(tx, user_id)
            .await?
            .is_some_and(|entry| entry.is_friend(candidate)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_port::UserRecord;
    use crate::infra_memory::{MemoryLedgerRepo, MemoryStore, MemoryTxManager};
    use crate::domain_port::TxManager;
    use uuid::Uuid;

    fn uid(n: u128) -> UserId {
        UserId(Uuid::from_u128(n))
    }

    async fn setup(users: &[u128]) -> (FriendshipLedger, MemoryTxManager) {
        let store = MemoryStore::new();
        let repo = Arc::new(MemoryLedgerRepo::new(store.clone()));
        let tx_manager = MemoryTxManager::new(store.clone());
        for n in users {
            store
                .insert_user(UserRecord {
                    user_id: uid(*n),
                    first_name: format!("f{n}"),
                    last_name: format!("l{n}"),
                    email: format!("{n}@example.com"),
                    avatar_url: None,
                    is_online: false,
                })
                .await;
        }
        let ledger = FriendshipLedger::new(repo);
        for n in users {
            let mut tx = tx_manager.begin().await.unwrap();
            ledger.open_in_tx(&mut *tx, uid(*n)).await.unwrap();
            tx.commit().await.unwrap();
        }
        (ledger, tx_manager)
    }

    #[tokio::test]
    async fn add_mutual_links_both_sides() {
        let (ledger, tx_manager) = setup(&[1, 2]).await;

        let mut tx = tx_manager.begin().await.unwrap();
        ledger.add_mutual_in_tx(&mut *tx, uid(2), uid(1)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(ledger.list_friends(uid(1)).await.unwrap(), vec![uid(2)]);
        assert_eq!(ledger.list_friends(uid(2)).await.unwrap(), vec![uid(1)]);
        assert!(ledger.is_friend(uid(1), uid(2)).await.unwrap());
    }

    #[tokio::test]
    async fn add_mutual_twice_conflicts() {
        let (ledger, tx_manager) = setup(&[1, 2]).await;

        let mut tx = tx_manager.begin().await.unwrap();
        ledger.add_mutual_in_tx(&mut *tx, uid(1), uid(2)).await.unwrap();
        let err = ledger
            .add_mutual_in_tx(&mut *tx, uid(2), uid(1))
            .await
            .unwrap_err();
        assert_eq!(err, RelationError::Conflict("already_friends"));
    }

    #[tokio::test]
    async fn remove_mutual_is_idempotent() {
        let (ledger, tx_manager) = setup(&[1, 2]).await;

        let mut tx = tx_manager.begin().await.unwrap();
        ledger.add_mutual_in_tx(&mut *tx, uid(1), uid(2)).await.unwrap();
        let first = ledger
            .remove_mutual_in_tx(&mut *tx, uid(2), uid(1))
            .await
            .unwrap();
        let second = ledger
            .remove_mutual_in_tx(&mut *tx, uid(2), uid(1))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(first.removed);
        assert_eq!(first.entry.user_id, uid(2));
        assert!(!second.removed);
        assert_eq!(first.entry.version, second.entry.version);
        assert!(ledger.list_friends(uid(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_ledger_is_not_found() {
        let (ledger, tx_manager) = setup(&[1]).await;

        let mut tx = tx_manager.begin().await.unwrap();
        let err = ledger
            .add_mutual_in_tx(&mut *tx, uid(1), uid(9))
            .await
            .unwrap_err();
        assert_eq!(err, RelationError::NotFound("ledger"));
        drop(tx);

        assert_eq!(
            ledger.list_friends(uid(9)).await.unwrap_err(),
            RelationError::NotFound("user")
        );
    }
}
