use super::store::{MemoryStore, staged};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryLedgerRepo {
    store: MemoryStore,
}

impl MemoryLedgerRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryLedgerRepo { store }
    }
}

#[async_trait::async_trait]
impl LedgerRepo for MemoryLedgerRepo {
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<FriendshipLedgerEntry, RelationError> {
        let state = staged(tx)?;
        if !state.users.contains_key(&user_id) {
            return Err(RelationError::NotFound("user"));
        }
        if state.ledgers.contains_key(&user_id) {
            return Err(RelationError::Conflict("ledger_exists"));
        }
        let entry = FriendshipLedgerEntry::empty(user_id);
        state.ledgers.insert(user_id, entry.clone());
        Ok(entry)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<FriendshipLedgerEntry>, RelationError> {
        Ok(self.store.snapshot().await.ledgers.get(&user_id).cloned())
    }

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<Option<FriendshipLedgerEntry>, RelationError> {
        Ok(staged(tx)?.ledgers.get(&user_id).cloned())
    }

    async fn lock_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<(Option<FriendshipLedgerEntry>, Option<FriendshipLedgerEntry>), RelationError>
    {
        // the transaction already owns the whole store
        let state = staged(tx)?;
        Ok((
            state.ledgers.get(&pair.min()).cloned(),
            state.ledgers.get(&pair.max()).cloned(),
        ))
    }

    async fn save_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        entry: &FriendshipLedgerEntry,
    ) -> Result<FriendshipLedgerEntry, RelationError> {
        let state = staged(tx)?;
        let stored = state
            .ledgers
            .get_mut(&entry.user_id)
            .ok_or(RelationError::NotFound("ledger"))?;
        if stored.version != entry.version {
            return Err(RelationError::Contended(format!(
                "ledger {} moved from version {} to {}",
                entry.user_id, entry.version, stored.version
            )));
        }
        stored.friends = entry.friends.clone();
        stored.version += 1;
        Ok(stored.clone())
    }
}
