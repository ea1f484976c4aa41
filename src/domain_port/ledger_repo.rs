use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait LedgerRepo: Send + Sync {
    /// Fails with `Conflict` if the user already has a ledger.
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<FriendshipLedgerEntry, RelationError>;

    async fn get(&self, user_id: UserId) -> Result<Option<FriendshipLedgerEntry>, RelationError>;

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<Option<FriendshipLedgerEntry>, RelationError>;

    /// Row-locks both ledgers, lower id first. Returns `(min, max)` entries.
    async fn lock_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<(Option<FriendshipLedgerEntry>, Option<FriendshipLedgerEntry>), RelationError>;

    /// Writes `entry.friends` if the stored version still equals
    /// `entry.version`, otherwise `Contended`. Returns the entry with its new
    /// version.
    async fn save_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        entry: &FriendshipLedgerEntry,
    ) -> Result<FriendshipLedgerEntry, RelationError>;
}
