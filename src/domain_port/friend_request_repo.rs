use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait FriendRequestRepo: Send + Sync {
    /// Fails with `Conflict` when the pair already has an outstanding request.
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request: &FriendRequest,
    ) -> Result<(), RelationError>;

    /// The unaccepted request between the pair, in either direction.
    async fn find_outstanding_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<FriendRequest>, RelationError>;

    async fn get(&self, request_id: FriendRequestId)
    -> Result<Option<FriendRequest>, RelationError>;

    /// Reads the request and holds its row lock until the transaction ends.
    async fn lock_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError>;

    async fn mark_accepted_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<(), RelationError>;

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<(), RelationError>;

    /// Pending requests of a user, oldest first.
    async fn list_pending(
        &self,
        user_id: UserId,
        side: RequestSide,
    ) -> Result<Vec<FriendRequest>, RelationError>;
}
