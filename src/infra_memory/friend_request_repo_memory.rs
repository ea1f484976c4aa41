use super::store::{MemoryStore, staged};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryFriendRequestRepo {
    store: MemoryStore,
}

impl MemoryFriendRequestRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryFriendRequestRepo { store }
    }
}

#[async_trait::async_trait]
impl FriendRequestRepo for MemoryFriendRequestRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request: &FriendRequest,
    ) -> Result<(), RelationError> {
        let state = staged(tx)?;
        let pair = request.pair();
        // same guarantee as the unique outstanding-pair key of the sql schema
        let outstanding = state
            .requests
            .values()
            .any(|r| !r.accepted && r.pair() == pair);
        if outstanding {
            return Err(RelationError::Conflict("request_outstanding"));
        }
        state.requests.insert(request.request_id, request.clone());
        Ok(())
    }

    async fn find_outstanding_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let state = staged(tx)?;
        Ok(state
            .requests
            .values()
            .find(|r| !r.accepted && r.pair() == pair)
            .cloned())
    }

    async fn get(
        &self,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        Ok(self.store.snapshot().await.requests.get(&request_id).cloned())
    }

    async fn lock_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        Ok(staged(tx)?.requests.get(&request_id).cloned())
    }

    async fn mark_accepted_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<(), RelationError> {
        let request = staged(tx)?
            .requests
            .get_mut(&request_id)
            .ok_or(RelationError::NotFound("friend_request"))?;
        if request.accepted {
            return Err(RelationError::Contended(format!(
                "request {request_id} accepted concurrently"
            )));
        }
        request.accepted = true;
        Ok(())
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<(), RelationError> {
        staged(tx)?
            .requests
            .remove(&request_id)
            .map(|_| ())
            .ok_or(RelationError::NotFound("friend_request"))
    }

    async fn list_pending(
        &self,
        user_id: UserId,
        side: RequestSide,
    ) -> Result<Vec<FriendRequest>, RelationError> {
        let state = self.store.snapshot().await;
        let mut pending: Vec<FriendRequest> = state
            .requests
            .values()
            .filter(|r| !r.accepted)
            .filter(|r| match side {
                RequestSide::Received => r.receiver == user_id,
                RequestSide::Sent => r.sender == user_id,
            })
            .cloned()
            .collect();
        pending.sort_by_key(|r| (r.created_at, r.request_id));
        Ok(pending)
    }
}
