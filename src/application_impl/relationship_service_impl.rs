use crate::application_impl::{ConversationMaterializer, FriendshipLedger, PairLocks};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const RETRY_BACKOFF: Duration = Duration::from_millis(10);

pub struct RealRelationshipService {
    user_repo: Arc<dyn UserRepo>,
    request_repo: Arc<dyn FriendRequestRepo>,
    tx_manager: Arc<dyn TxManager>,
    ledger: FriendshipLedger,
    conversations: ConversationMaterializer,
    pair_locks: PairLocks,
    write_retry_attempts: u32,
}

impl RealRelationshipService {
    pub fn new(backend: &StorageBackend, write_retry_attempts: u32) -> Self {
        Self {
            user_repo: backend.user_repo.clone(),
            request_repo: backend.request_repo.clone(),
            tx_manager: backend.tx_manager.clone(),
            ledger: FriendshipLedger::new(backend.ledger_repo.clone()),
            conversations: ConversationMaterializer::new(backend.conversation_repo.clone()),
            pair_locks: PairLocks::new(),
            write_retry_attempts: write_retry_attempts.max(1),
        }
    }

    async fn begin(&self) -> Result<Box<dyn StorageTx>, RelationError> {
        self.tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))
    }

    /// Commits on success, rolls back on failure.
    async fn finish<T>(
        tx: Box<dyn StorageTx>,
        result: Result<T, RelationError>,
    ) -> Result<T, RelationError> {
        match result {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| RelationError::Store(e.to_string()))?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("rollback after `{e}` failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    /// Runs one transactional attempt at a time until it stops reporting
    /// `Contended`. An exhausted budget surfaces as `Conflict`.
    async fn with_retry<T, F, Fut>(&self, op: &'static str, mut attempt: F) -> Result<T, RelationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RelationError>>,
    {
        let mut tries = 0;
        loop {
            tries += 1;
            match attempt().await {
                Err(RelationError::Contended(reason)) if tries < self.write_retry_attempts => {
                    tracing::warn!(op, attempt = tries, "contended write, retrying: {reason}");
                    tokio::time::sleep(RETRY_BACKOFF * tries).await;
                }
                Err(RelationError::Contended(reason)) => {
                    tracing::warn!(op, attempts = tries, "contended write, giving up: {reason}");
                    return Err(RelationError::Conflict("concurrent_write"));
                }
                other => return other,
            }
        }
    }

    async fn ensure_both_exist(&self, a: UserId, b: UserId) -> Result<(), RelationError> {
        let (a_exists, b_exists) =
            futures_util::try_join!(self.user_repo.exists(a), self.user_repo.exists(b))?;
        if !a_exists || !b_exists {
            return Err(RelationError::NotFound("user"));
        }
        Ok(())
    }

    /// Unlocked read used to find the pair and reject obviously bad calls
    /// before taking any lock. Rechecked under lock in the transaction.
    async fn visible_request(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError> {
        let request = self
            .request_repo
            .get(request_id)
            .await?
            .filter(|r| r.is_participant(actor))
            .ok_or(RelationError::NotFound("friend_request"))?;
        if request.accepted {
            return Err(RelationError::Conflict("request_resolved"));
        }
        Ok(request)
    }

    async fn locked_pending(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError> {
        let request = self
            .request_repo
            .lock_in_tx(tx, request_id)
            .await?
            .ok_or(RelationError::NotFound("friend_request"))?;
        if request.accepted {
            return Err(RelationError::Conflict("request_resolved"));
        }
        Ok(request)
    }

    // region transactional bodies

    async fn create_ledger_once(
        &self,
        user_id: UserId,
    ) -> Result<FriendshipLedgerEntry, RelationError> {
        let mut tx = self.begin().await?;
        let result = self.ledger.open_in_tx(&mut *tx, user_id).await;
        Self::finish(tx, result).await
    }

    async fn send_once(&self, input: FriendRequestInput) -> Result<FriendRequest, RelationError> {
        let mut tx = self.begin().await?;
        let result = self.send_in_tx(&mut *tx, input).await;
        Self::finish(tx, result).await
    }

    async fn send_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        input: FriendRequestInput,
    ) -> Result<FriendRequest, RelationError> {
        if self
            .ledger
            .is_friend_in_tx(tx, input.sender, input.receiver)
            .await?
        {
            return Err(RelationError::Conflict("already_friends"));
        }

        let pair = UserPair::new(input.sender, input.receiver);
        if self
            .request_repo
            .find_outstanding_in_tx(tx, pair)
            .await?
            .is_some()
        {
            return Err(RelationError::Conflict("request_outstanding"));
        }

        let request = FriendRequest::pending(input, Utc::now());
        self.request_repo.insert_in_tx(tx, &request).await?;

        Ok(request)
    }

    async fn accept_once(
        &self,
        request_id: FriendRequestId,
    ) -> Result<(FriendRequest, Conversation), RelationError> {
        let mut tx = self.begin().await?;
        let result = self.accept_in_tx(&mut *tx, request_id).await;
        Self::finish(tx, result).await
    }

    async fn accept_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<(FriendRequest, Conversation), RelationError> {
        let request = self.locked_pending(tx, request_id).await?;

        // order matters: request row -> ledgers -> conversation -> request flag
        self.ledger
            .add_mutual_in_tx(tx, request.sender, request.receiver)
            .await?;
        let conversation = self
            .conversations
            .create_pair_in_tx(tx, request.pair())
            .await?;
        self.request_repo.mark_accepted_in_tx(tx, request_id).await?;

        Ok((
            FriendRequest {
                accepted: true,
                ..request
            },
            conversation,
        ))
    }

    async fn decline_once(
        &self,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError> {
        let mut tx = self.begin().await?;
        let result = self.decline_in_tx(&mut *tx, request_id).await;
        Self::finish(tx, result).await
    }

    async fn decline_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError> {
        let request = self.locked_pending(tx, request_id).await?;
        self.request_repo.delete_in_tx(tx, request_id).await?;
        Ok(request)
    }

    async fn remove_once(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<FriendshipLedgerEntry, RelationError> {
        let mut tx = self.begin().await?;
        let result = self.remove_in_tx(&mut *tx, user_id, friend_id).await;
        Self::finish(tx, result).await
    }

    async fn remove_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<FriendshipLedgerEntry, RelationError> {
        let pair = UserPair::new(user_id, friend_id);

        let removal = self
            .ledger
            .remove_mutual_in_tx(tx, user_id, friend_id)
            .await?;
        let deleted = self.conversations.delete_pair_in_tx(tx, pair).await?;

        match (removal.removed, deleted) {
            (true, Some(conversation_id)) => {
                tracing::info!("friendship {pair} removed with conversation {conversation_id}");
            }
            (true, None) => {
                tracing::warn!("friendship {pair} removed but it had no conversation");
            }
            (false, Some(conversation_id)) => {
                tracing::warn!(
                    "conversation {conversation_id} of {pair} outlived its friendship, removed"
                );
            }
            (false, None) => {
                tracing::debug!("no friendship between {pair}, nothing removed");
            }
        }

        Ok(removal.entry)
    }

    // endregion

    async fn pending(
        &self,
        user_id: UserId,
        side: RequestSide,
    ) -> Result<Vec<PendingRequest>, RelationError> {
        if !self.user_repo.exists(user_id).await? {
            return Err(RelationError::NotFound("user"));
        }

        let requests = self.request_repo.list_pending(user_id, side).await?;
        let counterpart_ids: Vec<UserId> =
            requests.iter().map(|r| r.counterpart_of(user_id)).collect();
        let profiles: HashMap<UserId, PublicProfile> = self
            .user_repo
            .public_profiles(&counterpart_ids, ProfileFilter::Any)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();

        let pending = requests
            .into_iter()
            .filter_map(|request| {
                let counterpart_id = request.counterpart_of(user_id);
                match profiles.get(&counterpart_id).cloned() {
                    Some(counterpart) => Some(PendingRequest {
                        request,
                        counterpart,
                    }),
                    None => {
                        tracing::warn!(
                            "request {} points at unknown user {counterpart_id}",
                            request.request_id
                        );
                        None
                    }
                }
            })
            .collect();

        Ok(pending)
    }

    async fn friend_profiles(
        &self,
        user_id: UserId,
        filter: ProfileFilter,
    ) -> Result<Vec<PublicProfile>, RelationError> {
        let friend_ids = self.ledger.list_friends(user_id).await?;
        self.user_repo.public_profiles(&friend_ids, filter).await
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn create_ledger(&self, user_id: UserId) -> Result<FriendshipLedgerEntry, RelationError> {
        let entry = self
            .with_retry("create_ledger", || self.create_ledger_once(user_id))
            .await?;
        tracing::info!("ledger opened for {user_id}");
        Ok(entry)
    }

    async fn send_request(
        &self,
        input: FriendRequestInput,
    ) -> Result<FriendRequest, RelationError> {
        if input.sender == input.receiver {
            return Err(RelationError::InvalidOperation("self_request"));
        }
        // both checks must pass before anything is written
        self.ensure_both_exist(input.sender, input.receiver).await?;

        let _pair_guard = self
            .pair_locks
            .lock(UserPair::new(input.sender, input.receiver))
            .await;
        let request = self
            .with_retry("send_request", || self.send_once(input))
            .await?;

        tracing::info!(
            "friend request {} sent from {} to {}",
            request.request_id,
            request.sender,
            request.receiver
        );
        Ok(request)
    }

    async fn accept_request(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError> {
        let request = self.visible_request(actor, request_id).await?;
        if request.sender == actor {
            return Err(RelationError::InvalidOperation("accept_own_request"));
        }

        let _pair_guard = self.pair_locks.lock(request.pair()).await;
        let (request, conversation) = self
            .with_retry("accept_request", || self.accept_once(request_id))
            .await?;

        tracing::info!(
            "friend request {request_id} accepted, {} and {} share conversation {}",
            request.sender,
            request.receiver,
            conversation.conversation_id
        );
        Ok(request)
    }

    async fn decline_request(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError> {
        let request = self.visible_request(actor, request_id).await?;

        let _pair_guard = self.pair_locks.lock(request.pair()).await;
        let request = self
            .with_retry("decline_request", || self.decline_once(request_id))
            .await?;

        if request.sender == actor {
            tracing::info!("friend request {request_id} cancelled by {actor}");
        } else {
            tracing::info!("friend request {request_id} declined by {actor}");
        }
        Ok(request)
    }

    async fn remove_friend(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<FriendshipLedgerEntry, RelationError> {
        if user_id == friend_id {
            return Err(RelationError::InvalidOperation("self_reference"));
        }
        self.ensure_both_exist(user_id, friend_id).await?;

        let _pair_guard = self
            .pair_locks
            .lock(UserPair::new(user_id, friend_id))
            .await;
        self.with_retry("remove_friend", || self.remove_once(user_id, friend_id))
            .await
    }

    async fn find_friends(&self, user_id: UserId) -> Result<Vec<PublicProfile>, RelationError> {
        tracing::debug!("find friends of {user_id}");
        self.friend_profiles(user_id, ProfileFilter::Any).await
    }

    async fn find_friends_online(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PublicProfile>, RelationError> {
        tracing::debug!("find online friends of {user_id}");
        self.friend_profiles(user_id, ProfileFilter::OnlineOnly)
            .await
    }

    async fn find_requests(&self, user_id: UserId) -> Result<Vec<PendingRequest>, RelationError> {
        self.pending(user_id, RequestSide::Received).await
    }

    async fn find_sent(&self, user_id: UserId) -> Result<Vec<PendingRequest>, RelationError> {
        self.pending(user_id, RequestSide::Sent).await
    }

    async fn are_friends(&self, user_id: UserId, candidate: UserId) -> Result<bool, RelationError> {
        self.ledger.is_friend(user_id, candidate).await
    }

    async fn find_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Conversation>, RelationError> {
        self.conversations.find_pair(UserPair::new(a, b)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::test_support::*;
    use crate::infra_memory::{MemoryLedgerRepo, MemoryStore, memory_backend};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn input(sender: u128, receiver: u128) -> FriendRequestInput {
        FriendRequestInput {
            sender: uid(sender),
            receiver: uid(receiver),
        }
    }

    #[tokio::test]
    async fn request_accept_remove_scenario() {
        let g = graph(&[1, 2]).await;

        let r1 = g.service.send_request(input(1, 2)).await.unwrap();
        assert!(!r1.accepted);
        assert_eq!(
            g.service.send_request(input(2, 1)).await.unwrap_err(),
            RelationError::Conflict("request_outstanding")
        );

        let accepted = g
            .service
            .accept_request(uid(2), r1.request_id)
            .await
            .unwrap();
        assert!(accepted.accepted);
        assert!(g.service.are_friends(uid(1), uid(2)).await.unwrap());
        assert!(g.service.are_friends(uid(2), uid(1)).await.unwrap());
        let conversation = g
            .service
            .find_conversation(uid(2), uid(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.members, vec![uid(1), uid(2)]);
        assert_eq!(g.store.conversation_count().await, 1);

        let entry = g.service.remove_friend(uid(1), uid(2)).await.unwrap();
        assert_eq!(entry.user_id, uid(1));
        assert!(entry.friends.is_empty());
        assert!(g.service.find_friends(uid(2)).await.unwrap().is_empty());
        assert_eq!(g.store.conversation_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_request_conflicts_in_both_directions() {
        let g = graph(&[1, 2]).await;

        g.service.send_request(input(1, 2)).await.unwrap();
        for (s, r) in [(1, 2), (2, 1)] {
            assert_eq!(
                g.service.send_request(input(s, r)).await.unwrap_err(),
                RelationError::Conflict("request_outstanding")
            );
        }
    }

    #[tokio::test]
    async fn request_validation() {
        let g = graph(&[1]).await;

        assert_eq!(
            g.service.send_request(input(1, 1)).await.unwrap_err(),
            RelationError::InvalidOperation("self_request")
        );
        assert_eq!(
            g.service.send_request(input(1, 7)).await.unwrap_err(),
            RelationError::NotFound("user")
        );
        assert_eq!(
            g.service.send_request(input(7, 1)).await.unwrap_err(),
            RelationError::NotFound("user")
        );
        assert!(g.service.find_sent(uid(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn friends_cannot_request_again_until_removed() {
        let g = graph(&[1, 2]).await;
        befriend(&g, 1, 2).await;

        assert_eq!(
            g.service.send_request(input(2, 1)).await.unwrap_err(),
            RelationError::Conflict("already_friends")
        );

        g.service.remove_friend(uid(2), uid(1)).await.unwrap();
        g.service.send_request(input(2, 1)).await.unwrap();
    }

    #[tokio::test]
    async fn accept_authorization() {
        let g = graph(&[1, 2, 3]).await;
        let request = g.service.send_request(input(1, 2)).await.unwrap();

        assert_eq!(
            g.service
                .accept_request(uid(1), request.request_id)
                .await
                .unwrap_err(),
            RelationError::InvalidOperation("accept_own_request")
        );
        assert_eq!(
            g.service
                .accept_request(uid(3), request.request_id)
                .await
                .unwrap_err(),
            RelationError::NotFound("friend_request")
        );
        assert_eq!(
            g.service
                .accept_request(uid(2), FriendRequestId(uuid::Uuid::new_v4()))
                .await
                .unwrap_err(),
            RelationError::NotFound("friend_request")
        );
        assert!(!g.service.are_friends(uid(1), uid(2)).await.unwrap());
    }

    #[tokio::test]
    async fn resolved_requests_cannot_be_resolved_again() {
        let g = graph(&[1, 2]).await;
        let request = g.service.send_request(input(1, 2)).await.unwrap();
        g.service
            .accept_request(uid(2), request.request_id)
            .await
            .unwrap();

        assert_eq!(
            g.service
                .accept_request(uid(2), request.request_id)
                .await
                .unwrap_err(),
            RelationError::Conflict("request_resolved")
        );
        assert_eq!(
            g.service
                .decline_request(uid(2), request.request_id)
                .await
                .unwrap_err(),
            RelationError::Conflict("request_resolved")
        );
        assert_eq!(g.store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn decline_and_cancel_delete_the_request() {
        let g = graph(&[1, 2, 3]).await;

        let to_decline = g.service.send_request(input(1, 2)).await.unwrap();
        let declined = g
            .service
            .decline_request(uid(2), to_decline.request_id)
            .await
            .unwrap();
        assert_eq!(declined, to_decline);

        let to_cancel = g.service.send_request(input(1, 3)).await.unwrap();
        assert_eq!(
            g.service
                .decline_request(uid(2), to_cancel.request_id)
                .await
                .unwrap_err(),
            RelationError::NotFound("friend_request")
        );
        g.service
            .decline_request(uid(1), to_cancel.request_id)
            .await
            .unwrap();

        assert!(g.service.find_sent(uid(1)).await.unwrap().is_empty());
        assert_eq!(
            g.service
                .decline_request(uid(2), to_decline.request_id)
                .await
                .unwrap_err(),
            RelationError::NotFound("friend_request")
        );
        // a declined pair may try again
        g.service.send_request(input(2, 1)).await.unwrap();
    }

    #[tokio::test]
    async fn pending_listings_carry_public_profiles() {
        let g = graph(&[1, 2, 3]).await;
        g.service.send_request(input(2, 1)).await.unwrap();
        g.service.send_request(input(3, 1)).await.unwrap();
        g.service.send_request(input(1, 3)).await.unwrap_err();

        let received = g.service.find_requests(uid(1)).await.unwrap();
        let senders: Vec<UserId> = received.iter().map(|p| p.counterpart.user_id).collect();
        assert_eq!(senders, vec![uid(2), uid(3)]);
        assert_eq!(received[0].counterpart.first_name, "first2");
        assert_eq!(
            received[0].counterpart.avatar_url.as_deref(),
            Some("https://cdn.example.com/avatars/2.png")
        );

        let sent = g.service.find_sent(uid(2)).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].counterpart.user_id, uid(1));

        assert_eq!(
            g.service.find_requests(uid(9)).await.unwrap_err(),
            RelationError::NotFound("user")
        );
    }

    #[tokio::test]
    async fn friends_are_listed_in_ledger_order() {
        let g = graph(&[1, 2, 3, 4]).await;
        befriend(&g, 1, 4).await;
        befriend(&g, 2, 1).await;
        befriend(&g, 1, 3).await;

        let friends: Vec<UserId> = g
            .service
            .find_friends(uid(1))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        assert_eq!(friends, vec![uid(4), uid(2), uid(3)]);

        g.store.set_online(uid(2), true).await;
        let online = g.service.find_friends_online(uid(1)).await.unwrap();
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].user_id, uid(2));

        assert_eq!(
            g.service.find_friends(uid(9)).await.unwrap_err(),
            RelationError::NotFound("user")
        );
    }

    #[tokio::test]
    async fn remove_friend_twice_changes_nothing() {
        let g = graph(&[1, 2]).await;
        befriend(&g, 1, 2).await;

        let first = g.service.remove_friend(uid(1), uid(2)).await.unwrap();
        let second = g.service.remove_friend(uid(1), uid(2)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(g.store.conversation_count().await, 0);

        assert_eq!(
            g.service.remove_friend(uid(1), uid(1)).await.unwrap_err(),
            RelationError::InvalidOperation("self_reference")
        );
        assert_eq!(
            g.service.remove_friend(uid(1), uid(8)).await.unwrap_err(),
            RelationError::NotFound("user")
        );
    }

    #[tokio::test]
    async fn remove_friend_requires_ledgers() {
        let g = graph(&[1]).await;
        g.store.insert_user(user_record(2)).await;

        assert_eq!(
            g.service.remove_friend(uid(1), uid(2)).await.unwrap_err(),
            RelationError::NotFound("ledger")
        );
    }

    #[tokio::test]
    async fn ledger_is_opened_once_for_known_users() {
        let g = graph(&[1]).await;

        assert_eq!(
            g.service.create_ledger(uid(1)).await.unwrap_err(),
            RelationError::Conflict("ledger_exists")
        );
        assert_eq!(
            g.service.create_ledger(uid(5)).await.unwrap_err(),
            RelationError::NotFound("user")
        );
    }

    #[tokio::test]
    async fn opposite_requests_race_to_one_winner() {
        let g = graph(&[1, 2]).await;

        let (a, b) = tokio::join!(
            g.service.send_request(input(1, 2)),
            g.service.send_request(input(2, 1))
        );
        assert!(a.is_ok() != b.is_ok());
        let loser = a.err().or(b.err()).unwrap();
        assert_eq!(loser, RelationError::Conflict("request_outstanding"));
    }

    #[tokio::test]
    async fn concurrent_accepts_materialize_once() {
        let g = graph(&[1, 2]).await;
        let request = g.service.send_request(input(1, 2)).await.unwrap();

        let (a, b) = tokio::join!(
            g.service.accept_request(uid(2), request.request_id),
            g.service.accept_request(uid(2), request.request_id)
        );
        assert!(a.is_ok() != b.is_ok());
        assert_eq!(g.store.conversation_count().await, 1);
        assert_eq!(g.service.find_friends(uid(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn accept_racing_decline_has_one_outcome() {
        for _ in 0..20 {
            let g = graph(&[1, 2]).await;
            let request = g.service.send_request(input(1, 2)).await.unwrap();

            let (accepted, declined) = tokio::join!(
                g.service.accept_request(uid(2), request.request_id),
                g.service.decline_request(uid(1), request.request_id)
            );
            assert!(accepted.is_ok() != declined.is_ok());

            let friends = g.service.are_friends(uid(1), uid(2)).await.unwrap();
            match (accepted, declined) {
                (Ok(_), Err(e)) => {
                    assert_eq!(e, RelationError::Conflict("request_resolved"));
                    assert!(friends);
                    assert_eq!(g.store.conversation_count().await, 1);
                }
                (Err(e), Ok(_)) => {
                    assert_eq!(e, RelationError::NotFound("friend_request"));
                    assert!(!friends);
                    assert_eq!(g.store.conversation_count().await, 0);
                    assert!(g.service.find_sent(uid(1)).await.unwrap().is_empty());
                }
                _ => unreachable!(),
            }
        }
    }

    /// Ledger repo whose first `failures` saves report a stale version.
    struct FlakyLedgerRepo {
        inner: MemoryLedgerRepo,
        failures: AtomicU32,
    }

    #[async_trait::async_trait]
    impl LedgerRepo for FlakyLedgerRepo {
        async fn create_in_tx(
            &self,
            tx: &mut dyn StorageTx,
            user_id: UserId,
        ) -> Result<FriendshipLedgerEntry, RelationError> {
            self.inner.create_in_tx(tx, user_id).await
        }

        async fn get(
            &self,
            user_id: UserId,
        ) -> Result<Option<FriendshipLedgerEntry>, RelationError> {
            self.inner.get(user_id).await
        }

        async fn get_in_tx(
            &self,
            tx: &mut dyn StorageTx,
            user_id: UserId,
        ) -> Result<Option<FriendshipLedgerEntry>, RelationError> {
            self.inner.get_in_tx(tx, user_id).await
        }

        async fn lock_pair_in_tx(
            &self,
            tx: &mut dyn StorageTx,
            pair: UserPair,
        ) -> Result<(Option<FriendshipLedgerEntry>, Option<FriendshipLedgerEntry>), RelationError>
        {
            self.inner.lock_pair_in_tx(tx, pair).await
        }

        async fn save_in_tx(
            &self,
            tx: &mut dyn StorageTx,
            entry: &FriendshipLedgerEntry,
        ) -> Result<FriendshipLedgerEntry, RelationError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(RelationError::Contended("stale ledger version".into()));
            }
            self.inner.save_in_tx(tx, entry).await
        }
    }

    async fn flaky_graph(failures: u32) -> Graph {
        let store = MemoryStore::new();
        let flaky: Arc<dyn LedgerRepo> = Arc::new(FlakyLedgerRepo {
            inner: MemoryLedgerRepo::new(store.clone()),
            failures: AtomicU32::new(failures),
        });
        let backend = StorageBackend {
            ledger_repo: flaky,
            ..memory_backend(&store)
        };
        graph_on(store, backend, &[1, 2]).await
    }

    #[tokio::test]
    async fn contended_accept_is_retried() {
        let g = flaky_graph(2).await;
        let request = g.service.send_request(input(1, 2)).await.unwrap();

        g.service
            .accept_request(uid(2), request.request_id)
            .await
            .unwrap();
        assert!(g.service.are_friends(uid(1), uid(2)).await.unwrap());
        assert_eq!(g.store.conversation_count().await, 1);
    }

    #[tokio::test]
    async fn exhausted_retries_conflict_and_leave_no_trace() {
        let g = flaky_graph(10).await;
        let request = g.service.send_request(input(1, 2)).await.unwrap();

        assert_eq!(
            g.service
                .accept_request(uid(2), request.request_id)
                .await
                .unwrap_err(),
            RelationError::Conflict("concurrent_write")
        );
        assert!(!g.service.are_friends(uid(1), uid(2)).await.unwrap());
        assert_eq!(g.store.conversation_count().await, 0);
        assert_eq!(g.service.find_requests(uid(2)).await.unwrap().len(), 1);
    }
}
