use crate::domain_model::*;

/// Failure kinds of the social graph. The `&'static str` payloads are short
/// machine-usable reasons such as `"user"` or `"request_outstanding"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelationError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    /// Transient write collision. Retried inside the service, never returned.
    #[error("contended write: {0}")]
    Contended(String),
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    /// Opens the empty friend ledger of a freshly created user.
    async fn create_ledger(&self, user_id: UserId) -> Result<FriendshipLedgerEntry, RelationError>;

    async fn send_request(&self, input: FriendRequestInput)
    -> Result<FriendRequest, RelationError>;
    async fn accept_request(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError>;
    async fn decline_request(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError>;
    /// Returns the caller's ledger after the removal.
    async fn remove_friend(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<FriendshipLedgerEntry, RelationError>;

    async fn find_friends(&self, user_id: UserId) -> Result<Vec<PublicProfile>, RelationError>;
    async fn find_friends_online(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PublicProfile>, RelationError>;
    async fn find_requests(&self, user_id: UserId) -> Result<Vec<PendingRequest>, RelationError>;
    async fn find_sent(&self, user_id: UserId) -> Result<Vec<PendingRequest>, RelationError>;
    async fn are_friends(&self, user_id: UserId, candidate: UserId) -> Result<bool, RelationError>;
    async fn find_conversation(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Conversation>, RelationError>;
}
