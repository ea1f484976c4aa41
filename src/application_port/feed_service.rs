use crate::application_port::RelationError;
use crate::domain_model::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("store error: {0}")]
    Store(String),
}

impl From<RelationError> for FeedError {
    fn from(err: RelationError) -> Self {
        match err {
            RelationError::NotFound(what) => FeedError::NotFound(what),
            RelationError::Conflict(what) => FeedError::Conflict(what),
            other => FeedError::Store(other.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait FeedService: Send + Sync {
    /// Posts by the user and the user's friends, newest first.
    async fn find_feed(
        &self,
        user_id: UserId,
        cursor: Option<PostId>,
    ) -> Result<FeedPage, FeedError>;
    /// Every post, newest first.
    async fn find_all(&self, cursor: Option<PostId>) -> Result<FeedPage, FeedError>;
    async fn add_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError>;
    async fn remove_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError>;
}
