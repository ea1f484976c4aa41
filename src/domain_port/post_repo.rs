use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait PostRepo: Send + Sync {
    /// Posts ordered by (created_at DESC, post_id DESC), strictly after the
    /// `after` post in that order. `authors = None` means every author.
    /// An `after` id that does not resolve yields an empty page.
    async fn page(
        &self,
        authors: Option<&[UserId]>,
        after: Option<PostId>,
        page_size: PageSize,
    ) -> Result<Vec<PostSummary>, FeedError>;

    /// `Conflict` if the user already likes the post.
    async fn add_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError>;

    /// `Conflict` if the user does not like the post.
    async fn remove_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError>;
}
