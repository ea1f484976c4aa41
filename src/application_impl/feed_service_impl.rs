use crate::application_impl::FriendshipLedger;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

/// Keyset-paginated post listings. Holds no state of its own; the friend set
/// is read from the ledger on every call.
pub struct RealFeedService {
    ledger: FriendshipLedger,
    post_repo: Arc<dyn PostRepo>,
    page_size: PageSize,
}

impl RealFeedService {
    pub fn new(backend: &StorageBackend, page_size: PageSize) -> Self {
        Self {
            ledger: FriendshipLedger::new(backend.ledger_repo.clone()),
            post_repo: backend.post_repo.clone(),
            page_size: if page_size.0 == 0 {
                PageSize::FEED_DEFAULT
            } else {
                page_size
            },
        }
    }
}

#[async_trait::async_trait]
impl FeedService for RealFeedService {
    async fn find_feed(
        &self,
        user_id: UserId,
        cursor: Option<PostId>,
    ) -> Result<FeedPage, FeedError> {
        let mut authors = self.ledger.list_friends(user_id).await?;
        authors.push(user_id);

        let items = self
            .post_repo
            .page(Some(&authors), cursor, self.page_size)
            .await?;
        tracing::debug!(
            "feed of {user_id}: {} post(s) from {} author(s)",
            items.len(),
            authors.len()
        );

        Ok(FeedPage::from_items(items, self.page_size))
    }

    async fn find_all(&self, cursor: Option<PostId>) -> Result<FeedPage, FeedError> {
        let items = self.post_repo.page(None, cursor, self.page_size).await?;
        Ok(FeedPage::from_items(items, self.page_size))
    }

    async fn add_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError> {
        self.post_repo.add_like(post_id, user_id).await?;
        tracing::info!("{user_id} liked post {post_id}");
        Ok(())
    }

    async fn remove_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError> {
        self.post_repo.remove_like(post_id, user_id).await?;
        tracing::info!("{user_id} unliked post {post_id}");
        Ok(())
    }
}
