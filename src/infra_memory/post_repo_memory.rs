use super::store::{MemoryStore, PostRecord};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryPostRepo {
    store: MemoryStore,
}

impl MemoryPostRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryPostRepo { store }
    }
}

#[async_trait::async_trait]
impl PostRepo for MemoryPostRepo {
    async fn page(
        &self,
        authors: Option<&[UserId]>,
        after: Option<PostId>,
        page_size: PageSize,
    ) -> Result<Vec<PostSummary>, FeedError> {
        let posts = self.store.posts().await;

        let cursor_key = match after {
            Some(post_id) => match posts.get(&post_id) {
                Some(p) => Some(p.summary.order_key()),
                // a vanished cursor post ends the scroll
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut page: Vec<&PostRecord> = posts
            .values()
            .filter(|p| authors.is_none_or(|a| a.contains(&p.summary.author_id)))
            .filter(|p| cursor_key.is_none_or(|k| p.summary.order_key() < k))
            .collect();
        page.sort_by(|a, b| b.summary.order_key().cmp(&a.summary.order_key()));

        Ok(page
            .into_iter()
            .take(page_size.0 as usize)
            .map(PostRecord::to_summary)
            .collect())
    }

    async fn add_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError> {
        let mut posts = self.store.posts().await;
        let post = posts
            .get_mut(&post_id)
            .ok_or(FeedError::NotFound("post"))?;
        if post.likers.contains(&user_id) {
            return Err(FeedError::Conflict("already_liked"));
        }
        post.likers.push(user_id);
        Ok(())
    }

    async fn remove_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError> {
        let mut posts = self.store.posts().await;
        let post = posts
            .get_mut(&post_id)
            .ok_or(FeedError::NotFound("post"))?;
        let before = post.likers.len();
        post.likers.retain(|u| *u != user_id);
        if post.likers.len() == before {
            return Err(FeedError::Conflict("not_liked"));
        }
        Ok(())
    }
}
