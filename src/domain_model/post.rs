use crate::domain_model::{PageSize, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct PostId(pub uuid::Uuid);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(PostId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub like_count: u32,
    pub created_at: DateTime<Utc>,
}

impl PostSummary {
    /// Feed order key: newest first, post id breaks ties.
    pub fn order_key(&self) -> (DateTime<Utc>, PostId) {
        (self.created_at, self.post_id)
    }
}

/// One page of a keyset-paginated post listing.
///
/// `has_next_page` is a "maybe more" signal: it is set whenever the page came
/// back full, so the page after an exactly-full last page is empty.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub items: Vec<PostSummary>,
    pub has_next_page: bool,
    pub next_cursor: Option<PostId>,
}

impl FeedPage {
    pub fn from_items(items: Vec<PostSummary>, page_size: PageSize) -> Self {
        let full = !items.is_empty() && items.len() == page_size.0 as usize;
        let next_cursor = if full {
            items.last().map(|p| p.post_id)
        } else {
            None
        };
        Self {
            items,
            has_next_page: full,
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn post(n: u128) -> PostSummary {
        PostSummary {
            post_id: PostId(Uuid::from_u128(n)),
            author_id: UserId(Uuid::from_u128(1)),
            content: format!("post {n}"),
            like_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn full_page_points_at_last_item() {
        let page = FeedPage::from_items(vec![post(3), post(2)], PageSize(2));
        assert!(page.has_next_page);
        assert_eq!(page.next_cursor, Some(PostId(Uuid::from_u128(2))));
    }

    #[test]
    fn short_page_has_no_cursor() {
        let page = FeedPage::from_items(vec![post(3)], PageSize(2));
        assert!(!page.has_next_page);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn empty_page_is_terminal() {
        let page = FeedPage::from_items(Vec::new(), PageSize(10));
        assert!(!page.has_next_page);
        assert!(page.next_cursor.is_none());
    }
}
