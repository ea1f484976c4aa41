use super::util::{feed_err, is_dup_key, is_missing_reference};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

pub struct MySqlPostRepo {
    pool: MySqlPool,
}

impl MySqlPostRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPostRepo { pool }
    }

    fn row_to_summary(row: &MySqlRow) -> Result<PostSummary, FeedError> {
        let decode = |e: sqlx::Error| FeedError::Store(format!("decode post: {e}"));
        Ok(PostSummary {
            post_id: row.try_get::<PostId, _>("post_id").map_err(decode)?,
            author_id: row.try_get::<UserId, _>("author_id").map_err(decode)?,
            content: row.try_get("content").map_err(decode)?,
            like_count: row.try_get::<i64, _>("like_count").map_err(decode)? as u32,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(decode)?,
        })
    }

    async fn post_exists(&self, post_id: PostId) -> Result<bool, FeedError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM post WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| feed_err("post exists", e))?;

        Ok(count > 0)
    }
}

#[async_trait::async_trait]
impl PostRepo for MySqlPostRepo {
    async fn page(
        &self,
        authors: Option<&[UserId]>,
        after: Option<PostId>,
        page_size: PageSize,
    ) -> Result<Vec<PostSummary>, FeedError> {
        if authors.is_some_and(|a| a.is_empty()) {
            return Ok(Vec::new());
        }

        let cursor_at = match after {
            Some(post_id) => {
                let created_at: Option<DateTime<Utc>> =
                    sqlx::query_scalar("SELECT created_at FROM post WHERE post_id = ?")
                        .bind(post_id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(|e| feed_err("select cursor post", e))?;
                match created_at {
                    Some(created_at) => Some((created_at, post_id)),
                    // a vanished cursor post ends the scroll
                    None => return Ok(Vec::new()),
                }
            }
            None => None,
        };

        let mut qb = QueryBuilder::<MySql>::new(
            r#"
SELECT p.post_id, p.author_id, p.content, p.created_at,
       (SELECT COUNT(*) FROM post_like pl WHERE pl.post_id = p.post_id) AS like_count
FROM post p
WHERE 1 = 1"#,
        );
        if let Some(authors) = authors {
            qb.push(" AND p.author_id IN (");
            let mut ids = qb.separated(", ");
            for id in authors {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");
        }
        if let Some((created_at, post_id)) = cursor_at {
            qb.push(" AND (p.created_at < ")
                .push_bind(created_at)
                .push(" OR (p.created_at = ")
                .push_bind(created_at)
                .push(" AND p.post_id < ")
                .push_bind(post_id)
                .push("))");
        }
        qb.push(" ORDER BY p.created_at DESC, p.post_id DESC LIMIT ")
            .push_bind(page_size.0 as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| feed_err("select post page", e))?;

        rows.iter().map(Self::row_to_summary).collect()
    }

    async fn add_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError> {
        if !self.post_exists(post_id).await? {
            return Err(FeedError::NotFound("post"));
        }

        let res = sqlx::query("INSERT INTO post_like (post_id, user_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_dup_key(&e) => Err(FeedError::Conflict("already_liked")),
            Err(e) if is_missing_reference(&e) => Err(FeedError::NotFound("post")),
            Err(e) => Err(feed_err("insert like", e)),
        }
    }

    async fn remove_like(&self, post_id: PostId, user_id: UserId) -> Result<(), FeedError> {
        if !self.post_exists(post_id).await? {
            return Err(FeedError::NotFound("post"));
        }

        let res = sqlx::query("DELETE FROM post_like WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| feed_err("delete like", e))?;

        if res.rows_affected() == 0 {
            return Err(FeedError::Conflict("not_liked"));
        }

        Ok(())
    }
}
