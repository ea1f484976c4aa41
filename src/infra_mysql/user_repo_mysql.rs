use super::util::relation_err;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use std::collections::HashMap;

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_profile(row: &MySqlRow) -> Result<PublicProfile, RelationError> {
        let decode = |e: sqlx::Error| RelationError::Store(format!("decode profile: {e}"));
        Ok(PublicProfile {
            user_id: row.try_get::<UserId, _>("user_id").map_err(decode)?,
            first_name: row.try_get("first_name").map_err(decode)?,
            last_name: row.try_get("last_name").map_err(decode)?,
            avatar_url: row.try_get("avatar_url").map_err(decode)?,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn exists(&self, user_id: UserId) -> Result<bool, RelationError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM user WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| relation_err("user exists", e))?;

        Ok(count > 0)
    }

    async fn public_profiles(
        &self,
        user_ids: &[UserId],
        filter: ProfileFilter,
    ) -> Result<Vec<PublicProfile>, RelationError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT user_id, first_name, last_name, avatar_url FROM user WHERE user_id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in user_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        if filter == ProfileFilter::OnlineOnly {
            qb.push(" AND is_online = 1");
        }

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| relation_err("select profiles", e))?;

        let mut by_id = HashMap::with_capacity(rows.len());
        for row in &rows {
            let profile = Self::row_to_profile(row)?;
            by_id.insert(profile.user_id, profile);
        }

        Ok(user_ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
