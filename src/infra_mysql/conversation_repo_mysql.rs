use super::util::{downcast, is_dup_key, is_missing_reference, relation_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};

/// Conversations whose member set is exactly {?, ?}.
const FIND_DIRECT: &str = r#"
SELECT c.conversation_id, c.created_at
FROM conversation c
JOIN conversation_member cm
  ON cm.conversation_id = c.conversation_id
WHERE c.conversation_id IN (
    SELECT conversation_id FROM conversation_member WHERE user_id = ?
)
GROUP BY c.conversation_id, c.created_at
HAVING COUNT(*) = 2
   AND SUM(cm.user_id IN (?, ?)) = 2
"#;

pub struct MySqlConversationRepo {
    pool: MySqlPool,
}

impl MySqlConversationRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlConversationRepo { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepo for MySqlConversationRepo {
    async fn find_direct_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<ConversationId>, RelationError> {
        let tx = downcast(tx)?;

        let row = sqlx::query(FIND_DIRECT)
            .bind(pair.min())
            .bind(pair.min())
            .bind(pair.max())
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| relation_err("select direct conversation", e))?;

        row.map(|r| {
            r.try_get::<ConversationId, _>("conversation_id")
                .map_err(|e| RelationError::Store(format!("decode conversation_id: {e}")))
        })
        .transpose()
    }

    async fn find_direct(&self, pair: UserPair) -> Result<Option<Conversation>, RelationError> {
        let row = sqlx::query(FIND_DIRECT)
            .bind(pair.min())
            .bind(pair.min())
            .bind(pair.max())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| relation_err("select direct conversation", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let decode = |e: sqlx::Error| RelationError::Store(format!("decode conversation: {e}"));
        let conversation_id = row
            .try_get::<ConversationId, _>("conversation_id")
            .map_err(decode)?;
        let created_at = row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(decode)?;

        Ok(Some(Conversation::direct(conversation_id, pair, created_at)))
    }

    async fn create_direct_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
        conversation_id: ConversationId,
    ) -> Result<Conversation, RelationError> {
        let tx = downcast(tx)?;
        let conversation = Conversation::direct(conversation_id, pair, Utc::now());

        // order matters: conversation -> members -> direct_pair
        sqlx::query("INSERT INTO conversation (conversation_id, created_at) VALUES (?, ?)")
            .bind(conversation_id)
            .bind(conversation.created_at)
            .execute(tx.conn())
            .await
            .map_err(|e| relation_err("insert conversation", e))?;

        for member in &conversation.members {
            sqlx::query("INSERT INTO conversation_member (conversation_id, user_id) VALUES (?, ?)")
                .bind(conversation_id)
                .bind(*member)
                .execute(tx.conn())
                .await
                .map_err(|e| {
                    if is_missing_reference(&e) {
                        RelationError::NotFound("user")
                    } else {
                        relation_err("insert conversation member", e)
                    }
                })?;
        }

        let res = sqlx::query(
            "INSERT INTO direct_pair (user_min, user_max, conversation_id) VALUES (?, ?, ?)",
        )
        .bind(pair.min())
        .bind(pair.max())
        .bind(conversation_id)
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(conversation),
            Err(e) if is_dup_key(&e) => Err(RelationError::Conflict("conversation_exists")),
            Err(e) => Err(relation_err("insert direct pair", e)),
        }
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        conversation_id: ConversationId,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx)?;

        // members and direct_pair go with it (ON DELETE CASCADE)
        let res = sqlx::query("DELETE FROM conversation WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(tx.conn())
            .await
            .map_err(|e| relation_err("delete conversation", e))?;

        if res.rows_affected() == 0 {
            return Err(RelationError::NotFound("conversation"));
        }

        Ok(())
    }
}
