use super::util::{downcast, is_dup_key, is_missing_reference, relation_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

const REQUEST_COLUMNS: &str = "request_id, sender_id, receiver_id, accepted, created_at";

pub struct MySqlFriendRequestRepo {
    pool: MySqlPool,
}

impl MySqlFriendRequestRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlFriendRequestRepo { pool }
    }

    fn row_to_request(row: &MySqlRow) -> Result<FriendRequest, RelationError> {
        let decode = |e: sqlx::Error| RelationError::Store(format!("decode friend request: {e}"));
        Ok(FriendRequest {
            request_id: row
                .try_get::<FriendRequestId, _>("request_id")
                .map_err(decode)?,
            sender: row.try_get::<UserId, _>("sender_id").map_err(decode)?,
            receiver: row.try_get::<UserId, _>("receiver_id").map_err(decode)?,
            accepted: row.try_get::<bool, _>("accepted").map_err(decode)?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(decode)?,
        })
    }
}

#[async_trait::async_trait]
impl FriendRequestRepo for MySqlFriendRequestRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request: &FriendRequest,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx)?;
        let pair = request.pair();

        let res = sqlx::query(
            r#"
INSERT INTO friend_request (request_id, sender_id, receiver_id, user_min, user_max, accepted, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(request.request_id)
        .bind(request.sender)
        .bind(request.receiver)
        .bind(pair.min())
        .bind(pair.max())
        .bind(request.accepted)
        .bind(request.created_at)
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_dup_key(&e) => Err(RelationError::Conflict("request_outstanding")),
            Err(e) if is_missing_reference(&e) => Err(RelationError::NotFound("user")),
            Err(e) => Err(relation_err("insert friend request", e)),
        }
    }

    async fn find_outstanding_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let tx = downcast(tx)?;

        let row = sqlx::query(&format!(
            r#"
SELECT {REQUEST_COLUMNS}
FROM friend_request
WHERE user_min = ? AND user_max = ? AND accepted = 0
FOR UPDATE
"#
        ))
        .bind(pair.min())
        .bind(pair.max())
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| relation_err("select outstanding request", e))?;

        row.as_ref().map(Self::row_to_request).transpose()
    }

    async fn get(
        &self,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let row = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_request WHERE request_id = ?"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| relation_err("select friend request", e))?;

        row.as_ref().map(Self::row_to_request).transpose()
    }

    async fn lock_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let tx = downcast(tx)?;

        let row = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_request WHERE request_id = ? FOR UPDATE"
        ))
        .bind(request_id)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| relation_err("lock friend request", e))?;

        row.as_ref().map(Self::row_to_request).transpose()
    }

    async fn mark_accepted_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query(
            "UPDATE friend_request SET accepted = 1 WHERE request_id = ? AND accepted = 0",
        )
        .bind(request_id)
        .execute(tx.conn())
        .await
        .map_err(|e| relation_err("accept friend request", e))?;

        if res.rows_affected() == 0 {
            return Err(RelationError::Contended(format!(
                "request {request_id} accepted concurrently"
            )));
        }

        Ok(())
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query("DELETE FROM friend_request WHERE request_id = ?")
            .bind(request_id)
            .execute(tx.conn())
            .await
            .map_err(|e| relation_err("delete friend request", e))?;

        if res.rows_affected() == 0 {
            return Err(RelationError::NotFound("friend_request"));
        }

        Ok(())
    }

    async fn list_pending(
        &self,
        user_id: UserId,
        side: RequestSide,
    ) -> Result<Vec<FriendRequest>, RelationError> {
        let column = match side {
            RequestSide::Received => "receiver_id",
            RequestSide::Sent => "sender_id",
        };

        let rows = sqlx::query(&format!(
            r#"
SELECT {REQUEST_COLUMNS}
FROM friend_request
WHERE {column} = ? AND accepted = 0
ORDER BY created_at ASC, request_id ASC
"#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| relation_err("list pending requests", e))?;

        rows.iter().map(Self::row_to_request).collect()
    }
}
