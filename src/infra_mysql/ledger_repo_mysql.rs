use super::util::{downcast, is_dup_key, is_missing_reference, relation_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::types::Json;
use sqlx::{MySqlPool, Row};

pub struct MySqlLedgerRepo {
    pool: MySqlPool,
}

impl MySqlLedgerRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlLedgerRepo { pool }
    }

    fn row_to_entry(row: &MySqlRow) -> Result<FriendshipLedgerEntry, RelationError> {
        let decode = |e: sqlx::Error| RelationError::Store(format!("decode ledger: {e}"));
        let Json(friends) = row
            .try_get::<Json<Vec<UserId>>, _>("friends")
            .map_err(decode)?;
        Ok(FriendshipLedgerEntry {
            user_id: row.try_get::<UserId, _>("user_id").map_err(decode)?,
            friends,
            version: row.try_get::<u64, _>("version").map_err(decode)?,
        })
    }
}

#[async_trait::async_trait]
impl LedgerRepo for MySqlLedgerRepo {
    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<FriendshipLedgerEntry, RelationError> {
        let tx = downcast(tx)?;
        let entry = FriendshipLedgerEntry::empty(user_id);

        let res = sqlx::query(
            r#"
INSERT INTO friends_ledger (user_id, friends, version)
VALUES (?, ?, ?)
"#,
        )
        .bind(user_id)
        .bind(Json(&entry.friends))
        .bind(entry.version)
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(entry),
            Err(e) if is_dup_key(&e) => Err(RelationError::Conflict("ledger_exists")),
            Err(e) if is_missing_reference(&e) => Err(RelationError::NotFound("user")),
            Err(e) => Err(relation_err("insert ledger", e)),
        }
    }

    async fn get(&self, user_id: UserId) -> Result<Option<FriendshipLedgerEntry>, RelationError> {
        let row = sqlx::query("SELECT user_id, friends, version FROM friends_ledger WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| relation_err("select ledger", e))?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<Option<FriendshipLedgerEntry>, RelationError> {
        let tx = downcast(tx)?;

        let row = sqlx::query("SELECT user_id, friends, version FROM friends_ledger WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(tx.conn())
            .await
            .map_err(|e| relation_err("select ledger", e))?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn lock_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<(Option<FriendshipLedgerEntry>, Option<FriendshipLedgerEntry>), RelationError>
    {
        let tx = downcast(tx)?;

        // ascending key order keeps concurrent lockers from deadlocking
        let rows = sqlx::query(
            r#"
SELECT user_id, friends, version
FROM friends_ledger
WHERE user_id IN (?, ?)
ORDER BY user_id ASC
FOR UPDATE
"#,
        )
        .bind(pair.min())
        .bind(pair.max())
        .fetch_all(tx.conn())
        .await
        .map_err(|e| relation_err("lock ledgers", e))?;

        let mut min_entry = None;
        let mut max_entry = None;
        for row in &rows {
            let entry = Self::row_to_entry(row)?;
            if entry.user_id == pair.min() {
                min_entry = Some(entry);
            } else {
                max_entry = Some(entry);
            }
        }

        Ok((min_entry, max_entry))
    }

    async fn save_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        entry: &FriendshipLedgerEntry,
    ) -> Result<FriendshipLedgerEntry, RelationError> {
        let tx = downcast(tx)?;

        let res = sqlx::query(
            r#"
UPDATE friends_ledger
SET friends = ?, version = version + 1
WHERE user_id = ? AND version = ?
"#,
        )
        .bind(Json(&entry.friends))
        .bind(entry.user_id)
        .bind(entry.version)
        .execute(tx.conn())
        .await
        .map_err(|e| relation_err("update ledger", e))?;

        if res.rows_affected() == 0 {
            return Err(RelationError::Contended(format!(
                "ledger {} is no longer at version {}",
                entry.user_id, entry.version
            )));
        }

        Ok(FriendshipLedgerEntry {
            version: entry.version + 1,
            ..entry.clone()
        })
    }
}
