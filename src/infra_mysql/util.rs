use super::repo_tx_mysql::MySqlTx;
use crate::application_port::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlDatabaseError;

const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;
const ER_DUP_ENTRY: u16 = 1062;
const ER_NO_REFERENCED_ROW_2: u16 = 1452;

pub fn downcast(tx: &mut dyn StorageTx) -> Result<&mut MySqlTx, RelationError> {
    tx.as_any_mut()
        .downcast_mut::<MySqlTx>()
        .ok_or_else(|| RelationError::Store("transaction is not a mysql transaction".into()))
}

fn mysql_error_number(err: &sqlx::Error) -> Option<u16> {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return Some(mysql_err.number());
        }
    }

    None
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    mysql_error_number(err) == Some(ER_DUP_ENTRY)
}

pub fn is_missing_reference(err: &sqlx::Error) -> bool {
    mysql_error_number(err) == Some(ER_NO_REFERENCED_ROW_2)
}

/// Deadlocks and lock-wait timeouts roll the transaction back and are worth
/// another attempt.
pub fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        mysql_error_number(err),
        Some(ER_LOCK_DEADLOCK | ER_LOCK_WAIT_TIMEOUT)
    )
}

pub fn relation_err(context: &str, err: sqlx::Error) -> RelationError {
    if is_transient(&err) {
        RelationError::Contended(format!("{context}: {err}"))
    } else {
        RelationError::Store(format!("{context}: {err}"))
    }
}

pub fn feed_err(context: &str, err: sqlx::Error) -> FeedError {
    FeedError::Store(format!("{context}: {err}"))
}
