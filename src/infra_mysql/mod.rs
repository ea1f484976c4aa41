mod conversation_repo_mysql;
mod friend_request_repo_mysql;
mod ledger_repo_mysql;
mod post_repo_mysql;
mod user_repo_mysql;

pub use conversation_repo_mysql::*;
pub use friend_request_repo_mysql::*;
pub use ledger_repo_mysql::*;
pub use post_repo_mysql::*;
pub use user_repo_mysql::*;

mod repo_tx_mysql;

pub use repo_tx_mysql::*;

mod util;

use crate::domain_port::StorageBackend;
use sqlx::MySqlPool;
use std::sync::Arc;

pub fn mysql_backend(pool: &MySqlPool) -> StorageBackend {
    StorageBackend {
        tx_manager: Arc::new(MySqlTxManager::new(pool.clone())),
        user_repo: Arc::new(MySqlUserRepo::new(pool.clone())),
        ledger_repo: Arc::new(MySqlLedgerRepo::new(pool.clone())),
        request_repo: Arc::new(MySqlFriendRequestRepo::new(pool.clone())),
        conversation_repo: Arc::new(MySqlConversationRepo::new(pool.clone())),
        post_repo: Arc::new(MySqlPostRepo::new(pool.clone())),
    }
}
