// repo

mod conversation_repo;
mod friend_request_repo;
mod ledger_repo;
mod post_repo;
mod user_repo;

mod repo_tx;

pub use conversation_repo::*;
pub use friend_request_repo::*;
pub use ledger_repo::*;
pub use post_repo::*;
pub use user_repo::*;

pub use repo_tx::*;

use std::sync::Arc;

/// One storage backend's worth of repositories, sharing a transaction manager.
#[derive(Clone)]
pub struct StorageBackend {
    pub tx_manager: Arc<dyn TxManager>,
    pub user_repo: Arc<dyn UserRepo>,
    pub ledger_repo: Arc<dyn LedgerRepo>,
    pub request_repo: Arc<dyn FriendRequestRepo>,
    pub conversation_repo: Arc<dyn ConversationRepo>,
    pub post_repo: Arc<dyn PostRepo>,
}
