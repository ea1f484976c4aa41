mod conversation_repo_memory;
mod friend_request_repo_memory;
mod ledger_repo_memory;
mod post_repo_memory;
mod user_repo_memory;

pub use conversation_repo_memory::*;
pub use friend_request_repo_memory::*;
pub use ledger_repo_memory::*;
pub use post_repo_memory::*;
pub use user_repo_memory::*;

mod store;

pub use store::{MemoryStore, MemoryTx, MemoryTxManager};

use crate::domain_port::StorageBackend;
use std::sync::Arc;

pub fn memory_backend(store: &MemoryStore) -> StorageBackend {
    StorageBackend {
        tx_manager: Arc::new(MemoryTxManager::new(store.clone())),
        user_repo: Arc::new(MemoryUserRepo::new(store.clone())),
        ledger_repo: Arc::new(MemoryLedgerRepo::new(store.clone())),
        request_repo: Arc::new(MemoryFriendRequestRepo::new(store.clone())),
        conversation_repo: Arc::new(MemoryConversationRepo::new(store.clone())),
        post_repo: Arc::new(MemoryPostRepo::new(store.clone())),
    }
}
