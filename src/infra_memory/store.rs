use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

#[derive(Debug, Clone)]
pub(super) struct PostRecord {
    pub summary: PostSummary,
    pub likers: Vec<UserId>,
}

impl PostRecord {
    pub fn to_summary(&self) -> PostSummary {
        PostSummary {
            like_count: self.likers.len() as u32,
            ..self.summary.clone()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct MemoryState {
    pub users: HashMap<UserId, UserRecord>,
    pub ledgers: HashMap<UserId, FriendshipLedgerEntry>,
    pub requests: HashMap<FriendRequestId, FriendRequest>,
    pub conversations: HashMap<ConversationId, Conversation>,
}

/// Process-local storage. A transaction holds the graph state lock for its
/// whole lifetime and works on a staged copy, so every transaction is
/// serializable and an uncommitted one leaves no trace.
///
/// Posts sit behind their own lock and are never staged: no transaction
/// writes them.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    posts: Arc<Mutex<HashMap<PostId, PostRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn snapshot(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().await
    }

    pub(super) async fn posts(&self) -> MutexGuard<'_, HashMap<PostId, PostRecord>> {
        self.posts.lock().await
    }

    // region identity and post collaborators

    pub async fn insert_user(&self, user: UserRecord) {
        self.state.lock().await.users.insert(user.user_id, user);
    }

    pub async fn set_online(&self, user_id: UserId, is_online: bool) {
        if let Some(user) = self.state.lock().await.users.get_mut(&user_id) {
            user.is_online = is_online;
        }
    }

    pub async fn insert_post(
        &self,
        author_id: UserId,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> PostId {
        let post_id = PostId(uuid::Uuid::new_v4());
        let record = PostRecord {
            summary: PostSummary {
                post_id,
                author_id,
                content: content.to_owned(),
                like_count: 0,
                created_at,
            },
            likers: Vec::new(),
        };
        self.posts.lock().await.insert(post_id, record);
        post_id
    }

    /// `false` when there was no such post.
    pub async fn remove_post(&self, post_id: PostId) -> bool {
        self.posts.lock().await.remove(&post_id).is_some()
    }

    // endregion

    pub async fn conversation_count(&self) -> usize {
        self.state.lock().await.conversations.len()
    }
}

pub struct MemoryTxManager {
    store: MemoryStore,
}

impl MemoryTxManager {
    pub fn new(store: MemoryStore) -> Self {
        MemoryTxManager { store }
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin(&self) -> anyhow::Result<Box<dyn StorageTx>> {
        let guard = self.store.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { guard, staged }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait::async_trait]
impl StorageTx for MemoryTx {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryTx { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The staged state of a memory transaction.
pub(super) fn staged(tx: &mut dyn StorageTx) -> Result<&mut MemoryState, RelationError> {
    tx.as_any_mut()
        .downcast_mut::<MemoryTx>()
        .map(|tx| &mut tx.staged)
        .ok_or_else(|| RelationError::Store("transaction is not a memory transaction".into()))
}
