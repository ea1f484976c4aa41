use super::store::{MemoryStore, staged};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;

pub struct MemoryConversationRepo {
    store: MemoryStore,
}

impl MemoryConversationRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryConversationRepo { store }
    }
}

#[async_trait::async_trait]
impl ConversationRepo for MemoryConversationRepo {
    async fn find_direct_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<ConversationId>, RelationError> {
        Ok(staged(tx)?
            .conversations
            .values()
            .find(|c| c.is_direct_between(pair))
            .map(|c| c.conversation_id))
    }

    async fn find_direct(&self, pair: UserPair) -> Result<Option<Conversation>, RelationError> {
        Ok(self
            .store
            .snapshot()
            .await
            .conversations
            .values()
            .find(|c| c.is_direct_between(pair))
            .cloned())
    }

    async fn create_direct_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
        conversation_id: ConversationId,
    ) -> Result<Conversation, RelationError> {
        let state = staged(tx)?;
        if state.conversations.values().any(|c| c.is_direct_between(pair)) {
            return Err(RelationError::Conflict("conversation_exists"));
        }
        let conversation = Conversation::direct(conversation_id, pair, Utc::now());
        state
            .conversations
            .insert(conversation_id, conversation.clone());
        Ok(conversation)
    }

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        conversation_id: ConversationId,
    ) -> Result<(), RelationError> {
        staged(tx)?
            .conversations
            .remove(&conversation_id)
            .map(|_| ())
            .ok_or(RelationError::NotFound("conversation"))
    }
}
