use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::domain_port::{ConversationRepo, StorageTx};
use std::sync::Arc;
use uuid::Uuid;

/// Owns the two-member conversation implied by a friendship.
#[derive(Clone)]
pub struct ConversationMaterializer {
    conversation_repo: Arc<dyn ConversationRepo>,
}

impl ConversationMaterializer {
    pub fn new(conversation_repo: Arc<dyn ConversationRepo>) -> Self {
        Self { conversation_repo }
    }

    /// `Conflict("conversation_exists")` if the pair already has one.
    pub async fn create_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Conversation, RelationError> {
        let conversation_id = ConversationId(Uuid::new_v4());
        self.conversation_repo
            .create_direct_in_tx(tx, pair, conversation_id)
            .await
    }

    /// Deletes the conversation with exactly the pair as members. Returns the
    /// deleted id, `None` when there was nothing to delete.
    pub async fn delete_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<ConversationId>, RelationError> {
        let Some(conversation_id) = self.conversation_repo.find_direct_in_tx(tx, pair).await?
        else {
            return Ok(None);
        };
        self.conversation_repo
            .delete_in_tx(tx, conversation_id)
            .await?;
        Ok(Some(conversation_id))
    }

    pub async fn find_pair(&self, pair: UserPair) -> Result<Option<Conversation>, RelationError> {
        self.conversation_repo.find_direct(pair).await
    }
}
