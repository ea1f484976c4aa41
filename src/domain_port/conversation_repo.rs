use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait ConversationRepo: Send + Sync {
    /// The conversation whose member set is exactly the pair.
    async fn find_direct_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<ConversationId>, RelationError>;

    async fn find_direct(&self, pair: UserPair) -> Result<Option<Conversation>, RelationError>;

    /// Fails with `Conflict` if the pair already has a direct conversation.
    async fn create_direct_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
        conversation_id: ConversationId,
    ) -> Result<Conversation, RelationError>;

    async fn delete_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        conversation_id: ConversationId,
    ) -> Result<(), RelationError>;
}
