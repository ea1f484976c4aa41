use crate::domain_model::{UserId, UserPair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct ConversationId(pub uuid::Uuid);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation derived from a friendship. Members are kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    pub conversation_id: ConversationId,
    pub members: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn direct(
        conversation_id: ConversationId,
        pair: UserPair,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation_id,
            members: vec![pair.min(), pair.max()],
            created_at,
        }
    }

    /// True when the member set is exactly the pair.
    pub fn is_direct_between(&self, pair: UserPair) -> bool {
        self.members.len() == 2 && self.members.iter().all(|m| pair.contains(*m))
    }
}
