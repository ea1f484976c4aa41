use crate::application_port::*;
use crate::domain_model::*;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub is_online: bool,
}

impl UserRecord {
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            user_id: self.user_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFilter {
    Any,
    OnlineOnly,
}

/// Read side of the identity store. The graph never writes users.
#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn exists(&self, user_id: UserId) -> Result<bool, RelationError>;

    /// Profiles of the given users in the order of `user_ids`; unknown ids
    /// are skipped.
    async fn public_profiles(
        &self,
        user_ids: &[UserId],
        filter: ProfileFilter,
    ) -> Result<Vec<PublicProfile>, RelationError>;
}
