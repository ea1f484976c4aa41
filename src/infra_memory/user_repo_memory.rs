use super::store::MemoryStore;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryUserRepo {
    store: MemoryStore,
}

impl MemoryUserRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryUserRepo { store }
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn exists(&self, user_id: UserId) -> Result<bool, RelationError> {
        Ok(self.store.snapshot().await.users.contains_key(&user_id))
    }

    async fn public_profiles(
        &self,
        user_ids: &[UserId],
        filter: ProfileFilter,
    ) -> Result<Vec<PublicProfile>, RelationError> {
        let state = self.store.snapshot().await;
        let profiles = user_ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .filter(|u| filter == ProfileFilter::Any || u.is_online)
            .map(UserRecord::public_profile)
            .collect();
        Ok(profiles)
    }
}
