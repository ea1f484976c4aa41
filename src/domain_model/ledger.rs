use crate::domain_model::UserId;
use serde::Serialize;

/// Per-user friend list. Insertion ordered, no duplicates, never contains the
/// owner. `version` is the row-version token checked on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendshipLedgerEntry {
    pub user_id: UserId,
    pub friends: Vec<UserId>,
    pub version: u64,
}

impl FriendshipLedgerEntry {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            friends: Vec::new(),
            version: 0,
        }
    }

    pub fn is_friend(&self, candidate: UserId) -> bool {
        self.friends.contains(&candidate)
    }

    /// Appends `friend`; `false` when it is already listed or is the owner.
    pub fn push_friend(&mut self, friend: UserId) -> bool {
        if friend == self.user_id || self.is_friend(friend) {
            return false;
        }
        self.friends.push(friend);
        true
    }

    /// Drops `friend`; `false` when it was not listed.
    pub fn remove_friend(&mut self, friend: UserId) -> bool {
        let before = self.friends.len();
        self.friends.retain(|f| *f != friend);
        self.friends.len() != before
    }
}
