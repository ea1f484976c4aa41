use crate::domain_model::{PublicProfile, UserId, UserPair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct FriendRequestId(pub uuid::Uuid);

impl fmt::Display for FriendRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FriendRequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(FriendRequestId)
    }
}

/// Payload of a new friend request. The sender is the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendRequestInput {
    pub sender: UserId,
    pub receiver: UserId,
}

/// A friend request row. Accepted requests stay around with `accepted = true`
/// and never go back to pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendRequest {
    pub request_id: FriendRequestId,
    pub sender: UserId,
    pub receiver: UserId,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn pending(input: FriendRequestInput, created_at: DateTime<Utc>) -> Self {
        Self {
            request_id: FriendRequestId(uuid::Uuid::new_v4()),
            sender: input.sender,
            receiver: input.receiver,
            accepted: false,
            created_at,
        }
    }

    pub fn pair(&self) -> UserPair {
        UserPair::new(self.sender, self.receiver)
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.sender == user || self.receiver == user
    }

    /// The user on the other side of the request, seen from `user`.
    pub fn counterpart_of(&self, user: UserId) -> UserId {
        if self.sender == user { self.receiver } else { self.sender }
    }
}

/// Which side of a pending request a listing is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSide {
    Received,
    Sent,
}

/// A pending request joined with the profile of the user on the other side.
#[derive(Debug, Clone, Serialize)]
pub struct PendingRequest {
    pub request: FriendRequest,
    pub counterpart: PublicProfile,
}
