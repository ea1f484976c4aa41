use crate::application_port::{TokenError, TokenVerifier};
use crate::domain_model::UserId;
use std::str::FromStr;

pub const FAKE_TOKEN_PREFIX: &str = "fake-access-token:";

/// Development verifier. `fake-access-token:<uuid>` is that user;
/// `fake-access-token:<name>` is a stable id derived from the name.
#[derive(Debug, Default)]
pub struct FakeTokenVerifier;

impl FakeTokenVerifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl TokenVerifier for FakeTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let subject = token
            .strip_prefix(FAKE_TOKEN_PREFIX)
            .filter(|s| !s.is_empty())
            .ok_or(TokenError::Invalid)?;

        Ok(UserId::from_str(subject).unwrap_or_else(|_| fake_id(subject)))
    }
}

pub fn fake_id(username: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        username.as_bytes(),
    ))
}
