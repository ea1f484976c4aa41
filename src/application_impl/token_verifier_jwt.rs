use crate::application_port::{TokenError, TokenVerifier};
use crate::domain_model::UserId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub signing_key: Vec<u8>,
}

/// Claims of an access token issued by the auth service.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // user id
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

/// Verifies HS256 access tokens; issuing them is the auth service's job.
pub struct JwtHs256Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtHs256Verifier {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[cfg.audience.clone()]);
        validation.set_issuer(&[cfg.issuer.clone()]);

        Self {
            key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
        }
    }
}

#[async_trait::async_trait]
impl TokenVerifier for JwtHs256Verifier {
    async fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<AccessClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        UserId::from_str(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    fn cfg() -> JwtConfig {
        JwtConfig {
            issuer: "auth.example.com".into(),
            audience: "socialgraph".into(),
            signing_key: b"test-signing-key".to_vec(),
        }
    }

    fn token(cfg: &JwtConfig, sub: &str, aud: &str, exp_in: Duration) -> String {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: sub.to_owned(),
            exp: (now + exp_in).timestamp(),
            iat: now.timestamp(),
            iss: cfg.issuer.clone(),
            aud: aud.to_owned(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&cfg.signing_key),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn accepts_a_valid_token() {
        let cfg = cfg();
        let user = Uuid::new_v4();
        let verifier = JwtHs256Verifier::new(&cfg);

        let t = token(&cfg, &user.to_string(), &cfg.audience, Duration::minutes(5));
        assert_eq!(verifier.verify(&t).await.unwrap(), UserId(user));
    }

    #[tokio::test]
    async fn rejects_expired_foreign_and_garbled_tokens() {
        let cfg = cfg();
        let user = Uuid::new_v4().to_string();
        let verifier = JwtHs256Verifier::new(&cfg);

        let expired = token(&cfg, &user, &cfg.audience, Duration::minutes(-10));
        assert_eq!(verifier.verify(&expired).await, Err(TokenError::Expired));

        let foreign = token(&cfg, &user, "another-service", Duration::minutes(5));
        assert_eq!(verifier.verify(&foreign).await, Err(TokenError::Invalid));

        let not_a_user = token(&cfg, "alice", &cfg.audience, Duration::minutes(5));
        assert_eq!(verifier.verify(&not_a_user).await, Err(TokenError::Invalid));

        assert_eq!(verifier.verify("garbage").await, Err(TokenError::Invalid));
    }
}
