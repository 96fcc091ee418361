use anyhow::Context;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::auth::models::token::{InvalidTokenError, TokenClaims, TokenType};
use crate::domain::auth::models::user::UserId;
use crate::domain::auth::ports::TokenVerifier;

/// Wire form of the claims signed by the user service.
#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(rename = "type")]
    token_type: String,
}

/// HS256 tokens sharing a secret with the service that issues them.
#[derive(Clone)]
pub struct JwtTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtTokens {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a token for `user_id` valid for `ttl`.
    pub fn issue(
        &self,
        user_id: &UserId,
        token_type: TokenType,
        ttl: chrono::Duration,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: token_type.as_str().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .with_context(|| format!("failed to sign token for user {}", user_id))
    }
}

impl TokenVerifier for JwtTokens {
    fn verify(&self, token: &str) -> Result<TokenClaims, InvalidTokenError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| InvalidTokenError(e.to_string()))?;

        let subject =
            UserId::new(&data.claims.sub).map_err(|e| InvalidTokenError(e.to_string()))?;
        let token_type = data
            .claims
            .token_type
            .parse::<TokenType>()
            .map_err(|e| InvalidTokenError(e.to_string()))?;

        Ok(TokenClaims::new(subject, token_type))
    }
}
