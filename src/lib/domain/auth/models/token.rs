use std::str::FromStr;

use thiserror::Error;

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::models::user::UserId;

/// Purpose a signed token was issued for. Only [TokenType::Access] opens the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
    ResetPassword,
    VerifyEmail,
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{0} is not a known token type")]
pub struct TokenTypeInvalidError(String);

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::ResetPassword => "resetPassword",
            TokenType::VerifyEmail => "verifyEmail",
        }
    }
}

impl FromStr for TokenType {
    type Err = TokenTypeInvalidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenType::Access),
            "refresh" => Ok(TokenType::Refresh),
            "resetPassword" => Ok(TokenType::ResetPassword),
            "verifyEmail" => Ok(TokenType::VerifyEmail),
            _ => Err(TokenTypeInvalidError(s.to_string())),
        }
    }
}

/// Verified content of a bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenClaims {
    subject: UserId,
    token_type: TokenType,
}

impl TokenClaims {
    pub fn new(subject: UserId, token_type: TokenType) -> Self {
        Self {
            subject,
            token_type,
        }
    }

    pub fn subject(&self) -> &UserId {
        &self.subject
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("invalid token: {0}")]
pub struct InvalidTokenError(pub String);

#[derive(Debug, Error)]
pub enum AuthenticateError {
    #[error(transparent)]
    InvalidToken(#[from] InvalidTokenError),
    #[error("invalid token type")]
    WrongTokenType,
    #[error("user {id} does not exist")]
    UnknownUser { id: UserId },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("missing permission {permission}")]
pub struct AuthorizeError {
    pub permission: Permission,
}
