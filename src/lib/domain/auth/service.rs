use crate::domain::auth::models::role::Permission;
use crate::domain::auth::models::token::{AuthenticateError, AuthorizeError, TokenType};
use crate::domain::auth::models::user::{User, UserId};
use crate::domain::auth::ports::{AuthService, TokenVerifier, UserDirectory};

/// Canonical implementation of the [AuthService] port.
#[derive(Debug, Clone)]
pub struct Service<T: TokenVerifier, U: UserDirectory> {
    tokens: T,
    users: U,
}

impl<T: TokenVerifier, U: UserDirectory> Service<T, U> {
    pub fn new(tokens: T, users: U) -> Self {
        Self { tokens, users }
    }
}

impl<T: TokenVerifier, U: UserDirectory> AuthService for Service<T, U> {
    async fn authenticate(&self, token: &str) -> Result<User, AuthenticateError> {
        let claims = self.tokens.verify(token)?;

        if claims.token_type() != TokenType::Access {
            return Err(AuthenticateError::WrongTokenType);
        }

        self.users
            .find_user_by_id(claims.subject())
            .await?
            .ok_or(AuthenticateError::UnknownUser {
                id: *claims.subject(),
            })
    }

    fn authorize(
        &self,
        user: &User,
        required: &[Permission],
        owner: Option<&UserId>,
    ) -> Result<(), AuthorizeError> {
        if owner == Some(user.id()) {
            return Ok(());
        }

        match required.iter().find(|p| !user.role().grants(**p)) {
            Some(missing) => Err(AuthorizeError {
                permission: *missing,
            }),
            None => Ok(()),
        }
    }
}
