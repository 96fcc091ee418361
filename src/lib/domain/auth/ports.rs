use std::future::Future;

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::models::token::{
    AuthenticateError, AuthorizeError, InvalidTokenError, TokenClaims,
};
use crate::domain::auth::models::user::{User, UserId};

/// `AuthService` is the public API of the access guard.
pub trait AuthService: Clone + Send + Sync + 'static {
    /// Resolves the account behind a bearer token.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<User, AuthenticateError>> + Send;

    /// Succeeds when `user`'s role grants every permission in `required`, or when the resource
    /// belongs to `user` (`owner` equals the caller's id).
    fn authorize(
        &self,
        user: &User,
        required: &[Permission],
        owner: Option<&UserId>,
    ) -> Result<(), AuthorizeError>;
}

/// `TokenVerifier` checks a bearer token's signature and expiry and exposes its claims.
pub trait TokenVerifier: Send + Sync + Clone + 'static {
    fn verify(&self, token: &str) -> Result<TokenClaims, InvalidTokenError>;
}

/// `UserDirectory` is a read-only view of the accounts owned by the user service.
pub trait UserDirectory: Send + Sync + Clone + 'static {
    fn find_user_by_id(
        &self,
        id: &UserId,
    ) -> impl Future<Output = Result<Option<User>, anyhow::Error>> + Send;
}
