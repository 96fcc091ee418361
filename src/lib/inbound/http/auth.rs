use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::domain::auth::models::role::Permission;
use crate::domain::auth::models::user::User;
use crate::domain::auth::ports::AuthService;
use crate::inbound::http::responses::ApiError;

/// Resolves the caller from the `Authorization: Bearer <token>` header and checks that their
/// role grants every permission in `required`.
pub(crate) async fn authorize<AS: AuthService>(
    auth_service: &AS,
    headers: &HeaderMap,
    required: &[Permission],
) -> Result<User, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Please authenticate".to_string()))?;

    let user = auth_service.authenticate(token).await?;
    // Devices and transactions are never owned by the caller in the permission sense.
    auth_service.authorize(&user, required, None)?;

    Ok(user)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();

    (!token.is_empty()).then_some(token)
}
