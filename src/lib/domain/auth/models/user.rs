use derive_more::Display;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::auth::models::role::Role;

/// Represents always valid user identifier.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(Uuid);

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0} is not a valid user id")]
pub struct UserIdError(String);
impl UserId {
    pub fn new(raw_id: &str) -> Result<Self, UserIdError> {
        match Uuid::try_parse(raw_id) {
            Ok(uuid) if !uuid.is_nil() => Ok(UserId(uuid)),
            _ => Err(UserIdError(raw_id.to_string())),
        }
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

/// Account as known to the user directory. Accounts are managed elsewhere; this crate only
/// reads them to resolve a caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    role: Role,
}

impl User {
    pub fn new(id: UserId, name: String, email: String, role: Role) -> Self {
        Self {
            id,
            name,
            email,
            role,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
