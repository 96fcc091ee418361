use anyhow::Context;
use sqlx::FromRow;

use crate::domain::auth::models::role::Role;
use crate::domain::auth::models::user::{User, UserId};
use crate::domain::auth::ports::UserDirectory;
use crate::outbound::sqlite::Sqlite;

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User::new(
            UserId::new(&row.id)?,
            row.name,
            row.email,
            row.role.parse::<Role>()?,
        ))
    }
}

impl Sqlite {
    /// Seeds an account. Accounts are owned by the user service, so this exists for
    /// provisioning and tests only.
    pub async fn insert_user(&self, user: &User) -> Result<(), anyhow::Error> {
        sqlx::query("INSERT INTO users (id, name, email, role) VALUES (?, ?, ?, ?)")
            .bind(user.id().to_string())
            .bind(user.name())
            .bind(user.email())
            .bind(user.role().as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to save user {}", user.id()))?;

        Ok(())
    }
}

impl UserDirectory for Sqlite {
    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, anyhow::Error> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to fetch user {}", id))?;

        row.map(User::try_from).transpose()
    }
}
