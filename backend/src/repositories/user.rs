//! User persistence behind a trait so handlers and the reset workflow can be
//! exercised without a database.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::user::{NewUser, User, UserRole};
use crate::types::UserId;

const USER_COLUMNS: &str =
    "user_id, name, email, phone, password, user_role, is_active, created_at";

/// Error from [`UserRepository::create`].
#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn create(&self, user: NewUser) -> Result<User, CreateUserError>;

    /// Returns `false` when no row was updated.
    async fn update_password(&self, id: UserId, password_hash: &str) -> anyhow::Result<bool>;

    async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        phone: &str,
    ) -> anyhow::Result<Option<User>>;

    async fn set_role(&self, id: UserId, role: UserRole) -> anyhow::Result<bool>;

    async fn set_active_by_email(&self, email: &str, active: bool) -> anyhow::Result<bool>;

    /// Newest first.
    async fn list_all(&self) -> anyhow::Result<Vec<User>>;

    /// Newest first.
    async fn list_by_role(&self, role: UserRole) -> anyhow::Result<Vec<User>>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = TRUE");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, CreateUserError> {
        let query = format!(
            "INSERT INTO users (name, email, phone, password, user_role, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if crate::error::is_unique_violation(&err) {
                    CreateUserError::DuplicateEmail
                } else {
                    CreateUserError::Other(err.into())
                }
            })
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE user_id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        phone: &str,
    ) -> anyhow::Result<Option<User>> {
        let query = format!(
            "UPDATE users SET name = $1, phone = $2 WHERE user_id = $3 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(name)
            .bind(phone)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_role(&self, id: UserId, role: UserRole) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET user_role = $1 WHERE user_id = $2")
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_active_by_email(&self, email: &str, active: bool) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET is_active = $1 WHERE email = $2")
            .bind(active)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn list_by_role(&self, role: UserRole) -> anyhow::Result<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_role = $1 ORDER BY created_at DESC"
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }
}
