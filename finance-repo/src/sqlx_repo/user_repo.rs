use crate::sqlx_repo::SQLxRepo;
use crate::user_repo::{NewUser, User, UserId, UserRepo, UserRepoError};
use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{query, query_as};
use std::str::FromStr;
use tracing::instrument;

// cash is read back as text so databases that declared it NUMERIC still decode exactly
const SELECT_USER: &str = "SELECT id, username, hash, CAST(cash AS TEXT) AS cash FROM users";

#[derive(sqlx::FromRow)]
struct UserEntry {
    id: i64,
    username: String,
    hash: String,
    cash: String,
}

impl TryFrom<UserEntry> for User {
    type Error = anyhow::Error;

    fn try_from(value: UserEntry) -> Result<Self, Self::Error> {
        let cash = Decimal::from_str(&value.cash)
            .with_context(|| format!("Invalid cash value stored for user {}", value.id))?;
        Ok(User::new(value.id, value.username, value.hash, cash))
    }
}

#[async_trait]
impl UserRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn get_user(&self, user_id: UserId) -> Result<User, UserRepoError> {
        let sql = format!("{} WHERE id = ?", SELECT_USER);
        let user: Option<UserEntry> = query_as(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to get user {}", user_id))?;
        let user = user.ok_or_else(|| UserRepoError::UserNotFound(user_id.to_string()))?;
        Ok(user.try_into()?)
    }

    #[instrument(skip(self))]
    async fn get_user_by_username(&self, username: &str) -> Result<User, UserRepoError> {
        let sql = format!("{} WHERE username = ?", SELECT_USER);
        let user: Option<UserEntry> = query_as(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to get user {}", username))?;
        let user = user.ok_or_else(|| UserRepoError::UserNotFound(username.to_owned()))?;
        Ok(user.try_into()?)
    }

    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserRepoError> {
        let result = query(
            "INSERT INTO users(username, hash, cash) VALUES(?, ?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.cash.to_string())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to create user {}", new_user.username))?;
        if result.rows_affected() == 1 {
            Ok(User::new(
                result.last_insert_rowid(),
                new_user.username,
                new_user.password_hash,
                new_user.cash,
            ))
        } else {
            Err(UserRepoError::UserAlreadyExists(new_user.username))
        }
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), UserRepoError> {
        let result = query("UPDATE users SET hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to update password for {}", user_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(UserRepoError::UserNotFound(user_id.to_string()))
        }
    }
}
