use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

pub type UserId = i64;

#[async_trait]
pub trait UserRepo: Sync + Send {
    async fn get_user(&self, user_id: UserId) -> Result<User, UserRepoError>;
    async fn get_user_by_username(&self, username: &str) -> Result<User, UserRepoError>;
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserRepoError>;
    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), UserRepoError>;
}

#[derive(Clone, PartialEq, Debug)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub cash: Decimal,
}

impl User {
    pub const fn new(id: UserId, username: String, password_hash: String, cash: Decimal) -> User {
        User {
            id,
            username,
            password_hash,
            cash,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub cash: Decimal,
}

impl NewUser {
    pub const fn new(username: String, password_hash: String, cash: Decimal) -> NewUser {
        NewUser {
            username,
            password_hash,
            cash,
        }
    }
}

#[derive(Error, Debug)]
pub enum UserRepoError {
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error("User {0} already exists")]
    UserAlreadyExists(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
