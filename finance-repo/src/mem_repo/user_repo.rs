use crate::mem_repo::MemRepo;
use crate::user_repo::UserRepoError::{UserAlreadyExists, UserNotFound};
use crate::user_repo::{NewUser, User, UserId, UserRepo, UserRepoError};
use async_trait::async_trait;
use std::collections::hash_map::Entry;

#[async_trait]
impl UserRepo for MemRepo {
    async fn get_user(&self, user_id: UserId) -> Result<User, UserRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| UserNotFound(user_id.to_string()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, UserRepoError> {
        let read_guard = self.read_lock()?;

        let Some(user_id) = read_guard.usernames.get(username) else {
            return Err(UserNotFound(username.to_owned()));
        };
        let user = read_guard
            .users
            .get(user_id)
            .expect("users should contain same ids as usernames")
            .clone();
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, UserRepoError> {
        let mut write_guard = self.write_lock()?;
        let state = &mut *write_guard;

        match state.usernames.entry(new_user.username.clone()) {
            Entry::Occupied(_) => Err(UserAlreadyExists(new_user.username)),
            Entry::Vacant(e) => {
                let user_id = state.next_user_id;
                state.next_user_id += 1;
                e.insert(user_id);

                let user = User::new(
                    user_id,
                    new_user.username,
                    new_user.password_hash,
                    new_user.cash,
                );
                state.users.insert(user_id, user.clone());
                Ok(user)
            }
        }
    }

    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), UserRepoError> {
        let mut write_guard = self.write_lock()?;

        match write_guard.users.get_mut(&user_id) {
            Some(user) => {
                user.password_hash = password_hash.to_owned();
                Ok(())
            }
            None => Err(UserNotFound(user_id.to_string())),
        }
    }
}
