use finance_repo::user_repo::{NewUser, User, UserRepo};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

#[allow(dead_code)]
pub async fn create_test_user(user_repo: &Arc<dyn UserRepo>, cash: Decimal) -> User {
    let username = "test-user-".to_owned() + &Uuid::new_v4().to_string();
    let new_user = NewUser::new(username, "not a real hash".to_owned(), cash);
    user_repo.create_user(new_user).await.unwrap()
}
