use crate::transaction_repo::{Transaction, TransactionRepo};
use crate::user_repo::{User, UserId, UserRepo};
use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

mod transaction_repo;
mod user_repo;

/// Users and their transactions live in one state so that a trade can update both under a single
/// write lock.
struct State {
    users: HashMap<UserId, User>,
    usernames: HashMap<String, UserId>,
    transactions: HashMap<UserId, Vec<Transaction>>,
    next_user_id: UserId,
    next_transaction_id: i64,
}

pub struct MemRepo {
    state: RwLock<State>,
}

impl MemRepo {
    pub fn new() -> MemRepo {
        let state = State {
            users: HashMap::new(),
            usernames: HashMap::new(),
            transactions: HashMap::new(),
            next_user_id: 1,
            next_transaction_id: 1,
        };
        MemRepo {
            state: RwLock::new(state),
        }
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<State>, anyhow::Error> {
        self.state
            .read()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<State>, anyhow::Error> {
        self.state
            .write()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }
}

impl Default for MemRepo {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_repos() -> (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>) {
    let repo = Arc::new(MemRepo::new());
    let user_repo: Arc<dyn UserRepo> = repo.clone();
    let transaction_repo: Arc<dyn TransactionRepo> = repo;
    (user_repo, transaction_repo)
}
