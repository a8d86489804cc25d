use finance_repo::transaction_repo::TransactionRepo;
use finance_repo::user_repo::UserRepo;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

pub mod test_user;

#[derive(Debug)]
pub enum RepoType {
    SQLx,
    Mem,
}

pub async fn build_repos(repo_type: RepoType) -> (Arc<dyn UserRepo>, Arc<dyn TransactionRepo>) {
    match repo_type {
        // a single connection keeps every query on the same in-memory database
        RepoType::SQLx => finance_repo::sqlx_repo::create_repos("sqlite::memory:", 1)
            .await
            .unwrap(),
        RepoType::Mem => finance_repo::mem_repo::create_repos(),
    }
}

/// A SQLite database file in the temp directory, removed with its WAL files on drop.
#[allow(dead_code)]
pub struct TempDatabase {
    path: PathBuf,
}

#[allow(dead_code)]
impl TempDatabase {
    pub fn new() -> TempDatabase {
        let path = std::env::temp_dir().join(format!("finance-test-{}.db", Uuid::new_v4()));
        TempDatabase { path }
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}
