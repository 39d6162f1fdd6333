use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("username {0:?} already taken")]
    UsernameTaken(String),
    /// Backend failure. `MemoryUserStore` never returns it; stores with I/O do.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Storage seam for user records. Implementations must make `insert`
/// atomic: the username check and the write happen as one step.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<User>>;
    async fn insert(&self, new_user: NewUser) -> Result<User, InsertError>;
}

/// Process-memory store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Users>,
}

#[derive(Default)]
struct Users {
    // index = id - 1
    rows: Vec<User>,
    by_username: HashMap<String, usize>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let users = self.inner.read().await;
        Ok(users
            .by_username
            .get(username)
            .map(|&idx| users.rows[idx].clone()))
    }

    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<User>> {
        let users = self.inner.read().await;
        let Some(idx) = id.checked_sub(1) else {
            return Ok(None);
        };
        Ok(usize::try_from(idx)
            .ok()
            .and_then(|idx| users.rows.get(idx))
            .cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, InsertError> {
        let mut users = self.inner.write().await;
        if users.by_username.contains_key(&new_user.username) {
            return Err(InsertError::UsernameTaken(new_user.username));
        }

        let idx = users.rows.len();
        let user = User {
            id: idx as u64 + 1,
            username: new_user.username,
            password_hash: new_user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.by_username.insert(user.username.clone(), idx);
        users.rows.push(user.clone());
        debug!(user_id = user.id, "user inserted");
        Ok(user)
    }
}
