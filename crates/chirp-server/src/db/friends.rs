//! Friend-list storage.
//!
//! Links are one-directional: adding `bob` to `alice`'s list does not add
//! `alice` to `bob`'s.

use thiserror::Error;
use tracing::{debug, instrument};

use super::Database;

#[derive(Error, Debug)]
pub enum FriendStoreError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("friend query failed: {0}")]
    QueryFailed(String),
}

/// Store for friend links between users.
#[derive(Clone)]
pub struct FriendStore {
    db: Database,
}

impl FriendStore {
    /// Create a new friend store.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add `friend_username` to `username`'s friend list.
    ///
    /// Idempotent: adding an existing link is a no-op. Both usernames must
    /// exist.
    #[instrument(skip(self), fields(user = %username, friend = %friend_username))]
    pub async fn add_friend(
        &self,
        username: &str,
        friend_username: &str,
    ) -> Result<(), FriendStoreError> {
        let user_id = self.resolve_user_id(username).await?;
        let friend_id = self.resolve_user_id(friend_username).await?;

        let conn = self.db.connection();
        conn.execute(
            "INSERT OR IGNORE INTO friends (user_id, friend_id) VALUES (?, ?)",
            libsql::params![user_id, friend_id],
        )
        .await
        .map_err(|e| FriendStoreError::QueryFailed(format!("Failed to insert friend: {}", e)))?;

        debug!("Friend link stored");
        Ok(())
    }

    /// List the usernames on `username`'s friend list.
    #[instrument(skip(self), fields(user = %username))]
    pub async fn list_friends(&self, username: &str) -> Result<Vec<String>, FriendStoreError> {
        let user_id = self.resolve_user_id(username).await?;

        let conn = self.db.connection();
        let mut rows = conn
            .query(
                "SELECT u.username FROM friends f \
                 JOIN users u ON u.id = f.friend_id \
                 WHERE f.user_id = ?",
                libsql::params![user_id],
            )
            .await
            .map_err(|e| FriendStoreError::QueryFailed(e.to_string()))?;

        let mut friends = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| FriendStoreError::QueryFailed(format!("Failed to read row: {}", e)))?
        {
            let name: String = row.get(0).map_err(|e| {
                FriendStoreError::QueryFailed(format!("Failed to get username: {}", e))
            })?;
            friends.push(name);
        }

        debug!(count = friends.len(), "Retrieved friend list");
        Ok(friends)
    }

    async fn resolve_user_id(&self, username: &str) -> Result<String, FriendStoreError> {
        let conn = self.db.connection();
        let mut rows = conn
            .query(
                "SELECT id FROM users WHERE username = ?",
                libsql::params![username],
            )
            .await
            .map_err(|e| FriendStoreError::QueryFailed(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| FriendStoreError::QueryFailed(format!("Failed to read row: {}", e)))?
        {
            Some(row) => row
                .get(0)
                .map_err(|e| FriendStoreError::QueryFailed(format!("Failed to get id: {}", e))),
            None => Err(FriendStoreError::UnknownUser(username.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MigrationRunner, UserStore};

    async fn test_stores() -> (UserStore, FriendStore) {
        let db = Database::in_memory("test").await.unwrap();
        MigrationRunner::schema().run(&db).await.unwrap();
        (UserStore::new(db.clone()), FriendStore::new(db))
    }

    #[tokio::test]
    async fn test_add_and_list_friends() {
        let (users, friends) = test_stores().await;
        users.create_user("alice", "x").await.unwrap();
        users.create_user("bob", "x").await.unwrap();

        friends.add_friend("alice", "bob").await.unwrap();

        let list = friends.list_friends("alice").await.unwrap();
        assert_eq!(list, vec!["bob".to_string()]);

        // Links are one-directional
        assert!(friends.list_friends("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_friend_is_idempotent() {
        let (users, friends) = test_stores().await;
        users.create_user("alice", "x").await.unwrap();
        users.create_user("bob", "x").await.unwrap();

        friends.add_friend("alice", "bob").await.unwrap();
        friends.add_friend("alice", "bob").await.unwrap();

        assert_eq!(friends.list_friends("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_is_an_error() {
        let (users, friends) = test_stores().await;
        users.create_user("alice", "x").await.unwrap();

        let err = friends.add_friend("alice", "ghost").await.unwrap_err();
        assert!(matches!(err, FriendStoreError::UnknownUser(_)));

        let err = friends.list_friends("ghost").await.unwrap_err();
        assert!(matches!(err, FriendStoreError::UnknownUser(_)));
    }
}
