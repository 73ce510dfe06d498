//! Credential store and username search.
//!
//! Queries mirror the routes directly: a uniqueness check on signup, a
//! verbatim credential comparison on login, and a case-insensitive
//! substring search capped at 10 rows. No hashing and no pagination,
//! matching the facade this backend exposes.

use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Database;

/// Maximum number of rows returned by a username search.
const SEARCH_LIMIT: i64 = 10;

#[derive(Error, Debug)]
pub enum UserStoreError {
    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("user query failed: {0}")]
    QueryFailed(String),
}

/// A user row as returned to the HTTP layer.
///
/// The password column never leaves this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub created_at: String,
}

/// Store for user accounts.
#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    /// Create a new user store.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a user with the given credentials.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRow, UserStoreError> {
        if self.find_by_username(username).await?.is_some() {
            return Err(UserStoreError::UsernameTaken(username.to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO users (id, username, password) VALUES (?, ?, ?)",
            libsql::params![id.clone(), username, password],
        )
        .await
        .map_err(|e| UserStoreError::QueryFailed(format!("Failed to insert user: {}", e)))?;

        debug!(user_id = %id, "Created user");

        // Read the row back so created_at reflects what the database stored
        self.find_by_username(username)
            .await?
            .ok_or_else(|| UserStoreError::QueryFailed("User missing after insert".to_string()))
    }

    /// Look up a user by username.
    #[instrument(skip(self), fields(username = %username))]
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRow>, UserStoreError> {
        let conn = self.db.connection();
        let mut rows = conn
            .query(
                "SELECT id, username, created_at FROM users WHERE username = ?",
                libsql::params![username],
            )
            .await
            .map_err(|e| UserStoreError::QueryFailed(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| UserStoreError::QueryFailed(format!("Failed to read row: {}", e)))?
        {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Check a username/password pair against the stored credentials.
    ///
    /// The comparison is a verbatim string match. Returns the user on
    /// success, `None` for an unknown username or a wrong password.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRow>, UserStoreError> {
        let conn = self.db.connection();
        let mut rows = conn
            .query(
                "SELECT id, username, created_at, password FROM users WHERE username = ?",
                libsql::params![username],
            )
            .await
            .map_err(|e| UserStoreError::QueryFailed(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| UserStoreError::QueryFailed(format!("Failed to read row: {}", e)))?
        {
            Some(row) => {
                let stored: String = row
                    .get(3)
                    .map_err(|e| UserStoreError::QueryFailed(format!("Failed to get password: {}", e)))?;
                if stored == password {
                    Ok(Some(row_to_user(&row)?))
                } else {
                    debug!("Password mismatch");
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Search usernames by case-insensitive substring match.
    ///
    /// An empty query matches everyone. At most 10 rows are returned.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_users(&self, query: &str) -> Result<Vec<UserRow>, UserStoreError> {
        let conn = self.db.connection();
        let mut rows = conn
            .query(
                "SELECT id, username, created_at FROM users \
                 WHERE username LIKE '%' || ? || '%' LIMIT ?",
                libsql::params![query, SEARCH_LIMIT],
            )
            .await
            .map_err(|e| UserStoreError::QueryFailed(e.to_string()))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| UserStoreError::QueryFailed(format!("Failed to read row: {}", e)))?
        {
            users.push(row_to_user(&row)?);
        }

        debug!(count = users.len(), "Username search complete");
        Ok(users)
    }
}

fn row_to_user(row: &libsql::Row) -> Result<UserRow, UserStoreError> {
    let id: String = row
        .get(0)
        .map_err(|e| UserStoreError::QueryFailed(format!("Failed to get id: {}", e)))?;
    let username: String = row
        .get(1)
        .map_err(|e| UserStoreError::QueryFailed(format!("Failed to get username: {}", e)))?;
    let created_at: String = row
        .get(2)
        .map_err(|e| UserStoreError::QueryFailed(format!("Failed to get created_at: {}", e)))?;

    Ok(UserRow {
        id,
        username,
        created_at,
    })
}
