//! User account operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::super::sqlite::parse_timestamp;
use super::super::{Database, StoreError};
use crate::models::User;

impl Database {
    /// Register a user. Usernames are unique (case-sensitive, trimmed).
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::InvalidDocument("username is required".to_string()));
        }

        let conn = self.conn()?;

        let taken: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1",
                [username],
                |row| row.get::<_, i64>(0),
            )
            .map(|c| c > 0)?;
        if taken {
            return Err(StoreError::InvalidDocument(format!(
                "username '{}' is already taken",
                username
            )));
        }

        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![&id, username, password_hash, created_at.to_rfc3339()],
        )?;

        Ok(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
                [username.trim()],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE id = ?1",
                [id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let created_at_str: String = row.get(3)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: parse_timestamp(3, &created_at_str)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_lookup_user() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();

        let user = db.create_user(" alice ", "hash").expect("Failed to create user");
        assert_eq!(user.username, "alice");

        let by_name = db.get_user_by_username("alice").unwrap().expect("user should exist");
        assert_eq!(by_name.id, user.id);

        let by_id = db.get_user_by_id(&user.id).unwrap().expect("user should exist");
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.password_hash, "hash");

        assert!(db.get_user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_and_empty_usernames_rejected() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();

        db.create_user("alice", "hash").unwrap();
        let dup = db.create_user("alice", "other");
        assert!(matches!(dup, Err(StoreError::InvalidDocument(ref msg)) if msg.contains("already taken")));

        assert!(matches!(db.create_user("", "hash"), Err(StoreError::InvalidDocument(_))));
    }
}
