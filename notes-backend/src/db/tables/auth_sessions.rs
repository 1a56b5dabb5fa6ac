//! Auth session database operations

use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::super::sqlite::parse_timestamp;
use super::super::{Database, StoreError};
use crate::models::Session;

impl Database {
    /// Create a new auth session for `user_id`, valid for `ttl_hours`
    pub fn create_session(&self, user_id: &str, ttl_hours: i64) -> Result<Session, StoreError> {
        let conn = self.conn()?;
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::hours(ttl_hours);

        conn.execute(
            "INSERT INTO auth_sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                &token,
                user_id,
                created_at.to_rfc3339(),
                expires_at.to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Session {
            id,
            token,
            user_id: user_id.to_string(),
            expires_at,
        })
    }

    /// Validate a session token and extend its expiry if valid
    pub fn validate_session(
        &self,
        token: &str,
        ttl_hours: i64,
    ) -> Result<Option<Session>, StoreError> {
        let conn = self.conn()?;
        let now = Utc::now();

        let session = conn
            .query_row(
                "SELECT id, token, user_id, expires_at FROM auth_sessions
                 WHERE token = ?1 AND expires_at > ?2",
                params![token, now.to_rfc3339()],
                |row| {
                    let expires_at_str: String = row.get(3)?;

                    Ok(Session {
                        id: row.get(0)?,
                        token: row.get(1)?,
                        user_id: row.get(2)?,
                        expires_at: parse_timestamp(3, &expires_at_str)?,
                    })
                },
            )
            .optional()?;

        // Keep active sessions alive
        let Some(mut session) = session else {
            return Ok(None);
        };
        let new_expires = now + Duration::hours(ttl_hours);
        if let Err(e) = conn.execute(
            "UPDATE auth_sessions SET expires_at = ?1 WHERE token = ?2",
            params![new_expires.to_rfc3339(), token],
        ) {
            log::warn!("[AUTH] Failed to extend session {}: {}", session.id, e);
        } else {
            session.expires_at = new_expires;
        }

        Ok(Some(session))
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let rows_affected = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", [token])?;
        Ok(rows_affected > 0)
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired_sessions(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM auth_sessions WHERE expires_at <= ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_session_lifecycle() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();

        let session = db.create_session("u1", 24).expect("Failed to create session");
        let valid = db
            .validate_session(&session.token, 24)
            .unwrap()
            .expect("session should be valid");
        assert_eq!(valid.user_id, "u1");
        assert!(valid.expires_at >= session.expires_at);

        assert!(db.delete_session(&session.token).unwrap());
        assert!(db.validate_session(&session.token, 24).unwrap().is_none());
        assert!(!db.delete_session(&session.token).unwrap());
    }

    #[test]
    fn test_expired_sessions_rejected_and_purged() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();

        let expired = db.create_session("u1", -1).unwrap();
        let live = db.create_session("u2", 24).unwrap();

        assert!(db.validate_session(&expired.token, 24).unwrap().is_none());
        assert_eq!(db.purge_expired_sessions().unwrap(), 1);
        assert!(db.validate_session(&live.token, 24).unwrap().is_some());
    }

    #[test]
    fn test_unknown_token() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        assert!(db.validate_session("nope", 24).unwrap().is_none());
    }
}
