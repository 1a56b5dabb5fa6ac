use chrono::{DateTime, Utc};

/// A web login session, keyed by bearer token
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}
