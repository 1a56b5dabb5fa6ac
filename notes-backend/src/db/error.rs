//! Store fault taxonomy shared by every table module.

use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Identifier that can never name a stored document
    #[error("invalid id '{0}'")]
    InvalidId(String),

    #[error("no document found with id '{0}'")]
    NotFound(String),

    /// Document rejected before it reached the database
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("document encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database connection lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Stable fault name exposed to clients
    pub fn name(&self) -> &'static str {
        match self {
            StoreError::InvalidId(_) => "InvalidIdError",
            StoreError::NotFound(_) => "NotFoundError",
            StoreError::InvalidDocument(_) => "ValidationError",
            StoreError::Sqlite(_) | StoreError::Poisoned => "DatabaseError",
            StoreError::Json(_) => "DocumentError",
        }
    }

    /// Serialized fault, used as the response body whenever a store call fails
    pub fn to_body(&self) -> Value {
        json!({
            "name": self.name(),
            "message": self.to_string(),
        })
    }
}
