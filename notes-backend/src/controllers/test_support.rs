//! Shared fixtures for controller tests.

use actix_web::web;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use crate::config::{Config, MutationMode};
use crate::db::Database;
use crate::AppState;

/// Fresh database in a temp dir, wrapped in app state. Keep the `TempDir`
/// alive for the duration of the test.
pub fn test_state(mutation_mode: MutationMode) -> (TempDir, web::Data<AppState>) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db = Database::new(db_path.to_str().unwrap()).expect("Failed to create database");

    let config = Config {
        database_url: db_path.to_string_lossy().to_string(),
        mutation_mode,
        ..Config::default()
    };

    let state = web::Data::new(AppState {
        db: Arc::new(db),
        config,
    });
    (dir, state)
}

/// Create a user with an open session. Returns `(user_id, token)`.
pub fn login(db: &Database, username: &str) -> (String, String) {
    let user = db.create_user(username, "not-a-real-hash").unwrap();
    let session = db.create_session(&user.id, 24).unwrap();
    (user.id, session.token)
}
