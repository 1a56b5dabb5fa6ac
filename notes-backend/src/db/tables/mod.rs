//! Table operations, one module per table, each an `impl Database` block.

mod auth_sessions;
pub mod notes;
mod users;
