//! Note document operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::super::sqlite::parse_timestamp;
use super::super::{Database, StoreError};
use crate::models::{normalize_id, strip_reserved, Note, NoteFields, PopulatedNote, UserSummary};

const NOTE_COLUMNS: &str = "n.id, n.owner, n.fields, n.created_at, n.updated_at";

/// Parse a client-supplied note id into its stored form.
pub fn parse_note_id(raw: &str) -> Result<String, StoreError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| StoreError::InvalidId(raw.to_string()))
}

impl Database {
    /// Insert a new note owned by `owner`. Reserved keys in `fields`
    /// (including any client-sent `owner`) are dropped.
    pub fn create_note(&self, owner: &str, fields: NoteFields) -> Result<Note, StoreError> {
        let owner = normalize_id(owner);
        if owner.is_empty() {
            return Err(StoreError::InvalidDocument("owner is required".to_string()));
        }

        let fields = strip_reserved(fields);
        let encoded = serde_json::to_string(&fields)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO notes (id, owner, fields, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![&id, &owner, &encoded, &now_str],
        )?;

        Ok(Note {
            id,
            owner,
            fields,
            created_at: now,
            updated_at: now,
        })
    }

    /// Every note, oldest first, joined to its owner's username.
    pub fn find_notes(&self) -> Result<Vec<PopulatedNote>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS}, u.id, u.username
             FROM notes n LEFT JOIN users u ON u.id = n.owner
             ORDER BY n.rowid ASC"
        ))?;

        let notes = stmt
            .query_map([], Self::row_to_populated_note)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    /// Notes owned by `owner`, oldest first, joined to the owner's username.
    pub fn find_notes_by_owner(&self, owner: &str) -> Result<Vec<PopulatedNote>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS}, u.id, u.username
             FROM notes n LEFT JOIN users u ON u.id = n.owner
             WHERE n.owner = ?1
             ORDER BY n.rowid ASC"
        ))?;

        let notes = stmt
            .query_map([normalize_id(owner)], Self::row_to_populated_note)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    /// Look up a single note. A malformed id is a fault; an unknown one is `Ok(None)`.
    pub fn find_note_by_id(&self, id: &str) -> Result<Option<Note>, StoreError> {
        let id = parse_note_id(id)?;
        let conn = self.conn()?;

        let note = conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes n WHERE n.id = ?1"),
                [&id],
                Self::row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    /// Merge `patch` into the note's content key by key. Reserved keys are
    /// ignored, so the owner can never change. Returns false if the note is gone.
    pub fn update_note(&self, id: &str, patch: NoteFields) -> Result<bool, StoreError> {
        let id = parse_note_id(id)?;
        let patch = strip_reserved(patch);
        let conn = self.conn()?;

        let current: Option<String> = conn
            .query_row("SELECT fields FROM notes WHERE id = ?1", [&id], |row| row.get(0))
            .optional()?;
        let Some(current) = current else {
            return Ok(false);
        };

        let mut fields: NoteFields = serde_json::from_str(&current)?;
        fields.extend(patch);
        let encoded = serde_json::to_string(&fields)?;

        let rows = conn.execute(
            "UPDATE notes SET fields = ?1, updated_at = ?2 WHERE id = ?3",
            params![&encoded, Utc::now().to_rfc3339(), &id],
        )?;
        Ok(rows > 0)
    }

    /// Remove a note. Returns false if it was already gone.
    pub fn delete_note(&self, id: &str) -> Result<bool, StoreError> {
        let id = parse_note_id(id)?;
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM notes WHERE id = ?1", [&id])?;
        Ok(rows > 0)
    }

    fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
        let fields_str: String = row.get(2)?;
        let created_at_str: String = row.get(3)?;
        let updated_at_str: String = row.get(4)?;

        let fields: NoteFields = serde_json::from_str(&fields_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Note {
            id: row.get(0)?,
            owner: row.get(1)?,
            fields,
            created_at: parse_timestamp(3, &created_at_str)?,
            updated_at: parse_timestamp(4, &updated_at_str)?,
        })
    }

    fn row_to_populated_note(row: &Row) -> rusqlite::Result<PopulatedNote> {
        let note = Self::row_to_note(row)?;
        let user_id: Option<String> = row.get(5)?;
        let username: Option<String> = row.get(6)?;

        let owner = match (user_id, username) {
            (Some(id), Some(username)) => Some(UserSummary { id, username }),
            _ => None,
        };

        Ok(PopulatedNote { note, owner })
    }
}
