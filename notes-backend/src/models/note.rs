use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::UserSummary;

/// Keys a request body can never set on a note. `owner` comes from the
/// session, the rest are maintained by the store.
pub const RESERVED_FIELDS: &[&str] = &["id", "_id", "owner", "created_at", "updated_at"];

/// Note content as submitted by a client: any JSON object.
pub type NoteFields = Map<String, Value>;

/// A stored note
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: String,
    pub owner: String,
    pub fields: NoteFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Whether the given session user owns this note.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        same_identity(&self.owner, user_id)
    }
}

/// Canonical form of an identifier coming from either the session table or
/// the notes table.
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Loose identifier equality: both sides are normalized before comparing.
/// Empty identifiers never match anything.
pub fn same_identity(a: &str, b: &str) -> bool {
    let a = normalize_id(a);
    let b = normalize_id(b);
    !a.is_empty() && a == b
}

/// Remove every reserved key from client-supplied content.
pub fn strip_reserved(mut fields: NoteFields) -> NoteFields {
    for key in RESERVED_FIELDS {
        fields.remove(*key);
    }
    fields
}

/// How a note's `owner` is rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OwnerRef {
    /// Bare owner id (show, create)
    Id(String),
    /// Owner joined to `{id, username}`; `None` when the user no longer exists
    Populated(Option<UserSummary>),
}

/// JSON view of a note: content fields flattened next to the store-managed ones
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteResponse {
    pub id: String,
    pub owner: OwnerRef,
    #[serde(flatten)]
    pub fields: NoteFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            owner: OwnerRef::Id(note.owner),
            fields: note.fields,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// A note joined with its owner's username projection (list endpoints)
#[derive(Debug, Clone)]
pub struct PopulatedNote {
    pub note: Note,
    pub owner: Option<UserSummary>,
}

impl From<PopulatedNote> for NoteResponse {
    fn from(populated: PopulatedNote) -> Self {
        let note = populated.note;
        Self {
            id: note.id,
            owner: OwnerRef::Populated(populated.owner),
            fields: note.fields,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// `{ "notes": [...] }`
#[derive(Debug, Serialize, Deserialize)]
pub struct NoteListResponse {
    pub notes: Vec<NoteResponse>,
}

/// `{ "note": {...} }`
#[derive(Debug, Serialize, Deserialize)]
pub struct SingleNoteResponse {
    pub note: NoteResponse,
}
