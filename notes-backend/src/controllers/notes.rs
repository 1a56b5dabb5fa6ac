//! Notes REST API — CRUD over note documents with owner-gated mutation.
//!
//! Anyone may list all notes or read one by id. Listing your own notes and
//! creating need a session. Updates and deletes need the session of the
//! note's owner.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::Value;
use std::sync::Arc;

use crate::config::MutationMode;
use crate::db::{Database, StoreError};
use crate::middleware::session::require_session;
use crate::models::{Note, NoteFields, NoteListResponse, SingleNoteResponse};
use crate::AppState;

/// GET /api/notes — every note, owner expanded to `{id, username}`
async fn list_notes(data: web::Data<AppState>) -> impl Responder {
    match data.db.find_notes() {
        Ok(notes) => HttpResponse::Ok().json(NoteListResponse {
            notes: notes.into_iter().map(Into::into).collect(),
        }),
        Err(e) => {
            log::error!("[NOTES] Failed to list notes: {}", e);
            HttpResponse::NotFound().json(e.to_body())
        }
    }
}

/// GET /api/notes/mine — the caller's notes only
async fn list_my_notes(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let session = match require_session(&data, &req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match data.db.find_notes_by_owner(&session.user_id) {
        Ok(notes) => HttpResponse::Ok().json(NoteListResponse {
            notes: notes.into_iter().map(Into::into).collect(),
        }),
        Err(e) => {
            log::error!("[NOTES] Failed to list notes for {}: {}", session.user_id, e);
            HttpResponse::BadRequest().json(e.to_body())
        }
    }
}

/// POST /api/notes — the session user always becomes the owner
async fn create_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let session = match require_session(&data, &req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let fields = match parse_note_body(&body) {
        Ok(fields) => fields,
        Err(e) => {
            log::error!("[NOTES] Rejected note body from {}: {}", session.user_id, e);
            return HttpResponse::NotFound().json(e.to_body());
        }
    };

    match data.db.create_note(&session.user_id, fields) {
        Ok(note) => {
            log::info!("[NOTES] Created note {} for {}", note.id, note.owner);
            HttpResponse::Created().json(SingleNoteResponse { note: note.into() })
        }
        Err(e) => {
            log::error!("[NOTES] Failed to create note: {}", e);
            HttpResponse::NotFound().json(e.to_body())
        }
    }
}

/// GET /api/notes/{id}
async fn show_note(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();

    match data.db.find_note_by_id(&id) {
        Ok(Some(note)) => HttpResponse::Ok().json(SingleNoteResponse { note: note.into() }),
        Ok(None) => {
            let e = StoreError::NotFound(id);
            log::error!("[NOTES] {}", e);
            HttpResponse::NotFound().json(e.to_body())
        }
        Err(e) => {
            log::error!("[NOTES] Failed to load note {}: {}", id, e);
            HttpResponse::NotFound().json(e.to_body())
        }
    }
}

/// PUT /api/notes/{id} — owner only; the body is merged into the note
async fn update_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
) -> impl Responder {
    let session = match require_session(&data, &req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let id = path.into_inner();

    let note = match find_for_mutation(&data.db, &id) {
        Ok(note) => note,
        Err(resp) => return resp,
    };

    if !note.is_owned_by(&session.user_id) {
        log::warn!(
            "[NOTES] {} tried to update note {} owned by {}",
            session.user_id,
            note.id,
            note.owner
        );
        return HttpResponse::Unauthorized().finish();
    }

    let patch = match parse_note_body(&body) {
        Ok(patch) => patch,
        Err(e) => {
            log::error!("[NOTES] Rejected update body for note {}: {}", note.id, e);
            return HttpResponse::BadRequest().json(e.to_body());
        }
    };
    apply_owner_mutation(&data, "update", note.id, move |db, id| {
        db.update_note(id, patch)
    })
}

/// DELETE /api/notes/{id} — owner only
async fn delete_note(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let session = match require_session(&data, &req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let id = path.into_inner();

    let note = match find_for_mutation(&data.db, &id) {
        Ok(note) => note,
        Err(resp) => return resp,
    };

    if !note.is_owned_by(&session.user_id) {
        log::warn!(
            "[NOTES] {} tried to delete note {} owned by {}",
            session.user_id,
            note.id,
            note.owner
        );
        return HttpResponse::Unauthorized().finish();
    }

    apply_owner_mutation(&data, "delete", note.id, |db, id| db.delete_note(id))
}

/// Decode a create or update body. An empty body is an empty document; any
/// other body must be a JSON object.
fn parse_note_body(bytes: &[u8]) -> Result<NoteFields, StoreError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(NoteFields::new());
    }
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::InvalidDocument(
            "note body must be a JSON object".to_string(),
        )),
    }
}

/// Fetch the target of an update or delete. Any fault, including an unknown
/// id, becomes a 400 with the fault as body.
fn find_for_mutation(db: &Database, id: &str) -> Result<Note, HttpResponse> {
    let fault = match db.find_note_by_id(id) {
        Ok(Some(note)) => return Ok(note),
        Ok(None) => StoreError::NotFound(id.to_string()),
        Err(e) => e,
    };
    log::error!("[NOTES] Failed to load note {}: {}", id, fault);
    Err(HttpResponse::BadRequest().json(fault.to_body()))
}

/// Run an owner's write according to the configured mutation mode.
///
/// In `Deferred` mode the 204 goes out without waiting for the write, and a
/// write that fails afterwards is only logged. In `Confirmed` mode the write
/// runs first and a failure (or a note that vanished meanwhile) is a 400.
fn apply_owner_mutation<F>(
    data: &web::Data<AppState>,
    action: &'static str,
    note_id: String,
    mutation: F,
) -> HttpResponse
where
    F: FnOnce(&Database, &str) -> Result<bool, StoreError> + 'static,
{
    match data.config.mutation_mode {
        MutationMode::Deferred => {
            let db = Arc::clone(&data.db);
            actix_web::rt::spawn(async move {
                match mutation(db.as_ref(), note_id.as_str()) {
                    Ok(true) => log::info!("[NOTES] Applied {} to note {}", action, note_id),
                    Ok(false) => {
                        log::warn!("[NOTES] Note {} was gone before {} applied", note_id, action)
                    }
                    Err(e) => {
                        log::error!("[NOTES] Deferred {} of note {} failed: {}", action, note_id, e)
                    }
                }
            });
            HttpResponse::NoContent().finish()
        }
        MutationMode::Confirmed => match mutation(data.db.as_ref(), note_id.as_str()) {
            Ok(true) => {
                log::info!("[NOTES] Applied {} to note {}", action, note_id);
                HttpResponse::NoContent().finish()
            }
            Ok(false) => {
                let e = StoreError::NotFound(note_id);
                log::error!("[NOTES] {} failed: {}", action, e);
                HttpResponse::BadRequest().json(e.to_body())
            }
            Err(e) => {
                log::error!("[NOTES] Failed to {} note {}: {}", action, note_id, e);
                HttpResponse::BadRequest().json(e.to_body())
            }
        },
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/notes")
            .route("", web::get().to(list_notes))
            .route("", web::post().to(create_note))
            // must precede /{id}
            .route("/mine", web::get().to(list_my_notes))
            .route("/{id}", web::get().to(show_note))
            .route("/{id}", web::put().to(update_note))
            .route("/{id}", web::delete().to(delete_note)),
    );
}
