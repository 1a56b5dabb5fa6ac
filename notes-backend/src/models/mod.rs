mod note;
mod session;
mod user;

pub use note::{
    normalize_id, strip_reserved, Note, NoteFields, NoteListResponse, PopulatedNote,
    SingleNoteResponse,
};
pub use session::Session;
pub use user::{
    CredentialsRequest, LoginResponse, User, UserProfile, UserResponse, UserSummary,
};
