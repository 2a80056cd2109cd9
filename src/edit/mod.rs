//! Edit forms: validation, dirty tracking and the commit gate.

pub mod dependency;
pub mod rules;
pub mod session;

pub use dependency::{apply_dependency_edit, DependencyAction, DependencyEdit};
pub use rules::{MilestoneDraft, TaskDraft};
pub use session::{
    EditSession, ListenerId, SessionCommand, SessionEvent, SessionId, SessionState, Validate,
};
