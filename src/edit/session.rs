//! Validation and dirty-state tracking for edit forms.
//!
//! An `EditSession` wraps the draft of one editable entity and gates saving:
//! a commit is only possible when the draft has unsaved changes and passes
//! its rule set.
//!
//! ```text
//!                 on_field_changed
//! Clean+Invalid ───────────────────► Dirty+Invalid ◄──┐
//!      │                                │   ▲         │ on_field_changed
//!      │ (edit form, rules pass)        ▼   │         │
//! Clean+Valid ◄──── commit ──────── Dirty+Valid ──────┘
//!      ▲                                │
//!      └──────────── discard ───────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A rule set for an editable entity.
///
/// Returns one message per broken rule, in a stable order. An empty vector
/// means the value is valid.
pub trait Validate {
    fn validate(&self) -> Vec<String>;
}

/// Unique identifier for an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by [`EditSession::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

/// The four combinations of validity and dirtiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    CleanInvalid,
    CleanValid,
    DirtyInvalid,
    DirtyValid,
}

impl SessionState {
    fn of(valid: bool, dirty: bool) -> Self {
        match (dirty, valid) {
            (false, false) => SessionState::CleanInvalid,
            (false, true) => SessionState::CleanValid,
            (true, false) => SessionState::DirtyInvalid,
            (true, true) => SessionState::DirtyValid,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::CleanInvalid => write!(f, "clean/invalid"),
            SessionState::CleanValid => write!(f, "clean/valid"),
            SessionState::DirtyInvalid => write!(f, "dirty/invalid"),
            SessionState::DirtyValid => write!(f, "dirty/valid"),
        }
    }
}

/// What happened to a session, delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Changed(SessionState),
    Committed,
    Discarded,
    CommitFailed(String),
}

type Listener = Box<dyn FnMut(&SessionEvent)>;

/// Draft, committed value, and the validity/dirty flags of one open form.
pub struct EditSession<T> {
    id: SessionId,
    draft: T,
    committed: T,
    valid: bool,
    /// Validity of the committed value, restored by `discard`.
    committed_valid: bool,
    dirty: bool,
    error_message: Option<String>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: usize,
    closed: bool,
}

impl<T: Validate + Clone> EditSession<T> {
    /// Open a form for a new entity.
    ///
    /// The session starts Clean+Invalid without running the rules, so an
    /// empty form shows no errors until the user touches it.
    pub fn for_new(draft: T) -> Self {
        Self::open(draft, false, None)
    }

    /// Open a form on an existing entity. The rules run immediately.
    pub fn for_edit(value: T) -> Self {
        let errors = value.validate();
        let valid = errors.is_empty();
        Self::open(value, valid, join_errors(&errors))
    }

    fn open(draft: T, valid: bool, error_message: Option<String>) -> Self {
        let session = Self {
            id: SessionId::new(),
            committed: draft.clone(),
            draft,
            valid,
            committed_valid: valid,
            dirty: false,
            error_message,
            listeners: Vec::new(),
            next_listener: 0,
            closed: false,
        };
        debug!(session = %session.id.short(), state = %session.state(), "edit session opened");
        session
    }

    /// Apply a field change to the draft, mark the session dirty and run the
    /// rules again.
    pub fn on_field_changed<F>(&mut self, change: F)
    where
        F: FnOnce(&mut T),
    {
        change(&mut self.draft);
        self.dirty = true;
        self.revalidate();
        self.notify(&SessionEvent::Changed(self.state()));
    }

    fn revalidate(&mut self) {
        let errors = self.draft.validate();
        self.valid = errors.is_empty();
        self.error_message = join_errors(&errors);
    }

    pub fn can_commit(&self) -> bool {
        self.valid && self.dirty
    }

    /// Accept the draft as the new committed value.
    ///
    /// # Errors
    /// Returns `Validation` when the session is not Dirty+Valid. The session
    /// is left unchanged.
    pub fn commit(&mut self) -> Result<T> {
        self.commit_with(|draft| Ok(draft.clone()))
    }

    /// Commit, running `apply` on the draft first.
    ///
    /// `apply` is where the draft reaches the outside world (a graph update,
    /// a store write). If it fails the error message replaces the session's
    /// error, the session becomes invalid, and dirtiness is kept so the user
    /// can fix the draft and retry.
    ///
    /// # Errors
    /// Returns `Validation` when the session is not Dirty+Valid, or whatever
    /// `apply` returned.
    pub fn commit_with<R, F>(&mut self, apply: F) -> Result<R>
    where
        F: FnOnce(&T) -> Result<R>,
    {
        if !self.can_commit() {
            let reason = if !self.dirty {
                "No changes to save".to_string()
            } else {
                self.error_message
                    .clone()
                    .unwrap_or_else(|| "Draft is not valid".to_string())
            };
            return Err(Error::Validation(reason));
        }

        match apply(&self.draft) {
            Ok(output) => {
                self.committed = self.draft.clone();
                self.committed_valid = true;
                self.dirty = false;
                self.error_message = None;
                info!(session = %self.id.short(), "edit session committed");
                self.notify(&SessionEvent::Committed);
                Ok(output)
            }
            Err(err) => {
                let message = err.to_string();
                warn!(session = %self.id.short(), error = %message, "commit rejected");
                self.valid = false;
                self.error_message = Some(message.clone());
                self.notify(&SessionEvent::CommitFailed(message));
                Err(err)
            }
        }
    }

    /// Throw the draft away and go back to the committed value and the
    /// validity it had when it was opened or last committed.
    pub fn discard(&mut self) {
        self.draft = self.committed.clone();
        self.dirty = false;
        self.valid = self.committed_valid;
        self.error_message = None;
        debug!(session = %self.id.short(), state = %self.state(), "edit session discarded");
        self.notify(&SessionEvent::Discarded);
    }
}

impl<T> EditSession<T> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn draft(&self) -> &T {
        &self.draft
    }

    /// The value the session was opened with, or the last committed draft.
    pub fn committed(&self) -> &T {
        &self.committed
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// All broken rules joined with newlines, or the last commit failure.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn state(&self) -> SessionState {
        SessionState::of(self.valid, self.dirty)
    }

    /// Register a callback for session events.
    ///
    /// Subscribing to a closed session is ignored.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        if !self.closed {
            self.listeners.push((id, Box::new(listener)));
        }
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Detach every listener. The form is going away.
    pub fn close(&mut self) {
        self.listeners.clear();
        self.closed = true;
        debug!(session = %self.id.short(), "edit session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn notify(&mut self, event: &SessionEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for EditSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("id", &self.id)
            .field("draft", &self.draft)
            .field("valid", &self.valid)
            .field("dirty", &self.dirty)
            .field("error_message", &self.error_message)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Join rule violations into one message, `None` when there are none.
pub fn join_errors(errors: &[String]) -> Option<String> {
    if errors.is_empty() {
        None
    } else {
        Some(errors.join("\n"))
    }
}

/// The save/cancel buttons of an edit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionCommand {
    Save,
    Cancel,
}

impl SessionCommand {
    /// Save is enabled only for Dirty+Valid sessions. Cancel is always
    /// enabled.
    pub fn can_execute<T: Validate + Clone>(&self, session: &EditSession<T>) -> bool {
        match self {
            SessionCommand::Save => session.can_commit(),
            SessionCommand::Cancel => true,
        }
    }

    /// Run the command. Save returns the committed value.
    ///
    /// # Errors
    /// Save fails the same way as [`EditSession::commit`].
    pub fn execute<T: Validate + Clone>(&self, session: &mut EditSession<T>) -> Result<Option<T>> {
        match self {
            SessionCommand::Save => session.commit().map(Some),
            SessionCommand::Cancel => {
                session.discard();
                Ok(None)
            }
        }
    }
}
