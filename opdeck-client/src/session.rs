//! Session entity and registry
//!
//! A session is the client-side state for one remote interactive process plus
//! its render surface. The registry owns the sessions in insertion order so
//! the tab strip stays stable.

use std::collections::HashMap;

use opdeck_protocol::{TermId, WinSize};
use opdeck_utils::{OpdeckError, Result};

use crate::surface::Surface;

/// Visually marked notice appended when the remote process exits
pub const EXIT_NOTICE: &str = "\r\n\x1b[31m[Process Exited]\x1b[0m\r\n";

/// Per-session lifecycle state
///
/// Close is not a state: a closed session is removed from the registry and
/// its surface dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created locally; remote process not yet confirmed
    Starting,
    /// Remote process has produced output
    Active,
    /// Remote process exited; output still renders, input is refused
    Exited,
}

/// One remote interactive process bound to a render surface
pub struct Session {
    id: TermId,
    label: String,
    surface: Box<dyn Surface>,
    size: WinSize,
    state: SessionState,
}

impl Session {
    pub fn new(id: TermId, label: String, surface: Box<dyn Surface>) -> Self {
        let size = surface.size();
        Self {
            id,
            label,
            surface,
            size,
            state: SessionState::Starting,
        }
    }

    pub fn id(&self) -> &TermId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn size(&self) -> WinSize {
        self.size
    }

    /// Whether keystrokes may still be forwarded to the remote process
    pub fn accepts_input(&self) -> bool {
        self.state != SessionState::Exited
    }

    /// Deliver remote output to the surface
    ///
    /// First output confirms the remote shell is up. Output after exit is
    /// still rendered so the process's last words are not lost.
    pub fn receive_output(&mut self, bytes: &[u8]) {
        if self.state == SessionState::Starting {
            self.state = SessionState::Active;
        }
        self.surface.write(bytes);
    }

    /// Write locally generated text, such as a system notice
    ///
    /// Unlike remote output this never changes the session state.
    pub fn write_local(&mut self, text: &str) {
        self.surface.write(text.as_bytes());
    }

    /// Transition to `Exited` and append the in-surface notice
    pub fn mark_exited(&mut self) {
        if self.state == SessionState::Exited {
            return;
        }
        self.state = SessionState::Exited;
        self.surface.write(EXIT_NOTICE.as_bytes());
    }

    /// Re-fit the surface and record the resulting size
    pub fn fit(&mut self, area: WinSize) -> WinSize {
        self.surface.fit(area);
        self.size = self.surface.size();
        self.size
    }

    pub fn focus(&mut self) {
        self.surface.focus();
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }
}

/// Insertion-ordered mapping from session id to session
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<TermId, Session>,
    order: Vec<TermId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new session, failing on a live-id collision
    pub fn insert(&mut self, session: Session) -> Result<&mut Session> {
        let id = session.id().clone();
        if self.sessions.contains_key(&id) {
            return Err(OpdeckError::DuplicateSession(id.to_string()));
        }
        self.order.push(id.clone());
        Ok(self.sessions.entry(id).or_insert(session))
    }

    pub fn get(&self, id: &TermId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &TermId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Remove a session, dropping its surface. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &TermId) -> Option<Session> {
        let session = self.sessions.remove(id);
        if session.is_some() {
            self.order.retain(|o| o != id);
        }
        session
    }

    pub fn contains(&self, id: &TermId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Sessions in insertion order, for stable tab ordering
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.order.iter().filter_map(|id| self.sessions.get(id))
    }

    /// Most recently created live session id
    pub fn last_id(&self) -> Option<&TermId> {
        self.order.last()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
