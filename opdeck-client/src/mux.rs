//! Session multiplexer
//!
//! Single authority for session lifecycle: it owns the registry, decides
//! which session is visible, routes incoming traffic by id, and emits the
//! start/input/resize events for every session over one shared connection.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinHandle;

use opdeck_protocol::{ClientMessage, ServerMessage, TermId, WinSize};
use opdeck_utils::Result;

use crate::connection::{MessageHandler, MessageSender};
use crate::session::{Session, SessionRegistry};
use crate::surface::Surface;

/// Delay between requesting a session and injecting its initial command,
/// giving the remote shell time to come up
const START_GRACE: Duration = Duration::from_millis(500);

/// Factory producing a render surface for a new session
pub type SurfaceFactory = Box<dyn Fn(WinSize) -> Box<dyn Surface>>;

pub struct Multiplexer {
    registry: SessionRegistry,
    /// The one visible session; visibility is derived from this, so two
    /// sessions can never both be visible
    active: Option<TermId>,
    /// Monotonic id counter; never reused, even after close
    counter: u64,
    /// Current visible area shared by all sessions
    area: WinSize,
    sender: MessageSender,
    make_surface: SurfaceFactory,
    /// Sessions whose start request waits for a non-zero area,
    /// with their initial command
    pending_start: HashMap<TermId, Option<String>>,
    /// Grace timers for initial command injection, aborted on close
    grace_timers: HashMap<TermId, JoinHandle<()>>,
}

impl Multiplexer {
    pub fn new(sender: MessageSender, make_surface: SurfaceFactory) -> Self {
        Self {
            registry: SessionRegistry::new(),
            active: None,
            counter: 0,
            area: WinSize::zero(),
            sender,
            make_surface,
            pending_start: HashMap::new(),
            grace_timers: HashMap::new(),
        }
    }

    /// Rebind the outgoing channel after a reconnect
    pub fn set_sender(&mut self, sender: MessageSender) {
        self.sender = sender;
    }

    pub fn active_id(&self) -> Option<&TermId> {
        self.active.as_ref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_ref().and_then(|id| self.registry.get(id))
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.registry.iter()
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    pub fn get(&self, id: &TermId) -> Option<&Session> {
        self.registry.get(id)
    }

    /// Open a session with an auto-generated id
    pub fn open_session(&mut self, command: Option<String>) -> Result<TermId> {
        self.counter += 1;
        let id = TermId::from_counter(self.counter);
        let label = Self::label_for(&id, command.as_deref(), self.counter);
        self.open_with(id.clone(), label, command)?;
        Ok(id)
    }

    /// Open a session under an explicit id; the counter is reserved for
    /// auto-generated ids
    pub fn open_named(&mut self, id: TermId, command: Option<String>) -> Result<()> {
        let label = Self::label_for(&id, command.as_deref(), 0);
        self.open_with(id, label, command)
    }

    fn open_with(&mut self, id: TermId, label: String, command: Option<String>) -> Result<()> {
        let surface = (self.make_surface)(self.area);
        let session = Session::new(id.clone(), label, surface);
        self.registry.insert(session)?;

        if self.area.is_zero() {
            // No real size yet; requesting a start now would pin the remote
            // PTY to a bogus size
            self.pending_start.insert(id.clone(), command);
        } else {
            self.request_start(&id, command);
        }

        self.activate(&id);
        Ok(())
    }

    /// Tab label: the control session and ssh targets get meaningful names,
    /// everything else falls back to a counter or the raw id
    fn label_for(id: &TermId, command: Option<&str>, counter: u64) -> String {
        if id.is_default() {
            return "Local / Control".to_string();
        }
        if let Some(cmd) = command {
            if cmd.trim_start().starts_with("ssh") {
                if let Some(target) = cmd.split_whitespace().last() {
                    return target.to_string();
                }
            }
        }
        if id.as_str() == TermId::from_counter(counter).as_str() {
            format!("Terminal {}", counter)
        } else {
            id.to_string()
        }
    }

    fn request_start(&mut self, id: &TermId, command: Option<String>) {
        self.sender.send_nowait(ClientMessage::StartTerminal {
            term_id: id.clone(),
            cols: self.area.cols,
            rows: self.area.rows,
        });

        if let Some(command) = command {
            let sender = self.sender.clone();
            let term_id = id.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(START_GRACE).await;
                let msg = ClientMessage::Input {
                    term_id,
                    input: format!("{}\n", command),
                };
                if let Err(e) = sender.send(msg).await {
                    tracing::debug!("initial command dropped: {}", e);
                }
            });
            self.grace_timers.insert(id.clone(), handle);
        }
    }

    /// Send any start requests that were waiting for a real area
    fn flush_pending_starts(&mut self) {
        if self.area.is_zero() {
            return;
        }
        let pending: Vec<_> = self.pending_start.drain().collect();
        for (id, command) in pending {
            let known = match self.registry.get_mut(&id) {
                Some(session) => {
                    session.fit(self.area);
                    true
                }
                None => false,
            };
            if known {
                self.request_start(&id, command);
            }
        }
    }

    /// Make a session visible. Unknown ids and the already-active id are
    /// no-ops.
    pub fn activate(&mut self, id: &TermId) -> bool {
        if self.active.as_ref() == Some(id) {
            return true;
        }
        if !self.registry.contains(id) {
            return false;
        }
        self.active = Some(id.clone());

        let area = self.area;
        let pending = self.pending_start.contains_key(id);
        if let Some(session) = self.registry.get_mut(id) {
            session.focus();
            if !area.is_zero() {
                let fitted = session.fit(area);
                // A session that has not started yet has no remote PTY to
                // resize
                if !pending {
                    self.sender.send_nowait(ClientMessage::Resize {
                        term_id: id.clone(),
                        cols: fitted.cols,
                        rows: fitted.rows,
                    });
                }
            }
        }
        self.flush_pending_starts();
        true
    }

    /// Cycle to the next session in tab order
    pub fn activate_next(&mut self) {
        if let Some(id) = self.neighbor(1) {
            self.activate(&id);
        }
    }

    /// Cycle to the previous session in tab order
    pub fn activate_prev(&mut self) {
        if let Some(id) = self.neighbor(-1) {
            self.activate(&id);
        }
    }

    fn neighbor(&self, step: isize) -> Option<TermId> {
        let ids: Vec<&TermId> = self.registry.iter().map(|s| s.id()).collect();
        if ids.is_empty() {
            return None;
        }
        let current = self
            .active
            .as_ref()
            .and_then(|a| ids.iter().position(|id| *id == a))
            .unwrap_or(0);
        let next = (current as isize + step).rem_euclid(ids.len() as isize) as usize;
        Some(ids[next].clone())
    }

    /// The visible area changed; re-fit the active session and tell the
    /// remote. Hidden sessions are fit lazily on activation.
    pub fn resize(&mut self, area: WinSize) {
        self.area = area;
        if area.is_zero() {
            return;
        }

        if let Some(id) = self.active.clone() {
            let pending = self.pending_start.contains_key(&id);
            if let Some(session) = self.registry.get_mut(&id) {
                let fitted = session.fit(area);
                if !pending {
                    self.sender.send_nowait(ClientMessage::Resize {
                        term_id: id,
                        cols: fitted.cols,
                        rows: fitted.rows,
                    });
                }
            }
        }
        self.flush_pending_starts();
    }

    /// Forward input to the active session
    ///
    /// Returns false when there is no active session or it has exited, so
    /// the caller can tell the operator instead of silently eating keys.
    pub fn forward_input(&mut self, input: &str) -> bool {
        let Some(id) = self.active.clone() else {
            return false;
        };
        let Some(session) = self.registry.get(&id) else {
            return false;
        };
        if !session.accepts_input() {
            return false;
        }
        // The remote must see start_terminal before any input for an id
        if self.pending_start.contains_key(&id) {
            return false;
        }
        self.sender.send_nowait(ClientMessage::Input {
            term_id: id,
            input: input.to_string(),
        });
        true
    }

    /// Close a session, dropping its surface
    ///
    /// Closing the visible session re-activates the most recently created
    /// remaining one. Unknown ids are a no-op.
    pub fn close_session(&mut self, id: &TermId) -> bool {
        if let Some(handle) = self.grace_timers.remove(id) {
            handle.abort();
        }
        self.pending_start.remove(id);

        if self.registry.remove(id).is_none() {
            return false;
        }

        if self.active.as_ref() == Some(id) {
            self.active = None;
            if let Some(last) = self.registry.last_id().cloned() {
                self.activate(&last);
            }
        }
        true
    }

    pub fn close_active(&mut self) -> bool {
        match self.active.clone() {
            Some(id) => self.close_session(&id),
            None => false,
        }
    }

    /// Write a local notice onto the active surface; nothing goes out on
    /// the wire
    pub fn notify_active(&mut self, text: &str) {
        if let Some(id) = self.active.clone() {
            if let Some(session) = self.registry.get_mut(&id) {
                session.write_local(text);
            }
        }
    }

    pub fn rename(&mut self, id: &TermId, label: impl Into<String>) -> bool {
        match self.registry.get_mut(id) {
            Some(session) => {
                session.set_label(label);
                true
            }
            None => false,
        }
    }
}

impl MessageHandler for Multiplexer {
    fn handle(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Output { term_id, output } => {
                match self.registry.get_mut(&term_id) {
                    Some(session) => session.receive_output(output.as_bytes()),
                    // Late output for a closed session; nothing to render it on
                    None => tracing::debug!(%term_id, "dropping output for unknown session"),
                }
            }
            ServerMessage::DisconnectTerminal { term_id } => {
                if let Some(handle) = self.grace_timers.remove(&term_id) {
                    handle.abort();
                }
                self.pending_start.remove(&term_id);
                match self.registry.get_mut(&term_id) {
                    Some(session) => {
                        tracing::info!(%term_id, "remote process exited");
                        session.mark_exited();
                    }
                    None => tracing::debug!(%term_id, "exit notice for unknown session"),
                }
            }
        }
    }

    fn on_connected(&mut self) {
        // First connect bootstraps the control session. On reconnect the
        // registry is non-empty and nothing is re-requested; stale sessions
        // stay visible until the operator closes them.
        if self.registry.is_empty() {
            if let Err(e) = self.open_named(TermId::default_session(), None) {
                tracing::error!("failed to open control session: {}", e);
            }
        }
    }

    fn on_disconnected(&mut self) {
        tracing::warn!("connection lost");
    }
}
