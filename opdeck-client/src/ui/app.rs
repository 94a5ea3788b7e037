//! Application event loop
//!
//! Keys pass straight through to the active session unless the prefix key
//! (Ctrl-b) arms command mode for one keystroke, tmux style. Connection
//! traffic and terminal input are multiplexed in one select loop; ticks
//! drive reconnect attempts and status message expiry.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use opdeck_protocol::{ServerMessage, WinSize};
use opdeck_utils::Result;

use crate::api::{ApiClient, Tool};
use crate::config::Config;
use crate::connection::{Connection, ConnectionState, Incoming, MessageHandler};
use crate::input::encode_key;
use crate::mux::{Multiplexer, SurfaceFactory};
use crate::snippets::{
    self, ligolo_agent, ligolo_proxy, netcat_listener, quick_ssh, system_notice, vpn_connect,
    NoticeColor, RevShell,
};
use crate::surface::VtSurface;
use crate::tabs::TabStrip;

use super::event::{AppEvent, EventHandler};
use super::render;
use super::terminal::Terminal;

const TICK_RATE: Duration = Duration::from_millis(250);
/// Ticks between reconnect attempts while offline
const RECONNECT_TICKS: u32 = 8;
const STATUS_TTL: Duration = Duration::from_secs(4);
const LISTENER_PORT: u16 = 4444;
const REVSHELL_PORT: u16 = 4444;
const LIGOLO_SERVER: &str = "127.0.0.1:11601";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Keys go to the active session
    Passthrough,
    /// Prefix armed; next key is a command
    Prefix,
    /// Editing a tab label
    Renaming,
}

struct StatusMessage {
    text: String,
    expires: Instant,
}

enum Step {
    Event(Option<AppEvent>),
    Server(Option<ServerMessage>),
}

pub struct App {
    config: Config,
    initial_command: Option<String>,
    terminal: Terminal,
    events: EventHandler,
    connection: Connection,
    api: ApiClient,
    mux: Multiplexer,
    tabs: TabStrip,
    mode: Mode,
    revshell: RevShell,
    status: Option<StatusMessage>,
    connected: bool,
    offline_ticks: u32,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, initial_command: Option<String>) -> Result<Self> {
        let terminal = Terminal::new()?;
        let events = EventHandler::new(TICK_RATE);
        let connection = Connection::new(config.server.addr.clone());
        let api = ApiClient::new(&config.server.api)?;

        let factory: SurfaceFactory = Box::new(|area| Box::new(VtSurface::new(area)));
        let mux = Multiplexer::new(connection.sender(), factory);

        Ok(Self {
            config,
            initial_command,
            terminal,
            events,
            connection,
            api,
            mux,
            tabs: TabStrip::new(),
            mode: Mode::Passthrough,
            revshell: RevShell::Bash,
            status: None,
            connected: false,
            offline_ticks: 0,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.events.start();

        let size = self.terminal.size()?;
        self.mux.resize(render::surface_size(size));

        self.try_connect().await;

        if let Some(command) = self.initial_command.take() {
            if let Err(e) = self.mux.open_session(Some(command)) {
                tracing::error!("failed to open initial session: {}", e);
            }
        }

        while !self.should_quit {
            self.draw()?;

            let step = tokio::select! {
                event = self.events.next() => Step::Event(event),
                msg = self.connection.recv(), if self.connected => Step::Server(msg),
            };

            match step {
                Step::Event(Some(event)) => self.handle_event(event).await,
                Step::Event(None) => break,
                Step::Server(Some(msg)) => self.mux.handle(msg),
                Step::Server(None) => {
                    // Reset the connection so the next connect() is not a no-op
                    self.connection.disconnect().await;
                    self.connected = false;
                    self.offline_ticks = 0;
                    self.mux.on_disconnected();
                    self.set_status("connection lost, retrying");
                }
            }

            // Drain whatever queued up while handling the step, so an
            // output burst renders in one frame
            if self.connected {
                while let Incoming::Message(msg) = self.connection.try_next() {
                    self.mux.handle(msg);
                }
            }
        }

        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let status = self.status_text();
        let Self {
            terminal, mux, tabs, ..
        } = self;
        terminal
            .terminal_mut()
            .draw(|frame| render::draw(frame, mux, tabs, &status))?;
        Ok(())
    }

    fn status_text(&self) -> String {
        let link = match self.connection.state() {
            ConnectionState::Connected => "online",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Disconnected => "offline",
        };
        let mode = match self.mode {
            Mode::Passthrough => "",
            Mode::Prefix => " [prefix]",
            Mode::Renaming => " [rename]",
        };
        let sessions = self.mux.session_count();
        match &self.status {
            Some(msg) => format!(" {} | {} sessions{} | {}", link, sessions, mode, msg.text),
            None => format!(" {} | {} sessions{}", link, sessions, mode),
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            expires: Instant::now() + STATUS_TTL,
        });
    }

    async fn try_connect(&mut self) {
        match self.connection.connect().await {
            Ok(()) => {
                self.connected = true;
                self.offline_ticks = 0;
                // connect() rebuilt the channels
                self.mux.set_sender(self.connection.sender());
                self.mux.on_connected();
                self.set_status(format!("connected to {}", self.connection.addr()));
            }
            Err(e) => {
                self.connected = false;
                tracing::warn!("connect failed: {}", e);
                self.set_status(format!("connect failed: {}", e));
            }
        }
    }

    async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key).await,
            AppEvent::Paste(text) => self.handle_paste(text),
            AppEvent::Resize { cols, rows } => {
                self.mux
                    .resize(render::surface_size(WinSize::new(cols, rows)));
            }
            AppEvent::Tick => self.handle_tick().await,
        }
    }

    async fn handle_tick(&mut self) {
        if let Some(msg) = &self.status {
            if Instant::now() >= msg.expires {
                self.status = None;
            }
        }
        if !self.connected {
            self.offline_ticks += 1;
            if self.offline_ticks >= RECONNECT_TICKS {
                self.offline_ticks = 0;
                self.try_connect().await;
            }
        }
    }

    fn handle_paste(&mut self, text: String) {
        match self.mode {
            Mode::Passthrough => {
                if !self.mux.forward_input(&text) {
                    self.set_status("session is not accepting input");
                }
            }
            Mode::Renaming => {
                for c in text.chars() {
                    self.tabs.push_char(c);
                }
            }
            Mode::Prefix => {}
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            Mode::Passthrough => {
                if is_prefix_key(&key) {
                    self.mode = Mode::Prefix;
                } else if let Some(seq) = encode_key(&key) {
                    if !self.mux.forward_input(&seq) {
                        self.set_status("session is not accepting input");
                    }
                }
            }
            Mode::Prefix => self.handle_prefix_key(key).await,
            Mode::Renaming => self.handle_rename_key(key),
        }
    }

    async fn handle_prefix_key(&mut self, key: KeyEvent) {
        self.mode = Mode::Passthrough;

        if is_prefix_key(&key) {
            // Double prefix sends a literal Ctrl-b
            self.mux.forward_input("\x02");
            return;
        }

        match key.code {
            KeyCode::Char('c') => {
                if let Err(e) = self.mux.open_session(None) {
                    self.set_status(format!("open failed: {}", e));
                }
            }
            KeyCode::Char('n') => self.mux.activate_next(),
            KeyCode::Char('p') => self.mux.activate_prev(),
            KeyCode::Char('x') => {
                if !self.mux.close_active() {
                    self.set_status("no session to close");
                }
            }
            KeyCode::Char('r') => {
                if let Some(session) = self.mux.active_session() {
                    self.tabs
                        .begin_rename(session.id().clone(), session.label());
                    self.mode = Mode::Renaming;
                } else {
                    self.set_status("no session to rename");
                }
            }
            KeyCode::Char('a') => self.archive_active().await,
            KeyCode::Char('s') => self.save_scan_active().await,
            KeyCode::Char('m') => self.run_scan(),
            KeyCode::Char('l') => self.inject(
                Some((
                    NoticeColor::Yellow,
                    format!("Starting netcat listener on {}...", LISTENER_PORT),
                )),
                netcat_listener(LISTENER_PORT),
            ),
            KeyCode::Char('b') => {
                let payload = self.revshell.payload(&self.config.vars.lhost, REVSHELL_PORT);
                self.inject(None, format!("{}\n", payload));
            }
            KeyCode::Char('B') => {
                self.revshell = next_flavor(self.revshell);
                self.set_status(format!("reverse shell flavor: {}", self.revshell.name()));
            }
            KeyCode::Char('S') => {
                let target = self.config.vars.rhost.clone();
                if let Err(e) = self.mux.open_session(Some(quick_ssh(&target))) {
                    self.set_status(format!("open failed: {}", e));
                }
            }
            KeyCode::Char('v') => self.connect_vpn().await,
            KeyCode::Char('g') => self.inject(
                Some((NoticeColor::Cyan, "Starting ligolo proxy...".to_string())),
                ligolo_proxy(),
            ),
            KeyCode::Char('G') => self.inject(
                Some((
                    NoticeColor::Cyan,
                    format!("Connecting ligolo agent to {}...", LIGOLO_SERVER),
                )),
                ligolo_agent(LIGOLO_SERVER),
            ),
            KeyCode::Char('w') => self.toggle_tool(Tool::Webdav).await,
            KeyCode::Char('h') => self.toggle_tool(Tool::Http).await,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(c) => {
                if let Some(index) = snippet_index(c) {
                    self.inject_snippet(index);
                }
            }
            _ => {}
        }
    }

    fn handle_rename_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some((id, label)) = self.tabs.commit_rename() {
                    self.mux.rename(&id, label);
                }
                self.mode = Mode::Passthrough;
            }
            KeyCode::Esc => {
                self.tabs.cancel_rename();
                self.mode = Mode::Passthrough;
            }
            KeyCode::Backspace => self.tabs.backspace(),
            KeyCode::Char(c) => self.tabs.push_char(c),
            _ => {}
        }
    }

    /// Write an optional notice to the active surface, then inject the
    /// input line
    fn inject(&mut self, notice: Option<(NoticeColor, String)>, input: String) {
        if self.mux.active_id().is_none() {
            self.set_status("no active session");
            return;
        }
        if let Some((color, text)) = notice {
            let rendered = system_notice(color, &text);
            self.mux.notify_active(&rendered);
        }
        if !self.mux.forward_input(&input) {
            self.set_status("session is not accepting input");
        }
    }

    fn inject_snippet(&mut self, index: usize) {
        let Some(snippet) = self.config.snippets.get(index).cloned() else {
            self.set_status("no such snippet");
            return;
        };
        let command = self.config.vars.expand(&snippet.command);
        self.inject(None, format!("{}\n", command));
    }

    fn run_scan(&mut self) {
        let Some(id) = self.mux.active_id().cloned() else {
            self.set_status("no active session");
            return;
        };
        let expanded = self.config.vars.expand(&self.config.nmap_command);
        let input = snippets::nmap_command(&self.config.nmap_command, &self.config.vars, &id);
        self.inject(
            Some((NoticeColor::Green, format!("Running: {}", expanded))),
            input,
        );
    }

    async fn archive_active(&mut self) {
        let Some(id) = self.mux.active_id().cloned() else {
            self.set_status("no active session");
            return;
        };
        let Some(workspace) = self.config.workspace else {
            self.set_status("no workspace configured");
            return;
        };
        match self.api.archive_session(&id, workspace).await {
            Ok(receipt) if receipt.is_archived() => {
                self.set_status(format!("archived {}", id));
            }
            Ok(opdeck_protocol::ArchiveReceipt::Failed { error }) => {
                self.set_status(format!("archive failed: {}", error));
            }
            Ok(_) => self.set_status("archive failed"),
            Err(e) => self.set_status(format!("archive failed: {}", e)),
        }
    }

    async fn save_scan_active(&mut self) {
        let Some(id) = self.mux.active_id().cloned() else {
            self.set_status("no active session");
            return;
        };
        let Some(workspace) = self.config.workspace else {
            self.set_status("no workspace configured");
            return;
        };
        match self.api.save_scan(&id, workspace).await {
            Ok(()) => self.set_status("scan saved as note"),
            Err(e) => self.set_status(format!("scan save failed: {}", e)),
        }
    }

    async fn connect_vpn(&mut self) {
        // A VPN already managed by the collaborator takes precedence over a
        // second in-session openvpn
        if let Ok(status) = self.api.tool_status(Tool::Vpn).await {
            if status.running {
                self.set_status("vpn already running");
                return;
            }
        }
        match self.api.vpn_configs().await {
            Ok(configs) => match configs.into_iter().next() {
                Some(config) => self.inject(
                    Some((
                        NoticeColor::Yellow,
                        format!("Starting VPN ({})...", config),
                    )),
                    vpn_connect(&config),
                ),
                None => self.set_status("no VPN configs available"),
            },
            Err(e) => self.set_status(format!("vpn list failed: {}", e)),
        }
    }

    async fn toggle_tool(&mut self, tool: Tool) {
        match self.api.toggle_tool(tool, None).await {
            Ok(status) => {
                let state = if status.running {
                    match status.port {
                        Some(port) => format!("running on {}", port),
                        None => "running".to_string(),
                    }
                } else {
                    "stopped".to_string()
                };
                self.set_status(format!("{}: {}", tool.as_str(), state));
            }
            Err(e) => self.set_status(format!("{} toggle failed: {}", tool.as_str(), e)),
        }
    }
}

fn is_prefix_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('b') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Map prefix-mode digits to snippet slots, 1-based on screen
fn snippet_index(c: char) -> Option<usize> {
    match c {
        '1'..='9' => Some(c as usize - '1' as usize),
        _ => None,
    }
}

fn next_flavor(current: RevShell) -> RevShell {
    let pos = RevShell::ALL
        .iter()
        .position(|f| *f == current)
        .unwrap_or(0);
    RevShell::ALL[(pos + 1) % RevShell::ALL.len()]
}
