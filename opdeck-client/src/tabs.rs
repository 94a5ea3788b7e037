//! Tab strip over the session registry
//!
//! The strip is a projection: it never owns sessions, it renders whatever
//! the multiplexer currently holds, in registry order. Rename editing state
//! lives here because it is purely presentational until committed.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Widget};

use opdeck_protocol::TermId;

use crate::mux::Multiplexer;
use crate::session::SessionState;

/// One row of the tab strip
#[derive(Debug, Clone, PartialEq)]
pub struct TabEntry {
    pub id: TermId,
    pub label: String,
    pub state: SessionState,
    pub active: bool,
}

/// In-progress rename of one tab
#[derive(Debug, Clone)]
pub struct RenameEdit {
    pub id: TermId,
    pub buffer: String,
}

#[derive(Default)]
pub struct TabStrip {
    rename: Option<RenameEdit>,
}

impl TabStrip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project the registry into tab rows, registry order
    pub fn entries(mux: &Multiplexer) -> Vec<TabEntry> {
        let active = mux.active_id().cloned();
        mux.sessions()
            .map(|s| TabEntry {
                id: s.id().clone(),
                label: s.label().to_string(),
                state: s.state(),
                active: active.as_ref() == Some(s.id()),
            })
            .collect()
    }

    pub fn renaming(&self) -> Option<&RenameEdit> {
        self.rename.as_ref()
    }

    /// Start editing a tab label, seeded with its current text
    pub fn begin_rename(&mut self, id: TermId, current: &str) {
        self.rename = Some(RenameEdit {
            id,
            buffer: current.to_string(),
        });
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(edit) = self.rename.as_mut() {
            edit.buffer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(edit) = self.rename.as_mut() {
            edit.buffer.pop();
        }
    }

    pub fn cancel_rename(&mut self) {
        self.rename = None;
    }

    /// Finish the edit. An empty label is treated as a cancel.
    pub fn commit_rename(&mut self) -> Option<(TermId, String)> {
        let edit = self.rename.take()?;
        let label = edit.buffer.trim().to_string();
        if label.is_empty() {
            return None;
        }
        Some((edit.id, label))
    }

    /// Draw the strip as a bordered list
    pub fn render(&self, mux: &Multiplexer, area: Rect, buf: &mut Buffer) {
        let items: Vec<ListItem> = Self::entries(mux)
            .into_iter()
            .map(|entry| {
                let editing = self
                    .rename
                    .as_ref()
                    .filter(|edit| edit.id == entry.id);

                let marker = if entry.active { "▸ " } else { "  " };
                let (text, style) = match editing {
                    Some(edit) => (
                        format!("{}▏", edit.buffer),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                    None => (entry.label.clone(), Self::entry_style(&entry)),
                };

                ListItem::new(Line::from(vec![
                    Span::raw(marker.to_string()),
                    Span::styled(text, style),
                ]))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" sessions "),
        );
        Widget::render(list, area, buf);
    }

    fn entry_style(entry: &TabEntry) -> Style {
        let style = match entry.state {
            SessionState::Starting => Style::default().fg(Color::DarkGray),
            SessionState::Active => Style::default().fg(Color::Green),
            SessionState::Exited => Style::default().fg(Color::Red),
        };
        if entry.active {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MessageSender;
    use crate::mux::SurfaceFactory;
    use crate::surface::testing::RecordingSurface;
    use opdeck_protocol::WinSize;
    use tokio::sync::mpsc;

    fn make_mux() -> Multiplexer {
        let (tx, _rx) = mpsc::channel(100);
        let factory: SurfaceFactory =
            Box::new(|area| Box::new(RecordingSurface::new(area)));
        let mut mux = Multiplexer::new(MessageSender::new(tx), factory);
        mux.resize(WinSize::new(80, 24));
        mux
    }

    #[tokio::test]
    async fn test_entries_follow_registry_order() {
        let mut mux = make_mux();
        let a = mux.open_session(None).unwrap();
        let b = mux.open_session(None).unwrap();

        let entries = TabStrip::entries(&mux);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, a);
        assert_eq!(entries[1].id, b);
        assert!(!entries[0].active);
        assert!(entries[1].active);
    }

    #[tokio::test]
    async fn test_entries_reflect_exit_state() {
        let mut mux = make_mux();
        let id = mux.open_session(None).unwrap();
        use crate::connection::MessageHandler;
        mux.handle(opdeck_protocol::ServerMessage::DisconnectTerminal {
            term_id: id.clone(),
        });

        let entries = TabStrip::entries(&mux);
        assert_eq!(entries[0].state, SessionState::Exited);
    }

    #[test]
    fn test_rename_edit_flow() {
        let mut strip = TabStrip::new();
        strip.begin_rename(TermId::new("term_1"), "Terminal 1");
        assert_eq!(strip.renaming().unwrap().buffer, "Terminal 1");

        for _ in 0..10 {
            strip.backspace();
        }
        for c in "pivot box".chars() {
            strip.push_char(c);
        }

        let (id, label) = strip.commit_rename().unwrap();
        assert_eq!(id, TermId::new("term_1"));
        assert_eq!(label, "pivot box");
        assert!(strip.renaming().is_none());
    }

    #[test]
    fn test_commit_empty_label_is_cancel() {
        let mut strip = TabStrip::new();
        strip.begin_rename(TermId::new("term_1"), "  ");
        assert!(strip.commit_rename().is_none());
        assert!(strip.renaming().is_none());
    }

    #[test]
    fn test_cancel_rename_discards_edit() {
        let mut strip = TabStrip::new();
        strip.begin_rename(TermId::new("term_1"), "x");
        strip.push_char('y');
        strip.cancel_rename();
        assert!(strip.renaming().is_none());
        assert!(strip.commit_rename().is_none());
    }

    #[tokio::test]
    async fn test_render_smoke() {
        let mut mux = make_mux();
        mux.open_session(None).unwrap();

        let strip = TabStrip::new();
        let area = Rect::new(0, 0, 24, 10);
        let mut buf = Buffer::empty(area);
        strip.render(&mux, area, &mut buf);
    }
}
