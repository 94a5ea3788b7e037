//! Frame layout and drawing
//!
//! One fixed layout: session tabs in a left sidebar, the active surface in
//! the remaining area, a one-line status bar at the bottom. The surface area
//! derived here is also what gets negotiated with the remote PTY, so layout
//! math lives in one place.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use opdeck_protocol::WinSize;

use crate::mux::Multiplexer;
use crate::tabs::TabStrip;

pub const SIDEBAR_WIDTH: u16 = 26;

/// Cells available to a session surface for a given terminal size
///
/// The surface sits inside a bordered block next to the sidebar, above the
/// status bar.
pub fn surface_size(total: WinSize) -> WinSize {
    let cols = total.cols.saturating_sub(SIDEBAR_WIDTH).saturating_sub(2);
    let rows = total.rows.saturating_sub(1).saturating_sub(2);
    WinSize::new(cols, rows)
}

pub fn draw(frame: &mut Frame, mux: &Multiplexer, tabs: &TabStrip, status: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
        .split(chunks[0]);

    tabs.render(mux, panes[0], frame.buffer_mut());
    draw_surface(frame, mux, panes[1]);
    draw_status(frame, status, chunks[1]);
}

fn draw_surface(frame: &mut Frame, mux: &Multiplexer, area: Rect) {
    let title = mux
        .active_session()
        .map(|s| format!(" {} ", s.label()))
        .unwrap_or_else(|| " no session ".to_string());

    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(session) = mux.active_session() {
        session.surface().draw(inner, frame.buffer_mut());
    }
}

fn draw_status(frame: &mut Frame, status: &str, area: Rect) {
    let bar = Paragraph::new(Line::from(status.to_string()))
        .style(Style::default().fg(Color::Black).bg(Color::DarkGray));
    frame.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MessageSender;
    use crate::mux::SurfaceFactory;
    use crate::surface::testing::RecordingSurface;
    use ratatui::backend::TestBackend;
    use tokio::sync::mpsc;

    #[test]
    fn test_surface_size_subtracts_chrome() {
        assert_eq!(surface_size(WinSize::new(120, 40)), WinSize::new(92, 37));
    }

    #[test]
    fn test_surface_size_saturates_on_tiny_terminals() {
        let size = surface_size(WinSize::new(10, 2));
        assert!(size.is_zero());
    }

    #[tokio::test]
    async fn test_draw_smoke() {
        let (tx, _rx) = mpsc::channel(10);
        let factory: SurfaceFactory =
            Box::new(|area| Box::new(RecordingSurface::new(area)));
        let mut mux = Multiplexer::new(MessageSender::new(tx), factory);
        mux.resize(WinSize::new(92, 37));
        mux.open_session(None).unwrap();
        let tabs = TabStrip::new();

        let backend = TestBackend::new(120, 40);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw(frame, &mux, &tabs, "connected"))
            .unwrap();
    }

    #[tokio::test]
    async fn test_draw_without_sessions() {
        let (tx, _rx) = mpsc::channel(10);
        let factory: SurfaceFactory =
            Box::new(|area| Box::new(RecordingSurface::new(area)));
        let mux = Multiplexer::new(MessageSender::new(tx), factory);
        let tabs = TabStrip::new();

        let backend = TestBackend::new(80, 24);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw(frame, &mux, &tabs, "disconnected"))
            .unwrap();
    }
}
