//! Render surfaces for terminal sessions
//!
//! A [`Surface`] is the output sink bound one-to-one to a session: it accepts
//! raw bytes for display, reports its size in character cells, and can be
//! re-fit when the visible area changes. Disposal is `Drop`; the registry
//! dropping a session is the single disposal point.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;
use tui_term::widget::PseudoTerminal;
use vt100::Parser;

use opdeck_protocol::WinSize;

/// Capability interface every render backend satisfies
///
/// Any concrete backend works: the vt100-backed [`VtSurface`] for the TUI, or
/// a headless buffer for tests.
pub trait Surface {
    /// Accept raw output bytes for display
    fn write(&mut self, bytes: &[u8]);

    /// Re-fit the surface to the given area
    fn fit(&mut self, area: WinSize);

    /// Request keyboard focus
    fn focus(&mut self);

    /// Last-known size in character cells
    fn size(&self) -> WinSize;

    /// Draw the surface content into a render buffer
    fn draw(&self, area: Rect, buf: &mut Buffer) {
        let _ = (area, buf);
    }
}

/// Scrollback lines retained by the VT parser
const SCROLLBACK_LINES: usize = 1000;

/// VT100-backed surface rendered with tui-term
pub struct VtSurface {
    parser: Parser,
    /// Tracked separately from the parser: stays zero until the first
    /// real layout, which defers remote size negotiation
    area: WinSize,
    focused: bool,
}

impl VtSurface {
    pub fn new(area: WinSize) -> Self {
        // The parser itself cannot be zero-sized
        let rows = area.rows.max(1);
        let cols = area.cols.max(1);
        Self {
            parser: Parser::new(rows, cols, SCROLLBACK_LINES),
            area,
            focused: false,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

impl Surface for VtSurface {
    fn write(&mut self, bytes: &[u8]) {
        self.parser.process(bytes);
    }

    fn fit(&mut self, area: WinSize) {
        self.area = area;
        if !area.is_zero() {
            self.parser.set_size(area.rows, area.cols);
        }
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn size(&self) -> WinSize {
        self.area
    }

    fn draw(&self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let fg = if self.is_focused() {
            Color::White
        } else {
            Color::Gray
        };
        let term = PseudoTerminal::new(self.parser.screen())
            .style(Style::default().fg(fg).bg(Color::Black));
        term.render(area, buf);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Recorded {
        written: Vec<Vec<u8>>,
        fits: Vec<WinSize>,
        focus_count: usize,
        area: WinSize,
    }

    /// Headless surface that records every interaction
    ///
    /// Clones share the record, so a test can keep a handle to a surface
    /// that has been boxed into a session.
    #[derive(Clone, Default)]
    pub struct RecordingSurface {
        inner: Rc<RefCell<Recorded>>,
    }

    impl RecordingSurface {
        pub fn new(area: WinSize) -> Self {
            let surface = Self::default();
            surface.inner.borrow_mut().area = area;
            surface
        }

        pub fn written_text(&self) -> String {
            self.inner
                .borrow()
                .written
                .iter()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .collect()
        }

        pub fn fits(&self) -> Vec<WinSize> {
            self.inner.borrow().fits.clone()
        }

        pub fn focus_count(&self) -> usize {
            self.inner.borrow().focus_count
        }
    }

    impl Surface for RecordingSurface {
        fn write(&mut self, bytes: &[u8]) {
            self.inner.borrow_mut().written.push(bytes.to_vec());
        }

        fn fit(&mut self, area: WinSize) {
            let mut inner = self.inner.borrow_mut();
            inner.area = area;
            inner.fits.push(area);
        }

        fn focus(&mut self) {
            self.inner.borrow_mut().focus_count += 1;
        }

        fn size(&self) -> WinSize {
            self.inner.borrow().area
        }
    }
}
