//! Input event pump
//!
//! Crossterm's blocking poll runs on a plain thread and feeds an unbounded
//! channel, so the async app loop can select over input and connection
//! traffic uniformly. Poll timeouts become ticks, which drive reconnects
//! and status message expiry.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

/// Events driving the app loop
#[derive(Debug)]
pub enum AppEvent {
    /// Key press
    Key(KeyEvent),
    /// Bracketed paste
    Paste(String),
    /// Terminal window resized
    Resize { cols: u16, rows: u16 },
    /// Poll timeout elapsed
    Tick,
}

pub struct EventHandler {
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx, tick_rate }
    }

    /// Start the polling thread
    pub fn start(&self) {
        let tx = self.tx.clone();
        let tick_rate = self.tick_rate;

        std::thread::spawn(move || loop {
            if event::poll(tick_rate).unwrap_or(false) {
                let app_event = match event::read() {
                    Ok(CrosstermEvent::Key(key)) => {
                        // Release/repeat events show up on some platforms
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        AppEvent::Key(key)
                    }
                    Ok(CrosstermEvent::Paste(text)) => AppEvent::Paste(text),
                    Ok(CrosstermEvent::Resize(cols, rows)) => AppEvent::Resize { cols, rows },
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::error!("error reading terminal event: {}", e);
                        break;
                    }
                };
                if tx.send(app_event).is_err() {
                    break;
                }
            } else if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        });
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    #[cfg(test)]
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    #[cfg(test)]
    pub fn try_next(&mut self) -> Option<AppEvent> {
        self.rx.try_recv().ok()
    }
}
