//! Terminal UI: event loop, rendering, raw-mode management

mod app;
mod event;
mod render;
mod terminal;

pub use app::App;
