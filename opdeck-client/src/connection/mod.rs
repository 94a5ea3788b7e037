//! Event connection to the remote process manager

mod client;
mod handler;

pub use client::{Connection, ConnectionState, Incoming};
pub use handler::{MessageHandler, MessageSender};
