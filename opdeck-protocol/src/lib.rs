//! opdeck-protocol: Shared wire definitions for client-server communication
//!
//! This crate defines the message types and framing used between the opdeck
//! client and the remote process manager. Each message travels as one
//! newline-framed JSON object whose `event` field names the message.

pub mod codec;
pub mod messages;
pub mod types;

// Re-export main types at crate root
pub use codec::{ClientCodec, CodecError, ServerCodec};
pub use messages::{ClientMessage, ServerMessage};
pub use types::{ArchiveReceipt, TermId, ToolStatus, WinSize};

/// Current protocol version
pub const PROTOCOL_VERSION: u32 = 1;
