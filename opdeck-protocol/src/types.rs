//! Shared data types for the opdeck wire protocol and collaborators

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque terminal session identifier
///
/// Locally generated ids follow the `term_<counter>` convention; the initial
/// bootstrap session uses the well-known `"default"` id. Ids are unique for
/// the lifetime of the client and auto-generated ids are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(String);

impl TermId {
    /// Well-known id of the initial local/control session
    pub const DEFAULT: &'static str = "default";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the id for the nth locally allocated session
    pub fn from_counter(counter: u64) -> Self {
        Self(format!("term_{}", counter))
    }

    /// The well-known bootstrap session id
    pub fn default_session() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TermId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TermId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Terminal dimensions in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinSize {
    pub cols: u16,
    pub rows: u16,
}

impl WinSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// The size of a surface that has not been laid out yet
    pub fn zero() -> Self {
        Self { cols: 0, rows: 0 }
    }

    /// A zero-area size cannot be negotiated with the remote side
    pub fn is_zero(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

impl Default for WinSize {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

/// Status report for a collaborator-managed tool (VPN, WebDAV, HTTP server)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Result of archiving a session's captured output as a workspace note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArchiveReceipt {
    /// The collaborator stored the note
    Archived { status: String, id: u64 },
    /// The collaborator rejected the request
    Failed { error: String },
}

impl ArchiveReceipt {
    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Archived { status, .. } if status == "archived")
    }
}
