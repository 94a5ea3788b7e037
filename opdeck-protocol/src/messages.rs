//! Client-server message types
//!
//! The wire contract is intentionally small: three client-to-remote events
//! and two remote-to-client events, all addressed by `term_id`. Serde's
//! internal tagging gives each message the `event` field the remote process
//! manager dispatches on.

use serde::{Deserialize, Serialize};

use crate::types::TermId;

/// Messages sent from client to the remote process manager
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request remote process creation/attach, sized to the render surface
    StartTerminal {
        term_id: TermId,
        cols: u16,
        rows: u16,
    },

    /// Forward raw keystrokes or injected command text
    Input { term_id: TermId, input: String },

    /// Notify the remote of a surface size change
    Resize {
        term_id: TermId,
        cols: u16,
        rows: u16,
    },
}

impl ClientMessage {
    /// The session this message is addressed to
    pub fn term_id(&self) -> &TermId {
        match self {
            Self::StartTerminal { term_id, .. }
            | Self::Input { term_id, .. }
            | Self::Resize { term_id, .. } => term_id,
        }
    }
}

/// Messages sent from the remote process manager to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Raw bytes to render on the addressed session's surface
    Output { term_id: TermId, output: String },

    /// The remote process for this session exited
    DisconnectTerminal { term_id: TermId },
}

impl ServerMessage {
    /// The session this message addresses
    pub fn term_id(&self) -> &TermId {
        match self {
            Self::Output { term_id, .. } | Self::DisconnectTerminal { term_id } => term_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_terminal_wire_shape() {
        let msg = ClientMessage::StartTerminal {
            term_id: TermId::new("term_1"),
            cols: 120,
            rows: 40,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "start_terminal");
        assert_eq!(json["term_id"], "term_1");
        assert_eq!(json["cols"], 120);
        assert_eq!(json["rows"], 40);
    }

    #[test]
    fn test_input_wire_shape() {
        let msg = ClientMessage::Input {
            term_id: TermId::default_session(),
            input: "ls -la\n".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "input");
        assert_eq!(json["term_id"], "default");
        assert_eq!(json["input"], "ls -la\n");
    }

    #[test]
    fn test_resize_wire_shape() {
        let msg = ClientMessage::Resize {
            term_id: TermId::new("term_2"),
            cols: 80,
            rows: 24,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "resize");
    }

    #[test]
    fn test_output_parses_from_wire() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{"event": "output", "term_id": "term_1", "output": "hello\r\n"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Output {
                term_id: TermId::new("term_1"),
                output: "hello\r\n".into(),
            }
        );
    }

    #[test]
    fn test_disconnect_terminal_parses_from_wire() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"event": "disconnect_terminal", "term_id": "term_3"}"#)
                .unwrap();
        assert_eq!(
            msg,
            ServerMessage::DisconnectTerminal {
                term_id: TermId::new("term_3"),
            }
        );
    }

    #[test]
    fn test_unknown_event_fails_to_parse() {
        let result: Result<ServerMessage, _> =
            serde_json::from_str(r#"{"event": "reboot", "term_id": "term_1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_message_term_id_accessor() {
        let id = TermId::new("term_9");
        let messages = [
            ClientMessage::StartTerminal {
                term_id: id.clone(),
                cols: 80,
                rows: 24,
            },
            ClientMessage::Input {
                term_id: id.clone(),
                input: "x".into(),
            },
            ClientMessage::Resize {
                term_id: id.clone(),
                cols: 80,
                rows: 24,
            },
        ];
        for msg in &messages {
            assert_eq!(msg.term_id(), &id);
        }
    }

    #[test]
    fn test_server_message_term_id_accessor() {
        let id = TermId::new("term_4");
        let messages = [
            ServerMessage::Output {
                term_id: id.clone(),
                output: String::new(),
            },
            ServerMessage::DisconnectTerminal {
                term_id: id.clone(),
            },
        ];
        for msg in &messages {
            assert_eq!(msg.term_id(), &id);
        }
    }
}
