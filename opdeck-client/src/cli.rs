//! Command-line argument parsing
//!
//! CLI flags override the config file; both fall back to built-in defaults.

use clap::Parser;

/// opdeck - multi-session operator console
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Connection address (tcp://host:port or unix://path)
    ///
    /// Example: tcp://127.0.0.1:7070 or unix:///tmp/opdeck.sock
    #[arg(long, env = "OPDECK_ADDR")]
    pub addr: Option<String>,

    /// Collaborator REST base URL
    #[arg(long, env = "OPDECK_API")]
    pub api: Option<String>,

    /// Workspace to file archived sessions and scans under
    #[arg(long, short = 'w')]
    pub workspace: Option<u64>,

    /// Command to run in the first extra session
    ///
    /// Example: opdeck ssh op@10.0.0.5
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The trailing command joined into one input line, if any
    pub fn command_string(&self) -> Option<String> {
        if self.command.is_empty() {
            None
        } else {
            Some(self.command.join(" "))
        }
    }
}
