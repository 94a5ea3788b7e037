//! REST collaborator client
//!
//! Small side-channel next to the event connection: archiving a session's
//! captured output as a workspace note, toggling helper tools (WebDAV, HTTP
//! server, VPN) and saving scan results. All failures map to
//! [`OpdeckError::Collaborator`] so the UI can show them without caring
//! which endpoint broke.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use opdeck_protocol::{ArchiveReceipt, TermId, ToolStatus};
use opdeck_utils::{OpdeckError, Result};

/// Helper tool managed by the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Webdav,
    Http,
    Vpn,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Webdav => "webdav",
            Tool::Http => "http",
            Tool::Vpn => "vpn",
        }
    }
}

#[derive(Deserialize)]
struct ToggleResponse {
    details: ToolStatus,
}

#[derive(Deserialize)]
struct VpnConfigs {
    configs: Vec<String>,
}

#[derive(Deserialize)]
struct SaveResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct ApiClient {
    http: Client,
    base: Url,
    /// Identifies this client run to the collaborator, so archived output
    /// is attributed to the right connection
    connection_id: Uuid,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| OpdeckError::collaborator(format!("invalid API base URL: {}", e)))?;
        Ok(Self {
            http: Client::new(),
            base,
            connection_id: Uuid::new_v4(),
        })
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| OpdeckError::collaborator(format!("bad endpoint {}: {}", path, e)))
    }

    /// Archive a session's captured output as a note in the workspace
    pub async fn archive_session(
        &self,
        term_id: &TermId,
        workspace_id: u64,
    ) -> Result<ArchiveReceipt> {
        let url = self.endpoint(&format!("api/terminals/{}/archive", term_id))?;
        let body = json!({
            "socket_id": self.connection_id.to_string(),
            "workspace_id": workspace_id,
        });

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("archive request failed: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("bad archive response: {}", e)))
    }

    /// Current status of a helper tool
    pub async fn tool_status(&self, tool: Tool) -> Result<ToolStatus> {
        let url = self.endpoint(&format!("api/tools/{}/status", tool.as_str()))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("status request failed: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("bad status response: {}", e)))
    }

    /// Toggle a helper tool on or off, optionally pinning its port
    pub async fn toggle_tool(&self, tool: Tool, port: Option<u16>) -> Result<ToolStatus> {
        let url = self.endpoint(&format!("api/tools/{}/toggle", tool.as_str()))?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "port": port }))
            .send()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("toggle request failed: {}", e)))?;

        let toggled: ToggleResponse = response
            .json()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("bad toggle response: {}", e)))?;
        Ok(toggled.details)
    }

    /// VPN configs available on the collaborator
    pub async fn vpn_configs(&self) -> Result<Vec<String>> {
        let url = self.endpoint("api/tools/vpn/list")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("vpn list request failed: {}", e)))?;

        let listed: VpnConfigs = response
            .json()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("bad vpn list response: {}", e)))?;
        Ok(listed.configs)
    }

    /// Save a session's teed scan output as a workspace note
    pub async fn save_scan(&self, term_id: &TermId, workspace_id: u64) -> Result<()> {
        let url = self.endpoint("api/tools/nmap/save")?;
        let body = json!({
            "workspace_id": workspace_id,
            "term_id": term_id,
        });

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("scan save failed: {}", e)))?;

        let saved: SaveResponse = response
            .json()
            .await
            .map_err(|e| OpdeckError::collaborator(format!("bad scan save response: {}", e)))?;

        if saved.status.as_deref() == Some("saved") {
            Ok(())
        } else {
            Err(OpdeckError::collaborator(
                saved.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base() {
        let api = ApiClient::new("http://127.0.0.1:5000/").unwrap();
        let url = api
            .endpoint(&format!("api/terminals/{}/archive", TermId::new("term_3")))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5000/api/terminals/term_3/archive"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn test_connection_ids_are_unique_per_client() {
        let a = ApiClient::new("http://127.0.0.1:5000/").unwrap();
        let b = ApiClient::new("http://127.0.0.1:5000/").unwrap();
        assert_ne!(a.connection_id(), b.connection_id());
    }

    #[test]
    fn test_tool_path_names() {
        assert_eq!(Tool::Webdav.as_str(), "webdav");
        assert_eq!(Tool::Http.as_str(), "http");
        assert_eq!(Tool::Vpn.as_str(), "vpn");
    }

    #[test]
    fn test_toggle_response_parses_nested_details() {
        let response: ToggleResponse = serde_json::from_str(
            r#"{"details": {"running": true, "port": 8080, "path": "/srv/share"}}"#,
        )
        .unwrap();
        assert!(response.details.running);
        assert_eq!(response.details.port, Some(8080));
    }

    #[test]
    fn test_save_response_variants() {
        let ok: SaveResponse = serde_json::from_str(r#"{"status": "saved"}"#).unwrap();
        assert_eq!(ok.status.as_deref(), Some("saved"));

        let err: SaveResponse =
            serde_json::from_str(r#"{"error": "no scan output found"}"#).unwrap();
        assert_eq!(err.error.as_deref(), Some("no scan output found"));
    }
}
