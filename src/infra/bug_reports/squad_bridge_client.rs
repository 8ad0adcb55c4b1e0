use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::bug_reports::{CollaboratorError, PlayerMessenger, SessionContext, SessionProvider};

/// HTTP client for the bridge that sits next to the game server and proxies
/// the RCON commands we need (current map lookup and player warnings).
#[derive(Clone)]
pub struct SquadBridgeClient {
    client: Client,
    base_url: String,
}

impl SquadBridgeClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, CollaboratorError> {
        let mut headers = HeaderMap::new();
        headers.insert("User-Agent", HeaderValue::from_static("SquadBugRelay/0.1"));
        if let Some(token) = token {
            headers.insert(
                "Authorization",
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| CollaboratorError::Request(e.to_string()))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Shape of `GET /current-map`. Older bridges report the map as `map`,
/// newer ones as `level`.
#[derive(Debug, Deserialize)]
struct ApiMapInfo {
    level: Option<String>,
    map: Option<String>,
    layer: Option<String>,
}

impl ApiMapInfo {
    fn into_session(self) -> Option<SessionContext> {
        if self.level.is_none() && self.map.is_none() && self.layer.is_none() {
            return None;
        }
        let map_name = self
            .level
            .filter(|l| !l.trim().is_empty())
            .or(self.map);
        Some(SessionContext::from_parts(map_name, self.layer))
    }
}

#[derive(Debug, Serialize)]
struct ApiWarnRequest<'a> {
    target: &'a str,
    message: &'a str,
}

#[async_trait]
impl SessionProvider for SquadBridgeClient {
    async fn current_session(&self) -> Result<Option<SessionContext>, CollaboratorError> {
        let url = format!("{}/current-map", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(CollaboratorError::Request(format!(
                "current-map returned {}",
                resp.status()
            )));
        }

        // The bridge answers `null` between rounds
        let info: Option<ApiMapInfo> = resp
            .json()
            .await
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;

        Ok(info.and_then(ApiMapInfo::into_session))
    }
}

#[async_trait]
impl PlayerMessenger for SquadBridgeClient {
    async fn warn(&self, target: &str, message: &str) -> Result<(), CollaboratorError> {
        let url = format!("{}/warn", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&ApiWarnRequest { target, message })
            .send()
            .await
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CollaboratorError::Request(format!(
                "warn returned {} - {}",
                status, text
            )));
        }

        Ok(())
    }
}
