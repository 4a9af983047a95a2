//! D-ID avatar platform client.
//!
//! The avatar itself streams browser-side with the client key; the backend
//! only proxies account-level reads (agent listing) and reports readiness.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::AvatarConfig;

pub struct AvatarClient {
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) agent_id: Option<String>,
    pub(crate) client_key: Option<String>,
    client: Client,
}

/// Outcome of an agent listing: the account's agents, or the vendor error
/// passed through with its original status.
#[derive(Debug)]
pub enum AgentsReply {
    Listed(Vec<Value>),
    Failed { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct AgentsBody {
    agents: Option<Vec<Value>>,
}

impl AvatarClient {
    pub fn new(config: &AvatarConfig) -> Self {
        Self::with_base_url(config, &config.base_url)
    }

    pub fn with_base_url(config: &AvatarConfig, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            agent_id: config.agent_id.clone(),
            client_key: config.client_key.clone(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Readiness document for the front end: key presence as a flag, ids
    /// verbatim so the browser can start a stream with them.
    pub fn readiness(&self) -> Value {
        let ready =
            self.api_key.is_some() && self.agent_id.is_some() && self.client_key.is_some();
        json!({
            "api_key": if self.api_key.is_some() { "configured" } else { "missing" },
            "agent_id": self.agent_id.as_deref().unwrap_or("not_configured"),
            "client_key": self.client_key.as_deref().unwrap_or("not_configured"),
            "base_url": self.base_url,
            "status": if ready { "ready" } else { "incomplete" },
        })
    }

    /// Lists the account's conversational agents.
    pub async fn list_agents(&self) -> anyhow::Result<AgentsReply> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("D-ID API key not configured"))?;

        let response = self
            .client
            .get(format!("{}/agents", self.base_url))
            .header(reqwest::header::AUTHORIZATION, format!("Basic {api_key}"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: AgentsBody = response.json().await?;
            Ok(AgentsReply::Listed(body.agents.unwrap_or_default()))
        } else {
            Ok(AgentsReply::Failed {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_client_reports_incomplete() {
        let client = AvatarClient::new(&AvatarConfig::default());
        assert!(!client.is_configured());
        let readiness = client.readiness();
        assert_eq!(readiness["api_key"], "missing");
        assert_eq!(readiness["agent_id"], "not_configured");
        assert_eq!(readiness["status"], "incomplete");
        assert_eq!(readiness["base_url"], "https://api.d-id.com");
    }

    #[test]
    fn full_config_reports_ready_with_verbatim_ids() {
        let config = AvatarConfig {
            api_key: Some("key".into()),
            agent_id: Some("agt_123".into()),
            client_key: Some("ck_456".into()),
            ..AvatarConfig::default()
        };
        let client = AvatarClient::new(&config);
        let readiness = client.readiness();
        assert_eq!(readiness["api_key"], "configured");
        assert_eq!(readiness["agent_id"], "agt_123");
        assert_eq!(readiness["client_key"], "ck_456");
        assert_eq!(readiness["status"], "ready");
    }

    #[tokio::test]
    async fn listing_fails_without_key() {
        let client = AvatarClient::new(&AvatarConfig::default());
        let err = client.list_agents().await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[test]
    fn agents_body_tolerates_missing_list() {
        let body: AgentsBody = serde_json::from_str("{}").unwrap();
        assert!(body.agents.is_none());
        let body: AgentsBody =
            serde_json::from_str(r#"{"agents": [{"id": "agt_1"}]}"#).unwrap();
        assert_eq!(body.agents.unwrap().len(), 1);
    }
}
