//! REST client for room-address lookup and agent persistence.
//!
//! Requests are team-scoped: every path is rooted at `/teams/{team_id}`.
//! No retries are attempted here; failures go straight back to the caller.

mod transport;

use super::{AddressResolver, AgentStore};
use crate::config::{ApiConfig, IdentityConfig};
use crate::error::ApiError;
use crate::types::Agent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionAddressResponse {
    ai_agent_connection_address: String,
}

#[derive(Debug, Serialize)]
struct GenerateDescriptionRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateDescriptionResponse {
    payload: String,
}

/// Client for the agent REST endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    team_id: String,
}

impl ApiClient {
    /// Build a client from resolved API and identity configuration.
    pub fn new(api: &ApiConfig, identity: &IdentityConfig, timeout: Duration) -> Self {
        Self {
            http: transport::build_http_client(timeout),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            token: api.token.trim().to_string(),
            team_id: identity.team_id.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/teams/{}/aiAgent{path}", self.base_url, self.team_id)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        // Anonymous deployments run without a token.
        if self.token.is_empty() {
            req
        } else {
            req.header("Authorization", &self.token)
        }
    }

    /// Room address for an unsaved draft.
    pub async fn anonymous_address(&self) -> Result<String, ApiError> {
        let req = self.authorize(self.http.get(self.url("/anonymous/wsAddress")));
        let body: ConnectionAddressResponse = transport::send_json(req).await?;
        Ok(body.ai_agent_connection_address)
    }

    /// Room address bound to a persisted agent.
    pub async fn agent_address(&self, agent_id: &str) -> Result<String, ApiError> {
        let req = self.authorize(self.http.get(self.url(&format!("/{agent_id}/wsAddress"))));
        let body: ConnectionAddressResponse = transport::send_json(req).await?;
        Ok(body.ai_agent_connection_address)
    }
}

#[async_trait]
impl AddressResolver for ApiClient {
    async fn resolve(&self, agent_id: &str) -> Result<String, ApiError> {
        let address = if agent_id.is_empty() {
            self.anonymous_address().await?
        } else {
            self.agent_address(agent_id).await?
        };
        if address.trim().is_empty() {
            return Err(ApiError::Decode("empty aiAgentConnectionAddress".to_string()));
        }
        debug!(agent_id, address = %address, "resolved room address");
        Ok(address)
    }
}

#[async_trait]
impl AgentStore for ApiClient {
    async fn create_agent(&self, agent: &Agent) -> Result<Agent, ApiError> {
        let req = self.authorize(self.http.post(self.url("")).json(agent));
        transport::send_json(req).await
    }

    async fn update_agent(&self, agent_id: &str, agent: &Agent) -> Result<Agent, ApiError> {
        let req = self.authorize(self.http.put(self.url(&format!("/{agent_id}"))).json(agent));
        transport::send_json(req).await
    }

    async fn generate_description(&self, prompt: &str) -> Result<String, ApiError> {
        let req = self.authorize(
            self.http
                .post(self.url("/generateDescription"))
                .json(&GenerateDescriptionRequest { prompt }),
        );
        let body: GenerateDescriptionResponse = transport::send_json(req).await?;
        Ok(body.payload)
    }
}
