//! HTTP services the room client depends on.
//!
//! Two narrow contracts live here:
//! - `AddressResolver`: look up the socket address of an agent room.
//! - `AgentStore`: persist agent drafts and request generated descriptions.
//!
//! `ApiClient` implements both against the team-scoped REST endpoints; tests
//! substitute scripted fakes without network calls.

use crate::error::ApiError;
use crate::types::Agent;
use async_trait::async_trait;
use std::sync::Arc;

mod client;

pub use client::ApiClient;

/// Resolves the room address for an agent.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// An empty `agent_id` requests an ephemeral address for an unsaved draft.
    async fn resolve(&self, agent_id: &str) -> Result<String, ApiError>;
}

/// Persistence for agent records.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Create a record; the returned agent carries its assigned id.
    async fn create_agent(&self, agent: &Agent) -> Result<Agent, ApiError>;
    async fn update_agent(&self, agent_id: &str, agent: &Agent) -> Result<Agent, ApiError>;
    /// Ask the service to write a description from `prompt`.
    async fn generate_description(&self, prompt: &str) -> Result<String, ApiError>;
}

#[async_trait]
impl<T: AddressResolver + ?Sized> AddressResolver for Arc<T> {
    async fn resolve(&self, agent_id: &str) -> Result<String, ApiError> {
        (**self).resolve(agent_id).await
    }
}
