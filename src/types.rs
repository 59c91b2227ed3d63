//! Data model shared by the room protocol, the session, and the agent editor.
//!
//! Field names follow the server's camelCase JSON contract. Enumerations are
//! integer-encoded on the wire, so each one carries explicit `u8`/`u32`
//! conversions instead of serde's default string tags.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Senders and roles
// ---------------------------------------------------------------------------

/// Who authored a chat message, or which role a room participant holds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum SenderType {
    /// Human collaborator typing into the chat.
    User,
    /// A persisted agent with an assigned id.
    #[default]
    Agent,
    /// An agent draft that has not been saved yet.
    AnonymousAgent,
}

impl From<SenderType> for u8 {
    fn from(value: SenderType) -> Self {
        match value {
            SenderType::User => 1,
            SenderType::Agent => 2,
            SenderType::AnonymousAgent => 3,
        }
    }
}

impl TryFrom<u8> for SenderType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::User),
            2 => Ok(Self::Agent),
            3 => Ok(Self::AnonymousAgent),
            other => Err(format!("unknown sender type {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Control-signal enumerations
// ---------------------------------------------------------------------------

/// Signal carried by an outbound room frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "u32", into = "u32")]
pub enum TextSignal {
    Enter,
    Leave,
    Run,
    StopRun,
    /// Signals this client never emits but may observe.
    Other(u32),
}

impl From<TextSignal> for u32 {
    fn from(value: TextSignal) -> Self {
        match value {
            TextSignal::Enter => 1,
            TextSignal::Leave => 2,
            TextSignal::Run => 13,
            TextSignal::StopRun => 14,
            TextSignal::Other(n) => n,
        }
    }
}

impl From<u32> for TextSignal {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Enter,
            2 => Self::Leave,
            13 => Self::Run,
            14 => Self::StopRun,
            n => Self::Other(n),
        }
    }
}

/// Subsystem a room frame is addressed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "u32", into = "u32")]
pub enum TextTarget {
    Nothing,
    Action,
    Other(u32),
}

impl From<TextTarget> for u32 {
    fn from(value: TextTarget) -> Self {
        match value {
            TextTarget::Nothing => 0,
            TextTarget::Action => 8,
            TextTarget::Other(n) => n,
        }
    }
}

impl From<u32> for TextTarget {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Nothing,
            8 => Self::Action,
            n => Self::Other(n),
        }
    }
}

// ---------------------------------------------------------------------------
// Chat messages
// ---------------------------------------------------------------------------

/// One entry of the rendered conversation.
///
/// `message` only ever grows while its thread is streaming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    #[serde(rename = "threadID")]
    pub thread_id: String,
    pub sender: SenderType,
    pub message: String,
}

impl ChatMessage {
    /// Build a message authored by the local user.
    pub fn user(thread_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            sender: SenderType::User,
            message: message.into(),
        }
    }
}

/// One `{key, value}` prompt variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variable {
    pub key: String,
    pub value: String,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True for the placeholder row the editor keeps when no variables exist.
    pub fn is_blank(&self) -> bool {
        self.key.is_empty() && self.value.is_empty()
    }
}

/// Sampling parameters forwarded with every RUN signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            stream: true,
            temperature: 1.0,
            max_tokens: 4096,
        }
    }
}

/// Payload of a RUN control signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendRequestPayload {
    #[serde(rename = "threadID")]
    pub thread_id: String,
    pub prompt: String,
    pub variables: Vec<Variable>,
    pub model_config: ModelConfig,
}

/// Inputs a caller supplies to start a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunConfig {
    pub prompt: String,
    pub variables: Vec<Variable>,
    pub model_config: ModelConfig,
}

impl RunConfig {
    /// Bind these inputs to a thread id, producing the wire payload.
    pub fn payload(&self, thread_id: impl Into<String>) -> ChatSendRequestPayload {
        ChatSendRequestPayload {
            thread_id: thread_id.into(),
            prompt: self.prompt.clone(),
            variables: self.variables.clone(),
            model_config: self.model_config.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound envelopes
// ---------------------------------------------------------------------------

/// Data section of an inbound ACTION envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatWsAppendResponse {
    #[serde(rename = "threadID", default)]
    pub thread_id: String,
    #[serde(default)]
    pub sender: SenderType,
    #[serde(default)]
    pub message: String,
}

/// One inbound frame, as delivered by the room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Callback {
    pub target: TextTarget,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub data: Option<ChatWsAppendResponse>,
}

/// Meaning of an envelope's `errorCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalCode {
    /// Normal text delta.
    Delta,
    /// The server holds a lock on this connection; the socket must be redialed.
    Locked,
    /// The agent finished streaming the current response.
    StreamEnded,
    Unknown(i64),
}

impl SignalCode {
    pub const LOCKED: i64 = 14;
    pub const STREAM_ENDED: i64 = 15;
}

impl From<i64> for SignalCode {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Delta,
            Self::LOCKED => Self::Locked,
            Self::STREAM_ENDED => Self::StreamEnded,
            other => Self::Unknown(other),
        }
    }
}

impl Callback {
    pub fn signal_code(&self) -> SignalCode {
        SignalCode::from(self.error_code)
    }
}

// ---------------------------------------------------------------------------
// Room participants
// ---------------------------------------------------------------------------

/// One participant currently visible in the room.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollaboratorsInfo {
    #[serde(default)]
    pub id: String,
    pub role: SenderType,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub avatar: String,
}

// ---------------------------------------------------------------------------
// Agent records
// ---------------------------------------------------------------------------

/// Interaction style of an agent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum AgentType {
    #[default]
    Chat,
    TextGeneration,
}

impl From<AgentType> for u8 {
    fn from(value: AgentType) -> Self {
        match value {
            AgentType::Chat => 1,
            AgentType::TextGeneration => 2,
        }
    }
}

impl TryFrom<u8> for AgentType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Chat),
            2 => Ok(Self::TextGeneration),
            other => Err(format!("unknown agent type {other}")),
        }
    }
}

/// Backing model of an agent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum AgentModel {
    #[default]
    Gpt35Turbo,
    Gpt35Turbo16k,
    Gpt4,
}

impl AgentModel {
    /// Upper bound accepted for `modelConfig.maxTokens`.
    pub fn limit_tokens(self) -> u32 {
        match self {
            Self::Gpt35Turbo => 4096,
            Self::Gpt35Turbo16k => 16384,
            Self::Gpt4 => 8192,
        }
    }
}

impl fmt::Display for AgentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Gpt35Turbo => "GPT-3.5",
            Self::Gpt35Turbo16k => "GPT-3.5-16k",
            Self::Gpt4 => "GPT-4",
        };
        f.write_str(label)
    }
}

impl From<AgentModel> for u8 {
    fn from(value: AgentModel) -> Self {
        match value {
            AgentModel::Gpt35Turbo => 1,
            AgentModel::Gpt35Turbo16k => 2,
            AgentModel::Gpt4 => 3,
        }
    }
}

impl TryFrom<u8> for AgentModel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Gpt35Turbo),
            2 => Ok(Self::Gpt35Turbo16k),
            3 => Ok(Self::Gpt4),
            other => Err(format!("unknown agent model {other}")),
        }
    }
}

/// Agent record as stored by the persistence service.
///
/// An empty `ai_agent_id` marks a draft that has never been saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Agent {
    #[serde(rename = "aiAgentID")]
    pub ai_agent_id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub agent_type: AgentType,
    pub model: AgentModel,
    pub prompt: String,
    pub variables: Vec<Variable>,
    pub model_config: ModelConfig,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            ai_agent_id: String::new(),
            name: String::new(),
            icon: String::new(),
            description: String::new(),
            agent_type: AgentType::Chat,
            model: AgentModel::Gpt35Turbo,
            prompt: String::new(),
            variables: vec![Variable::default()],
            model_config: ModelConfig::default(),
        }
    }
}
