//! Agent draft editing: form state, validation, and persistence.
//!
//! The editor owns the draft and a [`RoomMembershipTracker`]. Renaming or
//! re-iconing the agent updates the draft and is mirrored onto the agent's
//! room entry right away. The draft feeds [`AgentEditingSession::run_config`]
//! into the connection session when a run starts.

use crate::api::AgentStore;
use crate::error::{ConfigError, EditError, FieldError};
use crate::members::{MemberEdit, RoomMembershipTracker};
use crate::session::SessionState;
use crate::types::{Agent, AgentModel, AgentType, RunConfig, Variable};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::Path;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Read an agent draft from a TOML file using the record's field names.
pub fn load_agent_draft(path: &Path) -> Result<Agent, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let mut agent: Agent = toml::from_str(&text)?;
    if agent.variables.is_empty() {
        agent.variables.push(Variable::default());
    }
    Ok(agent)
}

/// Encode image bytes as a `data:` URL suitable for the agent icon.
pub fn icon_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Check every rule on `agent`, collecting all failures.
pub fn validate(agent: &Agent) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    for (field, value) in [
        ("name", &agent.name),
        ("description", &agent.description),
        ("prompt", &agent.prompt),
    ] {
        if value.trim().is_empty() {
            errors.push(FieldError {
                field,
                message: "required".into(),
            });
        }
    }

    let limit = agent.model.limit_tokens();
    if agent.model_config.max_tokens > limit {
        errors.push(FieldError {
            field: "modelConfig.maxTokens",
            message: format!("must be at most {limit} for {}", agent.model),
        });
    }
    let temperature = agent.model_config.temperature;
    if !(0.0..=1.0).contains(&temperature) {
        errors.push(FieldError {
            field: "modelConfig.temperature",
            message: format!("must be between 0 and 1, got {temperature}"),
        });
    }

    // A lone blank row means "no variables".
    let lone_blank = agent.variables.len() == 1 && agent.variables[0].is_blank();
    let all_filled = agent
        .variables
        .iter()
        .all(|v| !v.key.is_empty() && !v.value.is_empty());
    if !lone_blank && !all_filled {
        errors.push(FieldError {
            field: "variables",
            message: "every variable needs a key and a value".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Editable agent form bound to the room's participant list.
pub struct AgentEditingSession {
    draft: Agent,
    members: RoomMembershipTracker,
    saving: watch::Sender<bool>,
}

impl AgentEditingSession {
    pub fn new(mut draft: Agent) -> Self {
        if draft.variables.is_empty() {
            draft.variables.push(Variable::default());
        }
        let (saving, _) = watch::channel(false);
        Self {
            draft,
            members: RoomMembershipTracker::new(),
            saving,
        }
    }

    pub fn draft(&self) -> &Agent {
        &self.draft
    }

    /// Id of the persisted record; empty for a draft never saved.
    pub fn agent_id(&self) -> &str {
        &self.draft.ai_agent_id
    }

    pub fn members(&self) -> &RoomMembershipTracker {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut RoomMembershipTracker {
        &mut self.members
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
        self.members.mirror_edit(
            &self.draft.ai_agent_id,
            &MemberEdit::Nickname(self.draft.name.clone()),
        );
    }

    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.draft.icon = icon.into();
        self.members.mirror_edit(
            &self.draft.ai_agent_id,
            &MemberEdit::Avatar(self.draft.icon.clone()),
        );
    }

    /// Set the icon from raw image bytes.
    pub fn set_icon_bytes(&mut self, mime: &str, bytes: &[u8]) {
        self.set_icon(icon_data_url(mime, bytes));
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.draft.prompt = prompt.into();
    }

    pub fn set_agent_type(&mut self, agent_type: AgentType) {
        self.draft.agent_type = agent_type;
    }

    pub fn set_model(&mut self, model: AgentModel) {
        self.draft.model = model;
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) {
        self.draft.model_config.max_tokens = max_tokens;
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.draft.model_config.temperature = temperature;
    }

    pub fn variables(&self) -> &[Variable] {
        &self.draft.variables
    }

    pub fn add_variable(&mut self) {
        self.draft.variables.push(Variable::default());
    }

    /// Returns false when `index` is out of range.
    pub fn set_variable_key(&mut self, index: usize, key: impl Into<String>) -> bool {
        match self.draft.variables.get_mut(index) {
            Some(v) => {
                v.key = key.into();
                true
            }
            None => false,
        }
    }

    /// Returns false when `index` is out of range.
    pub fn set_variable_value(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.draft.variables.get_mut(index) {
            Some(v) => {
                v.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Remove a row. The editor always keeps at least one (blank) row.
    pub fn remove_variable(&mut self, index: usize) -> bool {
        if index >= self.draft.variables.len() {
            return false;
        }
        self.draft.variables.remove(index);
        if self.draft.variables.is_empty() {
            self.draft.variables.push(Variable::default());
        }
        true
    }

    pub fn validate(&self) -> Result<(), EditError> {
        validate(&self.draft).map_err(EditError::Invalid)
    }

    /// Inputs for a RUN built from the current draft.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            prompt: self.draft.prompt.clone(),
            variables: self.draft.variables.clone(),
            model_config: self.draft.model_config.clone(),
        }
    }

    /// True while a save is in flight or the room is still connecting.
    pub fn is_busy(&self, session: SessionState) -> bool {
        *self.saving.borrow() || session == SessionState::Connecting
    }

    /// Watch the saving flag.
    pub fn saving(&self) -> watch::Receiver<bool> {
        self.saving.subscribe()
    }

    /// Validate and persist the draft. A first save adopts the assigned id.
    pub async fn save<S: AgentStore + ?Sized>(&mut self, store: &S) -> Result<&Agent, EditError> {
        self.validate()?;
        let flag = SavingFlag::raise(&self.saving);
        let result = if self.draft.ai_agent_id.is_empty() {
            store.create_agent(&self.draft).await
        } else {
            store
                .update_agent(&self.draft.ai_agent_id, &self.draft)
                .await
        };
        drop(flag);

        let saved = result.map_err(|e| {
            warn!("saving agent failed: {e}");
            EditError::Persist(e)
        })?;
        if self.draft.ai_agent_id.is_empty() {
            info!(agent_id = %saved.ai_agent_id, "agent created");
        } else {
            debug!(agent_id = %saved.ai_agent_id, "agent updated");
        }
        self.draft.ai_agent_id = saved.ai_agent_id;
        Ok(&self.draft)
    }

    /// Replace the description with one generated from its current text.
    ///
    /// On failure the previous description is kept.
    pub async fn generate_description<S: AgentStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<&str, EditError> {
        let generated = store
            .generate_description(&self.draft.description)
            .await
            .map_err(|e| {
                warn!("description generation failed: {e}");
                EditError::Persist(e)
            })?;
        self.draft.description = generated;
        Ok(&self.draft.description)
    }
}

/// Holds the saving flag up until dropped, including when the save future is.
struct SavingFlag<'a>(&'a watch::Sender<bool>);

impl<'a> SavingFlag<'a> {
    fn raise(flag: &'a watch::Sender<bool>) -> Self {
        flag.send_replace(true);
        Self(flag)
    }
}

impl Drop for SavingFlag<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}
