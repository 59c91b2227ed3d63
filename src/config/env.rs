//! Environment overrides.
//!
//! `AGENTROOM_*` variables win over every file source.

use crate::error::ConfigError;

use super::Config;

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(url) = env_lookup("AGENTROOM_BASE_URL") {
        config.api.base_url = url;
    }
    if let Some(token) = env_lookup("AGENTROOM_TOKEN") {
        config.api.token = token;
    }
    if let Some(team) = env_lookup("AGENTROOM_TEAM_ID") {
        config.identity.team_id = team;
    }
    if let Some(user) = env_lookup("AGENTROOM_USER_ID") {
        config.identity.user_id = user;
    }
    if let Some(timeout) = env_lookup("AGENTROOM_API_TIMEOUT_SECS") {
        config.network.api_timeout_secs = parse_timeout("AGENTROOM_API_TIMEOUT_SECS", &timeout)?;
    }
    if let Some(timeout) = env_lookup("AGENTROOM_CONNECT_TIMEOUT_SECS") {
        config.network.connect_timeout_secs =
            parse_timeout("AGENTROOM_CONNECT_TIMEOUT_SECS", &timeout)?;
    }
    Ok(())
}

fn parse_timeout(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!(
            "invalid {name} value `{raw}`: expected positive integer seconds"
        ))
    })
}
