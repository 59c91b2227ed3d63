//! Default configuration constants.

/// Default REST API root.
pub(super) const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
/// Default timeout for REST requests.
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
/// Default timeout for dialing a room socket.
pub(super) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// File name looked up in the working directory and the global config dir.
pub(super) const CONFIG_FILE_NAME: &str = "agentroom.toml";
/// Subdirectory of the config root holding the global config file.
pub(super) const CONFIG_DIR_NAME: &str = "agentroom";
