//! Unified error types for the room client.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from the HTTP service layer (address lookup and agent persistence).
#[derive(Debug)]
pub enum ApiError {
    /// Network / reqwest-level error.
    Http(reqwest::Error),
    /// Non-2xx status from the service.
    Status { code: u16, body: String },
    /// 2xx response whose body did not have the expected shape.
    Decode(String),
}

impl ApiError {
    /// HTTP status code, when the failure came from a non-2xx response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status { code, body } => write!(f, "status {code}: {body}"),
            Self::Decode(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Errors from the room transport.
#[derive(Debug)]
pub enum TransportError {
    /// Dialing the room address failed or timed out.
    Connect(String),
    /// The room is not currently held by this transport.
    NotJoined(String),
    /// The room is already held; it must be left before joining again.
    AlreadyJoined(String),
    /// Writing a frame to the socket failed.
    Send(String),
    /// The socket was closed by the peer.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(msg) => write!(f, "connect: {msg}"),
            Self::NotJoined(room) => write!(f, "room {room} is not joined"),
            Self::AlreadyJoined(room) => write!(f, "room {room} is already joined"),
            Self::Send(msg) => write!(f, "send: {msg}"),
            Self::Closed => write!(f, "connection closed"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Errors surfaced by `ConnectionSession` commands.
#[derive(Debug)]
pub enum SessionError {
    /// Resolving the room address failed.
    Resolve(ApiError),
    Transport(TransportError),
    Encode(serde_json::Error),
    /// A start or reconnect is already in flight.
    Busy,
    /// The command is not valid in the current state.
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    /// A response is still streaming; wait for it to end or cancel it.
    AwaitingResponse,
    /// There is no in-flight response to cancel.
    NotReceiving,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(e) => write!(f, "resolve address: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Encode(e) => write!(f, "encode frame: {e}"),
            Self::Busy => write!(f, "a connection attempt is already in progress"),
            Self::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while {state}")
            }
            Self::AwaitingResponse => write!(f, "still receiving the previous response"),
            Self::NotReceiving => write!(f, "no response in progress"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e)
    }
}

// ---------------------------------------------------------------------------
// EditError
// ---------------------------------------------------------------------------

/// One failed validation rule on an agent draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors from saving or enriching an agent draft.
#[derive(Debug)]
pub enum EditError {
    Invalid(Vec<FieldError>),
    Persist(ApiError),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(errors) => {
                let joined = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "invalid agent: {joined}")
            }
            Self::Persist(e) => write!(f, "save error: {e}"),
        }
    }
}

impl std::error::Error for EditError {}

impl From<ApiError> for EditError {
    fn from(e: ApiError) -> Self {
        Self::Persist(e)
    }
}
