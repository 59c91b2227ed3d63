//! Wire codec for room control signals and inbound callback envelopes.
//!
//! Outbound frames are single JSON objects. Inbound transport messages may
//! carry several envelopes joined by newlines; each line is decoded on its own
//! so one corrupt line never hides the ones after it.

use crate::types::{Callback, ChatSendRequestPayload, TextSignal, TextTarget};
use serde::Serialize;
use std::fmt;

/// Caller identity stamped onto every outbound frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalContext {
    pub team_id: String,
    pub user_id: String,
}

/// Outbound control envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ControlFrame<'a, P: Serialize> {
    signal: TextSignal,
    target: TextTarget,
    broadcast: bool,
    context: Option<serde_json::Value>,
    #[serde(rename = "teamID")]
    team_id: &'a str,
    #[serde(rename = "userID")]
    user_id: &'a str,
    payloads: [P; 1],
}

/// Serializes as `{}`; STOP_RUN carries one empty payload.
#[derive(Debug, Serialize)]
struct EmptyPayload {}

fn encode<P: Serialize>(
    ctx: &SignalContext,
    signal: TextSignal,
    payload: P,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ControlFrame {
        signal,
        target: TextTarget::Action,
        broadcast: false,
        context: None,
        team_id: &ctx.team_id,
        user_id: &ctx.user_id,
        payloads: [payload],
    })
}

/// Encode a RUN signal for `payload`.
pub fn encode_run(
    ctx: &SignalContext,
    payload: &ChatSendRequestPayload,
) -> Result<String, serde_json::Error> {
    encode(ctx, TextSignal::Run, payload)
}

/// Encode a STOP_RUN signal.
pub fn encode_stop(ctx: &SignalContext) -> Result<String, serde_json::Error> {
    encode(ctx, TextSignal::StopRun, EmptyPayload {})
}

/// A line of an inbound message that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// Zero-based line number within the transport message.
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for MalformedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Decode one transport message into envelopes, preserving arrival order.
///
/// Blank lines (including the one after a trailing newline) are skipped.
pub fn decode(raw: &str) -> Vec<Result<Callback, MalformedLine>> {
    raw.split('\n')
        .enumerate()
        .filter_map(|(line, text)| {
            let text = text.strip_suffix('\r').unwrap_or(text);
            if text.trim().is_empty() {
                return None;
            }
            Some(
                serde_json::from_str::<Callback>(text).map_err(|e| MalformedLine {
                    line,
                    reason: e.to_string(),
                }),
            )
        })
        .collect()
}
