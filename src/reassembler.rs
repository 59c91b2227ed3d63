//! Turns streamed delta envelopes into a per-thread message list.
//!
//! Arrival order is taken as the true order of each thread's text; no
//! sequence numbers are consulted.

use crate::types::{ChatMessage, ChatWsAppendResponse};

/// Apply one delta to `messages`, returning the updated list.
///
/// The input slice is left untouched so readers of the previous list never
/// observe a half-applied update.
pub fn apply(messages: &[ChatMessage], delta: &ChatWsAppendResponse) -> Vec<ChatMessage> {
    let mut next = messages.to_vec();
    match next.iter_mut().find(|m| m.thread_id == delta.thread_id) {
        Some(existing) => existing.message.push_str(&delta.message),
        None => next.push(ChatMessage {
            thread_id: delta.thread_id.clone(),
            sender: delta.sender,
            message: delta.message.clone(),
        }),
    }
    next
}

/// Convenience for folding a whole delta sequence onto an initial list.
pub fn apply_all<'a, I>(messages: &[ChatMessage], deltas: I) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = &'a ChatWsAppendResponse>,
{
    deltas
        .into_iter()
        .fold(messages.to_vec(), |acc, delta| apply(&acc, delta))
}
