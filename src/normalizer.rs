//! Role tagging for message history.
//!
//! The history endpoint does not report roles reliably, so roles are assigned
//! by position: even indices are user turns, odd indices are assistant turns.
//! This is a heuristic. Any history that does not strictly alternate
//! (two user turns in a row, a leading system message, a dropped reply) is
//! silently mislabelled from that point on. Nothing better is available in
//! the data, so the rule must stay exactly as is.

use serde_json::Value;

use crate::models::{Message, RawMessage, Role};

/// Tags `raw` by position parity. Output length always equals input length.
pub fn normalize_messages(raw: Vec<RawMessage>) -> Vec<Message> {
    raw.into_iter()
        .enumerate()
        .map(|(index, record)| record.into_message(role_for_index(index)))
        .collect()
}

/// Same as [`normalize_messages`] on an untyped payload; non-arrays yield `[]`.
pub fn normalize_json(value: &Value) -> Vec<Message> {
    normalize_messages(RawMessage::list_from_json(value))
}

fn role_for_index(index: usize) -> Role {
    if index % 2 == 0 {
        Role::User
    } else {
        Role::Assistant
    }
}
