use chrono::Utc;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A named conversation thread owned by the remote service.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default, alias = "created_at")]
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" | "ai" | "bot" | "model" => Ok(Role::Assistant),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Role::try_from(s.as_str())
    }
}

/// A role-tagged message in the thread, either persisted or pending.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    #[serde(default, alias = "created_at")]
    pub created_at: String,
}

impl Message {
    /// Client-side placeholder shown while a send is in flight.
    pub fn pending(temp_id: String, content: String) -> Self {
        Self {
            id: temp_id,
            content,
            role: Role::User,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// A message record exactly as the server returned it.
///
/// Every input element yields exactly one record: a missing or mistyped field
/// falls back to an empty value instead of failing.
/// The server's `role` is kept for inspection but not trusted; see
/// [`crate::normalizer`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMessage {
    pub id: String,
    pub content: String,
    pub role: Option<String>,
    pub created_at: Option<String>,
}

impl RawMessage {
    pub fn from_json(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id: value.get("id").map(id_from_json).unwrap_or_default(),
            content: text("content").unwrap_or_default(),
            role: text("role"),
            created_at: text("createdAt").or_else(|| text("created_at")),
        }
    }

    /// Non-array input yields no records.
    pub fn list_from_json(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().map(Self::from_json).collect())
            .unwrap_or_default()
    }

    pub fn into_message(self, role: Role) -> Message {
        Message {
            id: self.id,
            content: self.content,
            role,
            created_at: self.created_at.unwrap_or_default(),
        }
    }
}

impl<'de> Deserialize<'de> for RawMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

/// Response of the send-message call: the persisted user turn and the reply.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentExchange {
    #[serde(alias = "user_message")]
    pub user_message: RawMessage,
    #[serde(alias = "ai_message")]
    pub ai_message: RawMessage,
}

/// Request body for creating a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
}

/// Request body for the chat API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message: String,
    pub session_id: String,
}

fn id_from_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_labels_accept_assistant_aliases() {
        for label in ["assistant", "AI", "Bot", "model", " MODEL "] {
            assert_eq!(Role::try_from(label), Ok(Role::Assistant), "{label}");
        }
        assert_eq!(Role::try_from("User"), Ok(Role::User));
        assert!(Role::try_from("system").is_err());
    }

    #[test]
    fn message_deserializes_role_alias() {
        let msg: Message = serde_json::from_value(json!({
            "id": "m1",
            "content": "hello",
            "role": "Bot",
            "createdAt": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(serde_json::to_value(&msg).unwrap()["role"], "assistant");
    }

    #[test]
    fn session_accepts_numeric_ids_and_snake_case() {
        let session: ChatSession = serde_json::from_value(json!({
            "id": 7,
            "title": "Groceries",
            "created_at": "2026-01-01"
        }))
        .unwrap();
        assert_eq!(session.id, "7");
        assert_eq!(session.created_at, "2026-01-01");

        let bad = serde_json::from_value::<ChatSession>(json!({ "id": null }));
        assert!(bad.is_err());
    }

    #[test]
    fn raw_message_tolerates_missing_fields() {
        let raw = RawMessage::from_json(&json!({ "id": 12, "role": "ai" }));
        assert_eq!(raw.id, "12");
        assert_eq!(raw.content, "");
        assert_eq!(raw.role.as_deref(), Some("ai"));

        let junk = RawMessage::from_json(&json!("not an object"));
        assert_eq!(junk, RawMessage::default());
    }

    #[test]
    fn raw_message_list_requires_an_array() {
        assert!(RawMessage::list_from_json(&json!({ "messages": [] })).is_empty());
        assert!(RawMessage::list_from_json(&Value::Null).is_empty());
        assert_eq!(RawMessage::list_from_json(&json!([{}, 1, "x"])).len(), 3);
    }

    #[test]
    fn sent_exchange_accepts_both_spellings() {
        let camel: SentExchange = serde_json::from_value(json!({
            "userMessage": { "id": "u1", "content": "hi" },
            "aiMessage": { "id": "a1", "content": "hello" }
        }))
        .unwrap();
        assert_eq!(camel.user_message.id, "u1");
        assert_eq!(camel.ai_message.id, "a1");

        let snake: SentExchange = serde_json::from_value(json!({
            "user_message": { "id": 1 },
            "ai_message": { "id": 2 }
        }))
        .unwrap();
        assert_eq!(snake.ai_message.id, "2");
    }
}
