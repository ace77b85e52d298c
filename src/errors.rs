use thiserror::Error;

/// Every failure the chat controller and its collaborators can surface.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum ChatError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("No chat session is selected")]
    NoSessionSelected,

    #[error("A message is already being sent")]
    SendInFlight,

    // ── Remote service errors ────────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Remote service error: {0}")]
    Remote(String),

    // ── Local errors ─────────────────────────────────────────────────────────
    #[error("Audio playback failed: {0}")]
    Playback(#[source] std::io::Error),

    #[error("Invalid configuration for {key}: {message}")]
    InvalidConfig { key: String, message: String },
}

impl ChatError {
    pub fn empty_field(field_name: impl Into<String>) -> Self {
        ChatError::EmptyField { field_name: field_name.into() }
    }

    /// Rejected before any remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyField { .. } | ChatError::NoSessionSelected | ChatError::SendInFlight
        )
    }

    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ChatError::Network(_)
                | ChatError::Server { .. }
                | ChatError::Parse(_)
                | ChatError::Remote(_)
        )
    }
}
