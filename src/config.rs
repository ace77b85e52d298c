use std::path::PathBuf;

use reqwest::Url;

use crate::errors::ChatError;

pub const API_BASE_URL_VAR: &str = "CHATDESK_API_BASE_URL";
pub const AUDIO_DIR_VAR: &str = "CHATDESK_AUDIO_DIR";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the chat backend. Endpoint paths are appended to its path.
    pub api_base_url: Url,
    /// Where voice replies are written for playback.
    pub audio_dir: PathBuf,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ChatError> {
        let api_base_url = lookup(API_BASE_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = validate_base_url(api_base_url.trim())?;

        let audio_dir = lookup(AUDIO_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("chatdesk-audio"));

        Ok(Self { api_base_url, audio_dir })
    }
}

fn validate_base_url(raw: &str) -> Result<Url, ChatError> {
    let invalid = |message: String| ChatError::InvalidConfig {
        key: API_BASE_URL_VAR.to_string(),
        message,
    };
    let url = Url::parse(raw).map_err(|e| invalid(format!("'{raw}' is not a URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url)
}
