use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use tracing::debug;

use crate::api::ChatApi;
use crate::errors::ChatError;
use crate::models::{
    ChatSession, CreateSessionRequest, RawMessage, SendMessageRequest, SentExchange,
};

/// [`ChatApi`] over the REST/JSON endpoints of the chat backend.
#[derive(Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: Url,
}

impl HttpChatApi {
    pub fn new(base_url: Url) -> Result<Self, ChatError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Fails for URLs that cannot carry a path, such as `mailto:`.
    pub fn with_client(client: Client, base_url: Url) -> Result<Self, ChatError> {
        if base_url.cannot_be_a_base() {
            return Err(ChatError::InvalidConfig {
                key: "base_url".to_string(),
                message: format!("'{base_url}' cannot be used as a base URL"),
            });
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends `segments` to the base path. Each segment is percent-encoded,
    /// so session ids containing `/`, `?` or `#` stay a single segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `with_client`: the base URL always has path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_sessions(&self) -> Result<Vec<ChatSession>, ChatError> {
        debug!("GET /api/sessions");
        let resp = self
            .client
            .get(self.endpoint(&["api", "sessions"]))
            .send()
            .await
            .map_err(ChatError::Network)?;

        json_body(ensure_success(resp).await?).await
    }

    async fn get_messages(&self, session_id: &str) -> Result<Vec<RawMessage>, ChatError> {
        debug!("GET /api/sessions/{session_id}/messages");
        let resp = self
            .client
            .get(self.endpoint(&["api", "sessions", session_id, "messages"]))
            .send()
            .await
            .map_err(ChatError::Network)?;

        let body: Value = json_body(ensure_success(resp).await?).await?;
        Ok(RawMessage::list_from_json(&body))
    }

    async fn create_session(&self, name: &str) -> Result<ChatSession, ChatError> {
        debug!("POST /api/sessions name={name:?}");
        let body = CreateSessionRequest { name: name.to_string() };
        let resp = self
            .client
            .post(self.endpoint(&["api", "sessions"]))
            .json(&body)
            .send()
            .await
            .map_err(ChatError::Network)?;

        json_body(ensure_success(resp).await?).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ChatError> {
        debug!("DELETE /api/sessions/{session_id}");
        let resp = self
            .client
            .delete(self.endpoint(&["api", "sessions", session_id]))
            .send()
            .await
            .map_err(ChatError::Network)?;

        ensure_success(resp).await?;
        Ok(())
    }

    async fn send_message(&self, text: &str, session_id: &str) -> Result<SentExchange, ChatError> {
        debug!("POST /api/chat session={session_id}");
        let body = SendMessageRequest {
            message: text.to_string(),
            session_id: session_id.to_string(),
        };
        let resp = self
            .client
            .post(self.endpoint(&["api", "chat"]))
            .json(&body)
            .send()
            .await
            .map_err(ChatError::Network)?;

        json_body(ensure_success(resp).await?).await
    }

    async fn send_voice_message(
        &self,
        audio: Vec<u8>,
        session_id: &str,
    ) -> Result<Vec<u8>, ChatError> {
        debug!("POST /api/sessions/{session_id}/voice ({} bytes)", audio.len());
        let resp = self
            .client
            .post(self.endpoint(&["api", "sessions", session_id, "voice"]))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(ChatError::Network)?;

        let bytes = ensure_success(resp)
            .await?
            .bytes()
            .await
            .map_err(ChatError::Network)?;
        Ok(bytes.to_vec())
    }
}

/// Maps a non-2xx status to [`ChatError::Server`], keeping the body text.
async fn ensure_success(resp: Response) -> Result<Response, ChatError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ChatError::Server { status: status.as_u16(), body })
}

async fn json_body<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, ChatError> {
    let bytes = resp.bytes().await.map_err(ChatError::Network)?;
    serde_json::from_slice(&bytes).map_err(|e| ChatError::Parse(e.to_string()))
}
