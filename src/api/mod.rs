pub mod http;

use async_trait::async_trait;

use crate::errors::ChatError;
use crate::models::{ChatSession, RawMessage, SentExchange};

pub use http::HttpChatApi;

/// The remote chat service the controller talks to.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn list_sessions(&self) -> Result<Vec<ChatSession>, ChatError>;

    /// History for one session, in server order.
    async fn get_messages(&self, session_id: &str) -> Result<Vec<RawMessage>, ChatError>;

    async fn create_session(&self, name: &str) -> Result<ChatSession, ChatError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), ChatError>;

    async fn send_message(&self, text: &str, session_id: &str) -> Result<SentExchange, ChatError>;

    /// Uploads recorded audio and returns the synthesized audio reply.
    async fn send_voice_message(
        &self,
        audio: Vec<u8>,
        session_id: &str,
    ) -> Result<Vec<u8>, ChatError>;
}
