use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::errors::ChatError;

/// Receives the synthesized audio of a voice reply.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, audio: &[u8]) -> Result<(), ChatError>;
}

/// Writes every reply to its own file under `dir` for an external player.
#[derive(Clone, Debug)]
pub struct FileAudioPlayer {
    dir: PathBuf,
}

impl FileAudioPlayer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl AudioPlayer for FileAudioPlayer {
    async fn play(&self, audio: &[u8]) -> Result<(), ChatError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(ChatError::Playback)?;

        let path = self.dir.join(format!("reply-{}.mp3", Uuid::new_v4()));
        tokio::fs::write(&path, audio)
            .await
            .map_err(ChatError::Playback)?;

        info!("Voice reply saved to {} ({} bytes)", path.display(), audio.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_each_reply_to_a_new_file() {
        let dir = std::env::temp_dir().join(format!("chatdesk-audio-test-{}", Uuid::new_v4()));
        let player = FileAudioPlayer::new(&dir);

        player.play(b"first").await.unwrap();
        player.play(b"second").await.unwrap();

        let mut contents = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            contents.push(tokio::fs::read(entry.path()).await.unwrap());
        }
        contents.sort();
        assert_eq!(contents, vec![b"first".to_vec(), b"second".to_vec()]);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
