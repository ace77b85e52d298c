//! Chat session and message state controller.
//!
//! One [`ChatController`] owns the [`ControllerState`] for a single user. Its
//! actions suspend on the remote [`ChatApi`] and then publish the resulting
//! state; every mutation happens inside a synchronous [`StateStore::update`]
//! call, so actions polled concurrently on one task never interleave
//! half-applied changes.

pub mod notify;
pub mod pending;
pub mod state;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::api::ChatApi;
use crate::audio::AudioPlayer;
use crate::errors::ChatError;
use crate::models::{ChatSession, Message, Role};
use crate::normalizer::normalize_messages;

pub use notify::{Notification, NotificationLevel, Notifier};
pub use pending::{PendingSend, SendOutcome, TEMP_ID_PREFIX};
pub use state::{ControllerState, StateStore};

pub struct ChatController {
    api: Arc<dyn ChatApi>,
    player: Arc<dyn AudioPlayer>,
    store: StateStore,
    notifier: Notifier,
    last_temp_stamp: AtomicI64,
}

impl ChatController {
    /// Builds an idle controller. Call [`ChatController::initialize`] once afterwards.
    pub fn new(api: Arc<dyn ChatApi>, player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            api,
            player,
            store: StateStore::new(ControllerState::default()),
            notifier: Notifier::new(),
            last_temp_stamp: AtomicI64::new(0),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.store.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    pub fn current_session(&self) -> Option<ChatSession> {
        self.store.snapshot().current_session().cloned()
    }

    // ── Session lifecycle ────────────────────────────────────────────────────

    /// Loads the session list and selects the first session, if any.
    ///
    /// Only a failed session listing is returned as an error. If the first
    /// session's history fails to load, the list is still kept and the
    /// failure reaches subscribers as a notification.
    pub async fn initialize(&self) -> Result<(), ChatError> {
        self.store.update(|s| s.is_loading_sessions = true);
        let result = self.load_sessions().await;
        self.store.update(|s| s.is_loading_sessions = false);
        result
    }

    async fn load_sessions(&self) -> Result<(), ChatError> {
        let sessions = self
            .api
            .list_sessions()
            .await
            .map_err(|e| self.report("Failed to load chat sessions", e))?;

        info!("Loaded {} chat sessions", sessions.len());
        let first = sessions.first().map(|s| s.id.clone());
        self.store.update(|s| s.chat_sessions = sessions);

        if let Some(id) = first {
            if let Err(e) = self.select_session(&id).await {
                debug!("Sessions loaded, but history for {id} did not: {e}");
            }
        }
        Ok(())
    }

    /// Switches to `session_id` and loads its history. No-op if already selected.
    pub async fn select_session(&self, session_id: &str) -> Result<(), ChatError> {
        let epoch = self.store.update(|s| {
            if s.current_session_id.as_deref() == Some(session_id) {
                return None;
            }
            s.current_session_id = Some(session_id.to_string());
            s.reset_thread();
            s.begin_loading();
            Some(s.thread_epoch())
        });
        let Some(epoch) = epoch else {
            return Ok(());
        };

        match self.api.get_messages(session_id).await {
            Ok(raw) => {
                let messages = normalize_messages(raw);
                let stored = self.store.update(|s| {
                    s.end_loading();
                    if s.thread_epoch() != epoch {
                        return false;
                    }
                    s.messages = messages;
                    true
                });
                if !stored {
                    debug!("Dropped history for session {session_id}: no longer selected");
                }
                Ok(())
            }
            Err(e) => {
                let current = self.store.update(|s| {
                    s.end_loading();
                    s.thread_epoch() == epoch
                });
                if !current {
                    debug!("Ignored history error for {session_id}, no longer selected: {e}");
                    return Ok(());
                }
                Err(self.report("Failed to load messages", e))
            }
        }
    }

    pub async fn create_session(&self, name: &str) -> Result<(), ChatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.report("Cannot create session", ChatError::empty_field("name")));
        }

        let session = self
            .api
            .create_session(name)
            .await
            .map_err(|e| self.report("Failed to create session", e))?;

        info!("Created session {}", session.id);
        let title = session.title.clone();
        self.store.update(|s| {
            s.current_session_id = Some(session.id.clone());
            s.chat_sessions.insert(0, session);
            s.reset_thread();
            s.show_new_session_modal = false;
            s.new_session_name.clear();
        });
        self.notifier.success(format!("Created session \"{title}\""));
        Ok(())
    }

    /// Deletes `session_id`; if it was selected, falls over to the first remaining session.
    ///
    /// Once the server has deleted the session this returns `Ok`, even when
    /// the fallback session's history then fails to load. That failure is
    /// reported as a notification only.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), ChatError> {
        self.api
            .delete_session(session_id)
            .await
            .map_err(|e| self.report("Failed to delete session", e))?;

        info!("Deleted session {session_id}");
        let next = self.store.update(|s| {
            s.chat_sessions.retain(|c| c.id != session_id);
            if s.current_session_id.as_deref() != Some(session_id) {
                return None;
            }
            let next = s.chat_sessions.first().map(|c| c.id.clone());
            if next.is_none() {
                s.current_session_id = None;
                s.reset_thread();
            }
            next
        });
        self.notifier.success("Session deleted");

        if let Some(id) = next {
            if let Err(e) = self.select_session(&id).await {
                debug!("Session {session_id} deleted, but history for {id} did not load: {e}");
            }
        }
        Ok(())
    }

    // ── Message lifecycle ────────────────────────────────────────────────────

    /// Sends `text` with an optimistic placeholder that is replaced on success
    /// and removed on failure. Blank text, or any operation already in
    /// flight, makes this a no-op.
    pub async fn send_text_message(&self, text: &str) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let placeholder = Message::pending(self.next_temp_id(), text.to_string());
        let pending = match self.store.update(|s| PendingSend::begin(s, placeholder)) {
            Ok(pending) => pending,
            Err(ChatError::SendInFlight) => {
                debug!("Ignoring send while another operation is in flight");
                return Ok(());
            }
            Err(e) => return Err(self.report("Cannot send message", e)),
        };
        debug!("Sending {} to session {}", pending.temp_id(), pending.session_id());

        let session_id = pending.session_id().to_string();
        match self.api.send_message(text, &session_id).await {
            Ok(exchange) => {
                let user = exchange.user_message.into_message(Role::User);
                let reply = exchange.ai_message.into_message(Role::Assistant);
                let outcome = self.store.update(|s| pending.commit(s, user, reply));
                if outcome == SendOutcome::Discarded {
                    info!("Reply for session {session_id} arrived after the thread changed");
                }
                Ok(())
            }
            Err(e) => {
                self.store.update(|s| pending.roll_back(s));
                Err(self.report("Failed to send message", e))
            }
        }
    }

    /// Uploads recorded audio, reloads the whole thread and plays the spoken reply.
    pub async fn send_voice_message(&self, audio: Vec<u8>) -> Result<(), ChatError> {
        if audio.is_empty() {
            return Err(self.report("Cannot send voice message", ChatError::empty_field("audio")));
        }

        let started: Result<(String, u64), ChatError> = self.store.update(|s| {
            let session_id = s
                .current_session_id
                .clone()
                .ok_or(ChatError::NoSessionSelected)?;
            if s.is_loading {
                return Err(ChatError::SendInFlight);
            }
            s.begin_loading();
            Ok((session_id, s.thread_epoch()))
        });
        let (session_id, epoch) =
            started.map_err(|e| self.report("Cannot send voice message", e))?;

        let result = self.exchange_voice(audio, &session_id, epoch).await;
        self.store.update(|s| s.end_loading());
        result
    }

    async fn exchange_voice(
        &self,
        audio: Vec<u8>,
        session_id: &str,
        epoch: u64,
    ) -> Result<(), ChatError> {
        let reply = self
            .api
            .send_voice_message(audio, session_id)
            .await
            .map_err(|e| self.report("Failed to send voice message", e))?;

        // The server may have appended any number of turns; reload rather than patch.
        let raw = self
            .api
            .get_messages(session_id)
            .await
            .map_err(|e| self.report("Failed to refresh messages", e))?;
        let messages = normalize_messages(raw);
        self.store.update(|s| {
            if s.thread_epoch() == epoch {
                s.messages = messages;
            }
        });

        self.player
            .play(&reply)
            .await
            .map_err(|e| self.report("Failed to play voice reply", e))
    }

    // ── Presentation setters ─────────────────────────────────────────────────

    pub fn set_sidebar_open(&self, open: bool) {
        self.store.update(|s| s.is_sidebar_open = open);
    }

    pub fn set_show_new_session_modal(&self, show: bool) {
        self.store.update(|s| s.show_new_session_modal = show);
    }

    pub fn set_new_session_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.store.update(|s| s.new_session_name = name);
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn report(&self, context: &str, err: ChatError) -> ChatError {
        self.notifier.report(context, &err);
        err
    }

    /// `temp-<millis>`, bumped past the previous stamp when the clock repeats.
    fn next_temp_id(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_temp_stamp
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        format!("{TEMP_ID_PREFIX}{}", now.max(previous + 1))
    }
}
