use tokio::sync::watch;

use crate::models::{ChatSession, Message};

/// Everything the presentation layer renders from.
///
/// Only [`StateStore::update`] mutates it; presentation gets clones.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub is_sidebar_open: bool,
    pub chat_sessions: Vec<ChatSession>,
    pub current_session_id: Option<String>,
    /// Thread of the current session in append order, pending message included.
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_loading_sessions: bool,
    pub show_new_session_modal: bool,
    pub new_session_name: String,
    /// Temp id of the optimistic message while a text send is in flight.
    pub pending_message_id: Option<String>,
    loading_ops: u32,
    thread_epoch: u64,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            is_sidebar_open: true,
            chat_sessions: Vec::new(),
            current_session_id: None,
            messages: Vec::new(),
            is_loading: false,
            is_loading_sessions: false,
            show_new_session_modal: false,
            new_session_name: String::new(),
            pending_message_id: None,
            loading_ops: 0,
            thread_epoch: 0,
        }
    }
}

impl ControllerState {
    pub fn current_session(&self) -> Option<&ChatSession> {
        let id = self.current_session_id.as_deref()?;
        self.chat_sessions.iter().find(|s| s.id == id)
    }

    /// `is_loading` stays raised until every operation that raised it has ended.
    pub(crate) fn begin_loading(&mut self) {
        self.loading_ops += 1;
        self.is_loading = true;
    }

    pub(crate) fn end_loading(&mut self) {
        self.loading_ops = self.loading_ops.saturating_sub(1);
        self.is_loading = self.loading_ops > 0;
    }

    /// Empties the thread. Results of fetches or sends started against the
    /// previous thread compare epochs and are dropped.
    pub(crate) fn reset_thread(&mut self) {
        self.messages.clear();
        self.thread_epoch += 1;
    }

    pub(crate) fn thread_epoch(&self) -> u64 {
        self.thread_epoch
    }
}

/// Owns the single [`ControllerState`] and publishes every change.
pub struct StateStore {
    tx: watch::Sender<ControllerState>,
}

impl StateStore {
    pub fn new(initial: ControllerState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn snapshot(&self) -> ControllerState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.tx.subscribe()
    }

    /// The single mutation entry point. `f` runs synchronously, so each call
    /// is atomic with respect to the controller's other operations.
    pub fn update<R>(&self, f: impl FnOnce(&mut ControllerState) -> R) -> R {
        let mut output = None;
        self.tx.send_modify(|state| output = Some(f(state)));
        output.unwrap_or_else(|| unreachable!("send_modify runs its closure exactly once"))
    }
}
