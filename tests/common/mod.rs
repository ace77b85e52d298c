//! Scripted in-memory chat backend for driving the controller in tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chatdesk::audio::AudioPlayer;
use chatdesk::errors::ChatError;
use chatdesk::models::{ChatSession, RawMessage, SentExchange};
use chatdesk::ChatApi;
use chatdesk::ChatController;
use tokio::sync::Notify;

pub fn raw(id: &str, content: &str) -> RawMessage {
    RawMessage {
        id: id.to_string(),
        content: content.to_string(),
        role: None,
        created_at: None,
    }
}

pub fn session(id: &str) -> ChatSession {
    ChatSession {
        id: id.to_string(),
        title: format!("Session {id}"),
        created_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

#[derive(Default)]
struct Backend {
    sessions: Vec<ChatSession>,
    history: HashMap<String, Vec<RawMessage>>,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    held: HashSet<&'static str>,
    exchanges: u32,
    voice_turns: usize,
}

const OPS: [&str; 6] = [
    "list_sessions",
    "get_messages",
    "create_session",
    "delete_session",
    "send_message",
    "send_voice_message",
];

/// Lets a test pause one call mid-flight and act while it is outstanding.
#[derive(Default)]
struct Gate {
    started: Notify,
    release: Notify,
}

pub struct FakeChatApi {
    backend: Mutex<Backend>,
    gates: HashMap<&'static str, Gate>,
}

impl FakeChatApi {
    pub fn with_sessions(ids: &[&str]) -> Arc<Self> {
        let backend = Backend {
            sessions: ids.iter().map(|id| session(id)).collect(),
            voice_turns: 2,
            ..Backend::default()
        };
        Arc::new(Self {
            backend: Mutex::new(backend),
            gates: OPS.iter().map(|op| (*op, Gate::default())).collect(),
        })
    }

    pub fn set_history(&self, session_id: &str, contents: &[&str]) {
        let records = contents
            .iter()
            .enumerate()
            .map(|(i, c)| raw(&format!("{session_id}-m{i}"), c))
            .collect();
        self.lock().history.insert(session_id.to_string(), records);
    }

    /// Makes every later call to `op` fail with a remote error.
    pub fn fail(&self, op: &'static str) {
        self.lock().failing.insert(op);
    }

    pub fn set_voice_turns(&self, turns: usize) {
        self.lock().voice_turns = turns;
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.starts_with(op)).count()
    }

    /// The next call to `op` blocks until [`FakeChatApi::release`]. Failures
    /// set with [`FakeChatApi::fail`] are checked after the release.
    pub fn hold(&self, op: &'static str) {
        self.lock().held.insert(op);
    }

    /// Resolves once a held call to `op` has started.
    pub async fn wait_for(&self, op: &str) {
        self.gate(op).started.notified().await;
    }

    pub fn release(&self, op: &str) {
        self.gate(op).release.notify_one();
    }

    fn gate(&self, op: &str) -> &Gate {
        self.gates.get(op).unwrap_or_else(|| panic!("unknown op {op}"))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Backend> {
        self.backend.lock().unwrap()
    }

    async fn enter(&self, op: &'static str, arg: &str) -> Result<(), ChatError> {
        let held = {
            let mut backend = self.lock();
            backend.calls.push(format!("{op}:{arg}"));
            backend.held.remove(op)
        };
        if held {
            let gate = self.gate(op);
            gate.started.notify_one();
            gate.release.notified().await;
        }

        let failing = self.lock().failing.contains(op);
        if failing {
            return Err(ChatError::Remote(format!("{op} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn list_sessions(&self) -> Result<Vec<ChatSession>, ChatError> {
        self.enter("list_sessions", "").await?;
        Ok(self.lock().sessions.clone())
    }

    async fn get_messages(&self, session_id: &str) -> Result<Vec<RawMessage>, ChatError> {
        self.enter("get_messages", session_id).await?;
        Ok(self.lock().history.get(session_id).cloned().unwrap_or_default())
    }

    async fn create_session(&self, name: &str) -> Result<ChatSession, ChatError> {
        self.enter("create_session", name).await?;
        let mut backend = self.lock();
        let created = ChatSession {
            id: format!("new-{}", backend.sessions.len() + 1),
            title: name.to_string(),
            created_at: "2026-02-02T00:00:00Z".to_string(),
        };
        backend.sessions.insert(0, created.clone());
        Ok(created)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ChatError> {
        self.enter("delete_session", session_id).await?;
        let mut backend = self.lock();
        backend.sessions.retain(|s| s.id != session_id);
        backend.history.remove(session_id);
        Ok(())
    }

    async fn send_message(&self, text: &str, session_id: &str) -> Result<SentExchange, ChatError> {
        self.enter("send_message", session_id).await?;
        let mut backend = self.lock();
        backend.exchanges += 1;
        let n = backend.exchanges;
        let user = raw(&format!("u{n}"), text);
        let reply = raw(&format!("a{n}"), &format!("echo: {text}"));
        let history = backend.history.entry(session_id.to_string()).or_default();
        history.push(user.clone());
        history.push(reply.clone());
        Ok(SentExchange { user_message: user, ai_message: reply })
    }

    async fn send_voice_message(
        &self,
        audio: Vec<u8>,
        session_id: &str,
    ) -> Result<Vec<u8>, ChatError> {
        self.enter("send_voice_message", session_id).await?;
        let mut backend = self.lock();
        let turns = backend.voice_turns;
        let history = backend.history.entry(session_id.to_string()).or_default();
        for i in 0..turns {
            let n = history.len();
            history.push(raw(&format!("v{n}"), &format!("voice turn {i}")));
        }
        let mut reply = b"spoken:".to_vec();
        reply.extend_from_slice(&audio);
        Ok(reply)
    }
}

#[derive(Default)]
pub struct RecordingPlayer {
    played: Mutex<Vec<Vec<u8>>>,
    broken: AtomicBool,
}

impl RecordingPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn played(&self) -> Vec<Vec<u8>> {
        self.played.lock().unwrap().clone()
    }

    pub fn break_output(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioPlayer for RecordingPlayer {
    async fn play(&self, audio: &[u8]) -> Result<(), ChatError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ChatError::Playback(std::io::Error::other("no output device")));
        }
        self.played.lock().unwrap().push(audio.to_vec());
        Ok(())
    }
}

pub fn controller(api: &Arc<FakeChatApi>, player: &Arc<RecordingPlayer>) -> ChatController {
    ChatController::new(api.clone(), player.clone())
}
