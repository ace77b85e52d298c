use crate::controller::state::ControllerState;
use crate::errors::ChatError;
use crate::models::Message;

pub const TEMP_ID_PREFIX: &str = "temp-";

/// How an optimistic send was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Placeholder replaced by the persisted user message and the reply.
    Committed,
    /// Placeholder removed after the remote call failed.
    RolledBack,
    /// The call succeeded but the thread it was sent from is gone.
    Discarded,
}

/// An optimistic message that is visible but not yet resolved.
///
/// Created by [`PendingSend::begin`] and consumed by exactly one of
/// [`PendingSend::commit`] or [`PendingSend::roll_back`].
#[derive(Debug)]
#[must_use = "a pending send must be committed or rolled back"]
pub struct PendingSend {
    temp_id: String,
    session_id: String,
    epoch: u64,
}

impl PendingSend {
    /// Idle → Sending: appends `placeholder` and raises `is_loading` in one step.
    pub(crate) fn begin(state: &mut ControllerState, placeholder: Message) -> Result<Self, ChatError> {
        if state.is_loading || state.pending_message_id.is_some() {
            return Err(ChatError::SendInFlight);
        }
        let session_id = state
            .current_session_id
            .clone()
            .ok_or(ChatError::NoSessionSelected)?;

        let temp_id = placeholder.id.clone();
        state.begin_loading();
        state.pending_message_id = Some(temp_id.clone());
        state.messages.push(placeholder);

        Ok(Self { temp_id, session_id, epoch: state.thread_epoch() })
    }

    pub fn temp_id(&self) -> &str {
        &self.temp_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub(crate) fn commit(self, state: &mut ControllerState, user: Message, reply: Message) -> SendOutcome {
        let same_thread = state.thread_epoch() == self.epoch;
        self.release(state);
        if !same_thread {
            return SendOutcome::Discarded;
        }
        state.messages.push(user);
        state.messages.push(reply);
        SendOutcome::Committed
    }

    pub(crate) fn roll_back(self, state: &mut ControllerState) -> SendOutcome {
        self.release(state);
        SendOutcome::RolledBack
    }

    fn release(self, state: &mut ControllerState) {
        state.messages.retain(|m| m.id != self.temp_id);
        if state.pending_message_id.as_deref() == Some(self.temp_id.as_str()) {
            state.pending_message_id = None;
        }
        state.end_loading();
    }
}
