//! Turn reducer: conversation-level state for one in-flight turn
//!
//! Wraps the message reducer with the pieces that live above a single
//! message: optimistic append, title updates, terminal events and
//! transport-failure rollback. Side effects the UI must perform are
//! returned as [`Effect`] values rather than executed here.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::message::reduce;
use crate::events::StreamEvent;
use crate::state::{AssistantMessage, Conversation, Message};

/// Error type for turn transitions
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("A turn is already streaming for conversation {0}")]
    AlreadyStreaming(String),

    #[error("Message content is empty")]
    EmptyContent,
}

/// Result type for turn transitions
pub type TurnResult<T> = Result<T, TurnError>;

/// Lifecycle of the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// No turn has been started, or the last one was rolled back
    #[default]
    Idle,
    /// Events are being applied
    Streaming,
    /// `complete` arrived
    Completed,
    /// `error` arrived; partial state is kept for inspection
    Aborted,
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "idle"),
            TurnPhase::Streaming => write!(f, "streaming"),
            TurnPhase::Completed => write!(f, "completed"),
            TurnPhase::Aborted => write!(f, "aborted"),
        }
    }
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Reload the conversation list (titles or message counts changed)
    RefreshConversations,
    /// Surface an error message to the user
    ShowError { message: String },
}

/// Client-side view of one conversation and its in-flight turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub conversation: Conversation,
    /// Turn-level loading indicator
    pub is_loading: bool,
    pub phase: TurnPhase,
    #[serde(default)]
    pub last_error: Option<String>,
    /// Where the optimistic pair starts while a turn streams
    #[serde(default)]
    optimistic_from: Option<usize>,
}

impl ViewState {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            is_loading: false,
            phase: TurnPhase::Idle,
            last_error: None,
            optimistic_from: None,
        }
    }

    /// Optimistically append the user message and an empty assistant
    /// accumulator, and start streaming
    pub fn begin_turn(mut self, content: &str) -> TurnResult<Self> {
        if self.phase == TurnPhase::Streaming {
            return Err(TurnError::AlreadyStreaming(self.conversation.id.clone()));
        }
        if content.trim().is_empty() {
            return Err(TurnError::EmptyContent);
        }

        self.optimistic_from = Some(self.conversation.messages.len());
        self.conversation.messages.push(Message::user(content));
        self.conversation
            .messages
            .push(Message::Assistant(AssistantMessage::pending()));
        self.is_loading = true;
        self.phase = TurnPhase::Streaming;
        self.last_error = None;

        info!(conversation = %self.conversation.id, "Turn started");
        Ok(self)
    }

    /// The assistant message the current turn is filling in
    pub fn current_message(&self) -> Option<&AssistantMessage> {
        let index = self.conversation.last_assistant_index()?;
        self.conversation.assistant_at(index)
    }

    /// Apply one stream event
    ///
    /// Titles are generated separately from the stream and may land after
    /// `complete` or `error`, so `title_complete` is applied in any phase.
    pub fn apply(mut self, event: &StreamEvent) -> (Self, Vec<Effect>) {
        if let StreamEvent::TitleComplete { data } = event {
            debug!(title = %data.title, phase = %self.phase, "Conversation titled");
            self.conversation.title = data.title.clone();
            return (self, vec![Effect::RefreshConversations]);
        }
        if self.phase != TurnPhase::Streaming {
            warn!(
                event = event.event_type(),
                phase = %self.phase,
                "Ignoring event outside a streaming turn"
            );
            return (self, Vec::new());
        }

        let mut effects = Vec::new();
        match event {
            StreamEvent::Complete => {
                self.is_loading = false;
                self.phase = TurnPhase::Completed;
                self.optimistic_from = None;
                info!(conversation = %self.conversation.id, "Turn complete");
                effects.push(Effect::RefreshConversations);
            }
            StreamEvent::Error { message } => {
                warn!(conversation = %self.conversation.id, error = %message, "Turn aborted");
                self.is_loading = false;
                self.phase = TurnPhase::Aborted;
                self.optimistic_from = None;
                self.last_error = Some(message.clone());
                effects.push(Effect::ShowError {
                    message: message.clone(),
                });
            }
            _ => self.reduce_current(event),
        }

        (self, effects)
    }

    /// Undo the optimistic append after a transport failure
    ///
    /// Removes exactly the user/assistant pair the current turn appended;
    /// earlier history is untouched.
    pub fn rollback(mut self) -> Self {
        let Some(start) = self.optimistic_from.take() else {
            warn!(phase = %self.phase, "No optimistic turn to roll back");
            self.is_loading = false;
            return self;
        };

        if self.conversation.messages.len() == start + 2 {
            self.conversation.messages.truncate(start);
        } else {
            warn!(
                expected = start + 2,
                actual = self.conversation.messages.len(),
                "Message list changed during the turn; leaving it as is"
            );
        }
        self.is_loading = false;
        self.phase = TurnPhase::Idle;
        info!(conversation = %self.conversation.id, "Turn rolled back");
        self
    }

    fn reduce_current(&mut self, event: &StreamEvent) {
        let Some(index) = self.conversation.last_assistant_index() else {
            warn!(event = event.event_type(), "No assistant message to update");
            return;
        };
        if let Some(Message::Assistant(message)) = self.conversation.messages.get_mut(index) {
            let current = std::mem::take(message);
            *message = reduce(current, event);
        }
    }
}

/// Fold a sequence of events into `state`, collecting every effect
pub fn replay<'a, I>(state: ViewState, events: I) -> (ViewState, Vec<Effect>)
where
    I: IntoIterator<Item = &'a StreamEvent>,
{
    events
        .into_iter()
        .fold((state, Vec::new()), |(state, mut effects), event| {
            let (state, new_effects) = state.apply(event);
            effects.extend(new_effects);
            (state, effects)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TitleUpdate;
    use crate::state::{ModelResult, Stage};
    use chrono::Utc;

    fn conversation_with_history() -> Conversation {
        let mut conversation = Conversation::with_id("conv-1", Utc::now());
        conversation.messages.push(Message::user("earlier question"));
        conversation
            .messages
            .push(Message::Assistant(AssistantMessage::pending()));
        conversation
    }

    #[test]
    fn test_begin_turn_appends_pair() {
        let state = ViewState::new(conversation_with_history())
            .begin_turn("new question")
            .unwrap();

        assert_eq!(state.conversation.messages.len(), 4);
        assert!(state.is_loading);
        assert_eq!(state.phase, TurnPhase::Streaming);
        assert!(state.current_message().is_some());
    }

    #[test]
    fn test_begin_turn_rejects_concurrent_turn() {
        let state = ViewState::new(conversation_with_history())
            .begin_turn("one")
            .unwrap();
        let err = state.begin_turn("two").unwrap_err();
        assert!(matches!(err, TurnError::AlreadyStreaming(id) if id == "conv-1"));
    }

    #[test]
    fn test_rollback_removes_exactly_the_optimistic_pair() {
        let before = conversation_with_history();
        let state = ViewState::new(before.clone()).begin_turn("doomed").unwrap();
        let (state, _) = state.apply(&StreamEvent::Stage1Start);

        let state = state.rollback();
        assert_eq!(state.conversation.messages, before.messages);
        assert!(!state.is_loading);
        assert_eq!(state.phase, TurnPhase::Idle);
    }

    #[test]
    fn test_title_complete_requests_refresh() {
        let state = ViewState::new(Conversation::with_id("c", Utc::now()))
            .begin_turn("q")
            .unwrap();
        let (state, effects) = state.apply(&StreamEvent::TitleComplete {
            data: TitleUpdate {
                title: "Borrow checker basics".to_string(),
            },
        });

        assert_eq!(state.conversation.title, "Borrow checker basics");
        assert_eq!(effects, vec![Effect::RefreshConversations]);
        assert!(state.is_loading);
    }

    #[test]
    fn test_late_title_after_complete_still_applies() {
        let state = ViewState::new(Conversation::with_id("c", Utc::now()))
            .begin_turn("q")
            .unwrap();
        let (state, _) = state.apply(&StreamEvent::Complete);
        let (state, effects) = state.apply(&StreamEvent::TitleComplete {
            data: TitleUpdate {
                title: "Late title".to_string(),
            },
        });

        assert_eq!(state.conversation.title, "Late title");
        assert_eq!(effects, vec![Effect::RefreshConversations]);
        assert_eq!(state.phase, TurnPhase::Completed);
        assert!(!state.is_loading);
    }

    #[test]
    fn test_late_title_after_error_still_applies() {
        let state = ViewState::new(Conversation::with_id("c", Utc::now()))
            .begin_turn("q")
            .unwrap();
        let (state, _) = state.apply(&StreamEvent::Error {
            message: "boom".to_string(),
        });
        let (state, effects) = state.apply(&StreamEvent::TitleComplete {
            data: TitleUpdate {
                title: "Titled anyway".to_string(),
            },
        });

        assert_eq!(state.conversation.title, "Titled anyway");
        assert_eq!(effects, vec![Effect::RefreshConversations]);
        assert_eq!(state.phase, TurnPhase::Aborted);
    }

    #[test]
    fn test_error_aborts_and_keeps_partial_state() {
        let state = ViewState::new(Conversation::with_id("c", Utc::now()))
            .begin_turn("q")
            .unwrap();
        let events = [
            StreamEvent::Stage1Start,
            StreamEvent::Stage1ModelComplete {
                model: "a/one".to_string(),
                response: ModelResult::new("a/one", "partial"),
                completed: 1,
                total: 2,
            },
            StreamEvent::Error {
                message: "upstream closed".to_string(),
            },
            StreamEvent::Stage1ModelComplete {
                model: "b/two".to_string(),
                response: ModelResult::new("b/two", "too late"),
                completed: 2,
                total: 2,
            },
        ];

        let (state, effects) = replay(state, events.iter());
        assert_eq!(state.phase, TurnPhase::Aborted);
        assert!(!state.is_loading);
        assert_eq!(state.last_error.as_deref(), Some("upstream closed"));
        assert_eq!(
            effects,
            vec![Effect::ShowError {
                message: "upstream closed".to_string()
            }]
        );

        let message = state.current_message().unwrap();
        assert_eq!(message.stage1.as_ref().map(Vec::len), Some(1));
        assert!(message.loading.get(Stage::Stage1));
    }

    #[test]
    fn test_complete_clears_loading_and_refreshes() {
        let state = ViewState::new(Conversation::with_id("c", Utc::now()))
            .begin_turn("q")
            .unwrap();
        let (state, effects) = state.apply(&StreamEvent::Complete);

        assert_eq!(state.phase, TurnPhase::Completed);
        assert!(!state.is_loading);
        assert_eq!(effects, vec![Effect::RefreshConversations]);

        // Completed turns are persisted; rollback must not delete them
        let state = state.rollback();
        assert_eq!(state.conversation.messages.len(), 2);
    }

    #[test]
    fn test_events_before_begin_are_ignored() {
        let state = ViewState::new(Conversation::with_id("c", Utc::now()));
        let (state, effects) = state.apply(&StreamEvent::Stage1Start);
        assert!(effects.is_empty());
        assert!(state.conversation.messages.is_empty());
    }
}
