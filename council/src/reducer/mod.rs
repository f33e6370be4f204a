//! Pipeline event reducer
//!
//! Two layers, both pure:
//!
//! 1. **Message reducer** (`message.rs`): `(AssistantMessage, &StreamEvent)
//!    -> AssistantMessage`. Upserts per-model results, applies majority and
//!    final snapshots, tracks loading flags and server-side progress.
//!
//! 2. **Turn reducer** (`turn.rs`): `(ViewState, &StreamEvent) -> (ViewState,
//!    Vec<Effect>)`. Owns the optimistic append, title updates, terminal
//!    events and transport-failure rollback.
//!
//! # Usage
//!
//! ```ignore
//! use council::reducer::{ViewState, Effect};
//!
//! let mut state = ViewState::new(conversation).begin_turn("Why is the sky blue?")?;
//! for event in stream {
//!     let (next, effects) = state.apply(&event);
//!     state = next;
//!     for effect in effects {
//!         match effect {
//!             Effect::RefreshConversations => reload_list(),
//!             Effect::ShowError { message } => show(&message),
//!         }
//!     }
//! }
//! ```

pub mod message;
pub mod turn;

pub use message::{reduce, upsert, StageEntry};
pub use turn::{replay, Effect, TurnError, TurnPhase, TurnResult, ViewState};
