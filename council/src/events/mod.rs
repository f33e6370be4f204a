//! Council progress stream
//!
//! The pipeline reports a turn as an ordered stream of typed events:
//!
//! ```text
//! stage1_start → stage1_model_complete* / stage1_model_failed*
//!              → [stage1_majority] → stage1_complete
//! stage2_start → stage2_model_complete* / stage2_model_failed*
//!              → [stage2_majority] → stage2_complete
//! stage3_start → stage3_complete
//! [title_complete] → timing_complete → complete | error
//! ```
//!
//! Per-model events arrive in completion order, not submission order. In
//! majority mode the next stage may start before the previous one's
//! `*_complete` arrives.
//!
//! # Usage
//!
//! ```ignore
//! use council::events::{StreamDecoder, StreamEvent};
//!
//! let mut decoder = StreamDecoder::new();
//! for result in decoder.push(chunk) {
//!     match result {
//!         Ok(event) => state = state.apply(&event).0,
//!         Err(e) => tracing::warn!(error = %e, "Dropping undecodable event"),
//!     }
//! }
//! ```

pub mod decode;
pub mod types;

pub use decode::{decode_event, decode_frame, DecodeError, DecodeResult, StreamDecoder};
pub use types::{StreamEvent, TimingSummary, TitleUpdate};
