//! Council View Library
//!
//! Client-side engine for three-stage council runs: several models answer
//! independently (stage 1), rank each other's answers anonymously
//! (stage 2), and a chairman model synthesizes a final answer (stage 3).
//!
//! This library provides:
//! - A decoder for the pipeline's progress stream
//! - A pure reducer that materializes a turn from that stream
//! - Peer-review deanonymization and good/fair/poor indicators
//! - A deterministic rank vs. delay/cost chart (SVG and PNG)
//! - A markdown report exporter
//! - Cross-conversation model statistics
//!
//! # Data flow
//!
//! ```text
//! stream chunks ─→ StreamDecoder ─→ StreamEvent ─→ ViewState::apply ─→ Conversation
//!                                                                      │
//!                     display (deanonymize, indicators) ←──────────────┤
//!                     chart::render_chart ←─ ChartInput::from_turn ←───┤
//!                     report::export_turn ←────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use council::{StreamDecoder, ViewConfig, ViewState};
//!
//! let config = ViewConfig::resolve(None)?;
//! let mut state = ViewState::new(conversation).begin_turn("Compare B-trees and LSM trees")?;
//! let mut decoder = StreamDecoder::new();
//! for event in decoder.push(chunk).into_iter().flatten() {
//!     state = state.apply(&event).0;
//! }
//! let artifact = council::report::export_latest(&state.conversation, &config)?;
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod analytics;
pub mod chart;
pub mod config;
pub mod display;
pub mod events;
pub mod reducer;
pub mod report;
pub mod state;

// Re-export the types most callers need
pub use chart::{render_chart, ChartError, ChartImage, ChartInput, ChartPoint, ChartResult};
pub use config::{ConfigError, ConfigResult, ViewConfig};
pub use display::{deanonymize, short_model_name, Indicator, StatsComparator, Thresholds};
pub use events::{DecodeError, StreamDecoder, StreamEvent};
pub use reducer::{replay, Effect, TurnError, TurnPhase, ViewState};
pub use report::{export_latest, export_turn, ExportArtifact, ExportError};
pub use state::{AssistantMessage, Conversation, Message, ModelResult, RankingResult, Stage};
