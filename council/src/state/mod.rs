//! Conversation state for council runs
//!
//! A conversation holds alternating user and assistant messages. The
//! assistant message is an accumulator that the reducer fills in as the
//! three pipeline stages stream in:
//!
//! - `stage1`: independent responses, one per council member
//! - `stage2`: anonymous peer rankings plus label map and aggregate ranks
//! - `stage3`: the chairman's synthesis
//!
//! Shapes match the pipeline's JSON, so saved conversations load with the
//! same types the stream decoder produces.

pub mod types;

pub use types::{
    AggregateRanking, AssistantMessage, Conversation, ConversationId, ConversationSummary,
    FinalResult, Label, Message, ModelName, ModelResult, Progress, RankingResult, Stage,
    StageLoading, StageProgress, TokenUsage, TurnMetadata, UserMessage, DEFAULT_TITLE,
    NO_RESPONSE_PLACEHOLDER,
};
