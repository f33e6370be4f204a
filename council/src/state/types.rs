//! Core types for council conversations
//!
//! These mirror the JSON shapes the council pipeline emits, so the same
//! types deserialize live stream payloads and saved conversations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for conversations
pub type ConversationId = String;

/// Model identifier, by convention `<provider>/<name>`
pub type ModelName = String;

/// Anonymous peer-review label such as `Response A`
pub type Label = String;

/// Response text the pipeline substitutes for a model that never answered
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response.";

/// Title a conversation carries until title generation finishes
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Token accounting reported by the upstream provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    /// Provider-side cost, used when the result itself carries none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Cost billed by the upstream provider behind a router
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_inference_cost: Option<f64>,
}

/// A single stage-1 response from one council member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    /// Model that produced the response
    pub model: ModelName,

    /// Full response text (markdown)
    pub response: String,

    /// Wall-clock seconds; `None` means timed out or unavailable
    #[serde(default)]
    pub elapsed_time: Option<f64>,

    /// Cost in currency units; `None` means unknown
    #[serde(default)]
    pub cost: Option<f64>,

    /// Token usage, when the provider reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl ModelResult {
    /// Create a result with no timing or cost information
    pub fn new(model: impl Into<ModelName>, response: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response: response.into(),
            elapsed_time: None,
            cost: None,
            usage: None,
        }
    }

    /// Set elapsed time in seconds
    pub fn with_elapsed(mut self, seconds: f64) -> Self {
        self.elapsed_time = Some(seconds);
        self
    }

    /// Set cost
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Whether this entry stands in for a model that never answered
    pub fn is_placeholder(&self) -> bool {
        self.response == NO_RESPONSE_PLACEHOLDER && self.elapsed_time.is_none()
    }

    /// Cost from the result, falling back to the usage block
    pub fn effective_cost(&self) -> Option<f64> {
        self.cost
            .or_else(|| self.usage.as_ref().and_then(|usage| usage.cost))
    }
}

/// A stage-2 peer ranking from one council member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    /// Model that produced the ranking
    pub model: ModelName,

    /// Raw evaluation text, still containing anonymous labels
    pub ranking: String,

    /// Labels in ranked order, best first
    #[serde(default)]
    pub parsed_ranking: Vec<Label>,

    #[serde(default)]
    pub elapsed_time: Option<f64>,

    #[serde(default)]
    pub cost: Option<f64>,
}

impl RankingResult {
    pub fn new(model: impl Into<ModelName>, ranking: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ranking: ranking.into(),
            parsed_ranking: Vec::new(),
            elapsed_time: None,
            cost: None,
        }
    }

    /// Set the parsed label order
    pub fn with_parsed<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Label>,
    {
        self.parsed_ranking = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// The stage-3 synthesis produced by the chairman model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub model: ModelName,
    pub response: String,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    /// Whether the chairman ran with a user-supplied prompt override
    #[serde(default)]
    pub custom_chairman_instructions: bool,
}

/// Per-model summary statistics computed across all peer evaluations
///
/// Derived by the pipeline; read-only on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRanking {
    pub model: ModelName,
    /// Mean position across rankings; lower is better
    pub average_rank: f64,
    /// Number of rankings that placed this model
    #[serde(default)]
    pub rankings_count: u32,
    #[serde(default)]
    pub total_elapsed_time: Option<f64>,
    #[serde(default)]
    pub total_cost: Option<f64>,
}

/// Label map and aggregate rankings attached to stage 2
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnMetadata {
    #[serde(default)]
    pub label_to_model: BTreeMap<Label, ModelName>,
    #[serde(default)]
    pub aggregate_rankings: Vec<AggregateRanking>,
}

impl TurnMetadata {
    /// Aggregate rankings ordered best first; ties keep pipeline order
    pub fn rankings_by_rank(&self) -> Vec<&AggregateRanking> {
        let mut sorted: Vec<&AggregateRanking> = self.aggregate_rankings.iter().collect();
        sorted.sort_by(|a, b| a.average_rank.total_cmp(&b.average_rank));
        sorted
    }

    pub fn ranking_for(&self, model: &str) -> Option<&AggregateRanking> {
        self.aggregate_rankings.iter().find(|r| r.model == model)
    }
}

/// Which pipeline stage an event or field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Independent responses
    Stage1,
    /// Anonymous peer ranking
    Stage2,
    /// Chairman synthesis
    Stage3,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Stage1 => write!(f, "stage1"),
            Stage::Stage2 => write!(f, "stage2"),
            Stage::Stage3 => write!(f, "stage3"),
        }
    }
}

/// In-flight flags, one per stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLoading {
    pub stage1: bool,
    pub stage2: bool,
    pub stage3: bool,
}

impl StageLoading {
    pub fn get(&self, stage: Stage) -> bool {
        match stage {
            Stage::Stage1 => self.stage1,
            Stage::Stage2 => self.stage2,
            Stage::Stage3 => self.stage3,
        }
    }

    pub fn set(&mut self, stage: Stage, value: bool) {
        match stage {
            Stage::Stage1 => self.stage1 = value,
            Stage::Stage2 => self.stage2 = value,
            Stage::Stage3 => self.stage3 = value,
        }
    }

    pub fn any(&self) -> bool {
        self.stage1 || self.stage2 || self.stage3
    }
}

/// Server-authoritative completion counters for one stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    pub completed: u32,
    pub total: u32,
    /// Set by a majority snapshot; sticky until the stage completes
    #[serde(default)]
    pub majority_reached: bool,
}

/// Progress for the two streamed stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub stage1: Option<StageProgress>,
    #[serde(default)]
    pub stage2: Option<StageProgress>,
}

impl Progress {
    pub fn get(&self, stage: Stage) -> Option<StageProgress> {
        match stage {
            Stage::Stage1 => self.stage1,
            Stage::Stage2 => self.stage2,
            Stage::Stage3 => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, stage: Stage) -> Option<&mut Option<StageProgress>> {
        match stage {
            Stage::Stage1 => Some(&mut self.stage1),
            Stage::Stage2 => Some(&mut self.stage2),
            Stage::Stage3 => None,
        }
    }
}

/// A user turn; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub content: String,
}

/// Accumulator for one three-stage council response
///
/// Stage fields are populated monotonically: once set they are only
/// replaced wholesale or patched one entry at a time, never cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub stage1: Option<Vec<ModelResult>>,
    #[serde(default)]
    pub stage2: Option<Vec<RankingResult>>,
    #[serde(default)]
    pub stage3: Option<FinalResult>,
    #[serde(default)]
    pub metadata: Option<TurnMetadata>,
    #[serde(default)]
    pub loading: StageLoading,
    #[serde(default)]
    pub progress: Progress,
    /// Seconds from submission to the end of the turn
    #[serde(default)]
    pub elapsed_running_time: Option<f64>,
    /// Stage 1 + stage 2 cost for the whole turn
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub web_search: bool,
    #[serde(default)]
    pub quick_mode: bool,
    #[serde(default)]
    pub coding_mode: bool,
}

impl AssistantMessage {
    /// Empty accumulator appended when a turn starts
    pub fn pending() -> Self {
        Self::default()
    }

    /// Stage-1 result for a model, if recorded
    pub fn stage1_for(&self, model: &str) -> Option<&ModelResult> {
        self.stage1.as_ref()?.iter().find(|r| r.model == model)
    }

    /// Whether every stage has produced its final data
    pub fn is_finished(&self) -> bool {
        self.stage3.is_some() && !self.loading.any()
    }

    /// Enabled run modes, in display order
    pub fn run_modes(&self) -> Vec<&'static str> {
        let mut modes = Vec::new();
        if self.web_search {
            modes.push("web search");
        }
        if self.quick_mode {
            modes.push("majority");
        }
        if self.coding_mode {
            modes.push("coding");
        }
        modes
    }
}

/// A conversation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User(UserMessage {
            content: content.into(),
        })
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Message::Assistant(message) => Some(message),
            Message::User(_) => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserMessage> {
        match self {
            Message::User(message) => Some(message),
            Message::Assistant(_) => None,
        }
    }
}

/// A conversation: an ordered list of turns plus display metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Accepts RFC 3339 and offset-less ISO 8601 timestamps (read as UTC)
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Conversation {
    /// Create an empty conversation with a fresh identifier
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), Utc::now())
    }

    /// Create an empty conversation with a fixed identity
    pub fn with_id(id: impl Into<ConversationId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            title: default_title(),
            messages: Vec::new(),
        }
    }

    /// Replace the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Whether the title is still the placeholder
    pub fn has_custom_title(&self) -> bool {
        !self.title.trim().is_empty() && self.title != DEFAULT_TITLE
    }

    /// Index of the most recent assistant message
    pub fn last_assistant_index(&self) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| matches!(m, Message::Assistant(_)))
    }

    pub fn assistant_at(&self, index: usize) -> Option<&AssistantMessage> {
        self.messages.get(index).and_then(Message::as_assistant)
    }

    /// The user message that prompted the assistant message at `index`
    pub fn question_for(&self, index: usize) -> Option<&str> {
        self.messages
            .get(..index)?
            .iter()
            .rev()
            .find_map(Message::as_user)
            .map(|m| m.content.as_str())
    }

    /// Metadata-only view, as shown in the conversation list
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            title: self.title.clone(),
            message_count: self.messages.len(),
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Conversation list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub message_count: usize,
}
