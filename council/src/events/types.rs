//! Event types for the council progress stream
//!
//! One variant per event the pipeline emits, each with a statically
//! checked payload. The JSON tag field is `type`.

use serde::{Deserialize, Serialize};

use crate::state::{FinalResult, ModelName, ModelResult, RankingResult, Stage, TurnMetadata};

/// Turn-level timing and cost totals, plus the run modes the turn used
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    #[serde(default)]
    pub elapsed_running_time: Option<f64>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    #[serde(default)]
    pub web_search: bool,
    #[serde(default)]
    pub quick_mode: bool,
    #[serde(default)]
    pub coding_mode: bool,
}

/// Generated conversation title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleUpdate {
    pub title: String,
}

/// All council stream events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Stage 1 requests were dispatched
    Stage1Start,

    /// One council member answered
    Stage1ModelComplete {
        model: ModelName,
        response: ModelResult,
        completed: u32,
        total: u32,
    },

    /// One council member failed to answer
    Stage1ModelFailed {
        model: ModelName,
        completed: u32,
        total: u32,
    },

    /// Enough members answered to move on early
    Stage1Majority {
        data: Vec<ModelResult>,
        completed: u32,
        total: u32,
    },

    /// Final stage 1 snapshot
    Stage1Complete { data: Vec<ModelResult> },

    /// Peer ranking started
    Stage2Start,

    /// One reviewer returned its ranking
    Stage2ModelComplete {
        model: ModelName,
        response: RankingResult,
        completed: u32,
        total: u32,
    },

    /// One reviewer failed
    Stage2ModelFailed {
        model: ModelName,
        completed: u32,
        total: u32,
    },

    /// Enough reviewers answered to move on early
    Stage2Majority {
        data: Vec<RankingResult>,
        #[serde(default)]
        metadata: Option<TurnMetadata>,
        completed: u32,
        total: u32,
    },

    /// Final stage 2 snapshot with label map and aggregate rankings
    Stage2Complete {
        data: Vec<RankingResult>,
        #[serde(default)]
        metadata: Option<TurnMetadata>,
    },

    /// Chairman synthesis started
    Stage3Start,

    /// Chairman synthesis finished
    Stage3Complete { data: FinalResult },

    /// Turn-level timing and cost
    TimingComplete { data: TimingSummary },

    /// Conversation title was generated
    TitleComplete { data: TitleUpdate },

    /// Terminal event for a successful turn
    Complete,

    /// Terminal event for an aborted turn
    Error { message: String },
}

impl StreamEvent {
    /// Every tag the decoder accepts
    pub const KNOWN_TYPES: &'static [&'static str] = &[
        "stage1_start",
        "stage1_model_complete",
        "stage1_model_failed",
        "stage1_majority",
        "stage1_complete",
        "stage2_start",
        "stage2_model_complete",
        "stage2_model_failed",
        "stage2_majority",
        "stage2_complete",
        "stage3_start",
        "stage3_complete",
        "timing_complete",
        "title_complete",
        "complete",
        "error",
    ];

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Stage1Start => "stage1_start",
            StreamEvent::Stage1ModelComplete { .. } => "stage1_model_complete",
            StreamEvent::Stage1ModelFailed { .. } => "stage1_model_failed",
            StreamEvent::Stage1Majority { .. } => "stage1_majority",
            StreamEvent::Stage1Complete { .. } => "stage1_complete",
            StreamEvent::Stage2Start => "stage2_start",
            StreamEvent::Stage2ModelComplete { .. } => "stage2_model_complete",
            StreamEvent::Stage2ModelFailed { .. } => "stage2_model_failed",
            StreamEvent::Stage2Majority { .. } => "stage2_majority",
            StreamEvent::Stage2Complete { .. } => "stage2_complete",
            StreamEvent::Stage3Start => "stage3_start",
            StreamEvent::Stage3Complete { .. } => "stage3_complete",
            StreamEvent::TimingComplete { .. } => "timing_complete",
            StreamEvent::TitleComplete { .. } => "title_complete",
            StreamEvent::Complete => "complete",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Get the stage if this event is stage-scoped
    pub fn stage(&self) -> Option<Stage> {
        match self {
            StreamEvent::Stage1Start
            | StreamEvent::Stage1ModelComplete { .. }
            | StreamEvent::Stage1ModelFailed { .. }
            | StreamEvent::Stage1Majority { .. }
            | StreamEvent::Stage1Complete { .. } => Some(Stage::Stage1),
            StreamEvent::Stage2Start
            | StreamEvent::Stage2ModelComplete { .. }
            | StreamEvent::Stage2ModelFailed { .. }
            | StreamEvent::Stage2Majority { .. }
            | StreamEvent::Stage2Complete { .. } => Some(Stage::Stage2),
            StreamEvent::Stage3Start | StreamEvent::Stage3Complete { .. } => Some(Stage::Stage3),
            _ => None,
        }
    }

    /// Get the model if this event concerns a single model
    pub fn model(&self) -> Option<&str> {
        match self {
            StreamEvent::Stage1ModelComplete { model, .. }
            | StreamEvent::Stage1ModelFailed { model, .. }
            | StreamEvent::Stage2ModelComplete { model, .. }
            | StreamEvent::Stage2ModelFailed { model, .. } => Some(model),
            _ => None,
        }
    }

    /// Whether this event ends the turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete | StreamEvent::Error { .. })
    }

    /// Whether this event updates conversation-level rather than message state
    pub fn is_turn_level(&self) -> bool {
        matches!(
            self,
            StreamEvent::TitleComplete { .. } | StreamEvent::Complete | StreamEvent::Error { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = StreamEvent::Stage1ModelFailed {
            model: "x-ai/grok-4".to_string(),
            completed: 2,
            total: 4,
        };

        let json = serde_json::to_string(&event).unwrap();
        let parsed: StreamEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.event_type(), "stage1_model_failed");
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_unit_variant_tags() {
        let parsed: StreamEvent = serde_json::from_str(r#"{"type": "stage2_start"}"#).unwrap();
        assert_eq!(parsed, StreamEvent::Stage2Start);

        let parsed: StreamEvent = serde_json::from_str(r#"{"type": "complete"}"#).unwrap();
        assert!(parsed.is_terminal());
    }

    #[test]
    fn test_known_types_match_variants() {
        for tag in StreamEvent::KNOWN_TYPES {
            let json = match *tag {
                "stage1_model_complete" => format!(
                    r#"{{"type":"{tag}","model":"a/b","response":{{"model":"a/b","response":"r"}},"completed":1,"total":2}}"#
                ),
                "stage2_model_complete" => format!(
                    r#"{{"type":"{tag}","model":"a/b","response":{{"model":"a/b","ranking":"r"}},"completed":1,"total":2}}"#
                ),
                "stage1_model_failed" | "stage2_model_failed" => {
                    format!(r#"{{"type":"{tag}","model":"a/b","completed":1,"total":2}}"#)
                }
                "stage1_majority" | "stage2_majority" => {
                    format!(r#"{{"type":"{tag}","data":[],"completed":1,"total":2}}"#)
                }
                "stage1_complete" | "stage2_complete" => format!(r#"{{"type":"{tag}","data":[]}}"#),
                "stage3_complete" => {
                    format!(r#"{{"type":"{tag}","data":{{"model":"a/b","response":"r"}}}}"#)
                }
                "timing_complete" => format!(r#"{{"type":"{tag}","data":{{}}}}"#),
                "title_complete" => format!(r#"{{"type":"{tag}","data":{{"title":"t"}}}}"#),
                "error" => format!(r#"{{"type":"{tag}","message":"boom"}}"#),
                _ => format!(r#"{{"type":"{tag}"}}"#),
            };
            let parsed: StreamEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed.event_type(), *tag);
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = StreamEvent::Stage2ModelFailed {
            model: "openai/gpt-5.1".to_string(),
            completed: 1,
            total: 3,
        };

        assert_eq!(event.stage(), Some(Stage::Stage2));
        assert_eq!(event.model(), Some("openai/gpt-5.1"));
        assert!(!event.is_turn_level());

        let title = StreamEvent::TitleComplete {
            data: TitleUpdate {
                title: "Rust ownership".to_string(),
            },
        };
        assert_eq!(title.stage(), None);
        assert!(title.is_turn_level());
    }
}
