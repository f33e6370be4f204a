//! Message reducer: one stream event in, one updated assistant message out
//!
//! The reducer is a pure function over an owned value. It performs no I/O
//! and relies on only one ordering guarantee: events for a stage precede
//! that stage's `*_complete`. Per-model events may arrive in any order and
//! may repeat.

use tracing::{debug, trace};

use crate::events::StreamEvent;
use crate::state::{
    AssistantMessage, ModelResult, RankingResult, Stage, StageProgress, TurnMetadata,
};

/// An entry in a per-model stage sequence
pub trait StageEntry {
    fn model(&self) -> &str;
}

impl StageEntry for ModelResult {
    fn model(&self) -> &str {
        &self.model
    }
}

impl StageEntry for RankingResult {
    fn model(&self) -> &str {
        &self.model
    }
}

/// Replace the entry for the same model in place, or append it
///
/// Existing entries never move, so a late duplicate does not reorder the
/// sequence.
pub fn upsert<T: StageEntry>(entries: Option<Vec<T>>, entry: T) -> Vec<T> {
    let mut entries = entries.unwrap_or_default();
    match entries.iter().position(|e| e.model() == entry.model()) {
        Some(index) => entries[index] = entry,
        None => entries.push(entry),
    }
    entries
}

/// Apply one event to an assistant message
///
/// Turn-level events (`title_complete`, `complete`, `error`) leave the
/// message untouched; the turn reducer owns them.
pub fn reduce(mut message: AssistantMessage, event: &StreamEvent) -> AssistantMessage {
    trace!(event = event.event_type(), "Reducing event");

    match event {
        StreamEvent::Stage1Start => message.loading.stage1 = true,
        StreamEvent::Stage2Start => message.loading.stage2 = true,
        StreamEvent::Stage3Start => message.loading.stage3 = true,

        StreamEvent::Stage1ModelComplete {
            response,
            completed,
            total,
            ..
        } => {
            message.stage1 = Some(upsert(message.stage1.take(), response.clone()));
            record_counts(&mut message, Stage::Stage1, *completed, *total);
        }
        StreamEvent::Stage2ModelComplete {
            response,
            completed,
            total,
            ..
        } => {
            message.stage2 = Some(upsert(message.stage2.take(), response.clone()));
            record_counts(&mut message, Stage::Stage2, *completed, *total);
        }

        StreamEvent::Stage1ModelFailed {
            model,
            completed,
            total,
        }
        | StreamEvent::Stage2ModelFailed {
            model,
            completed,
            total,
        } => {
            debug!(model = %model, completed, total, "Model failed; counters only");
            if let Some(stage) = event.stage() {
                record_counts(&mut message, stage, *completed, *total);
            }
        }

        StreamEvent::Stage1Majority {
            data,
            completed,
            total,
        } => {
            message.stage1 = Some(data.clone());
            record_majority(&mut message, Stage::Stage1, *completed, *total);
        }
        StreamEvent::Stage2Majority {
            data,
            metadata,
            completed,
            total,
        } => {
            message.stage2 = Some(data.clone());
            record_metadata(&mut message, metadata.as_ref());
            record_majority(&mut message, Stage::Stage2, *completed, *total);
        }

        StreamEvent::Stage1Complete { data } => {
            message.stage1 = Some(data.clone());
            message.loading.stage1 = false;
            settle_progress(&mut message, Stage::Stage1);
        }
        StreamEvent::Stage2Complete { data, metadata } => {
            message.stage2 = Some(data.clone());
            record_metadata(&mut message, metadata.as_ref());
            message.loading.stage2 = false;
            settle_progress(&mut message, Stage::Stage2);
        }
        StreamEvent::Stage3Complete { data } => {
            message.stage3 = Some(data.clone());
            message.loading.stage3 = false;
        }

        StreamEvent::TimingComplete { data } => {
            message.elapsed_running_time = data.elapsed_running_time;
            message.total_cost = data.total_cost;
            message.web_search = data.web_search;
            message.quick_mode = data.quick_mode;
            message.coding_mode = data.coding_mode;
        }

        StreamEvent::TitleComplete { .. } | StreamEvent::Complete | StreamEvent::Error { .. } => {
            trace!(event = event.event_type(), "Turn-level event; message unchanged");
        }
    }

    message
}

/// Counters come from the server; they are never recomputed locally.
/// A majority flag already set stays set.
fn record_counts(message: &mut AssistantMessage, stage: Stage, completed: u32, total: u32) {
    if let Some(slot) = message.progress.slot_mut(stage) {
        let majority_reached = slot.map(|p| p.majority_reached).unwrap_or(false);
        *slot = Some(StageProgress {
            completed,
            total,
            majority_reached,
        });
    }
}

fn record_majority(message: &mut AssistantMessage, stage: Stage, completed: u32, total: u32) {
    if let Some(slot) = message.progress.slot_mut(stage) {
        *slot = Some(StageProgress {
            completed,
            total,
            majority_reached: true,
        });
    }
}

/// The full snapshot supersedes the majority one: counters close out and
/// the majority flag is released.
fn settle_progress(message: &mut AssistantMessage, stage: Stage) {
    if let Some(Some(progress)) = message.progress.slot_mut(stage) {
        progress.completed = progress.total.max(progress.completed);
        progress.majority_reached = false;
    }
}

fn record_metadata(message: &mut AssistantMessage, metadata: Option<&TurnMetadata>) {
    if let Some(metadata) = metadata {
        message.metadata = Some(metadata.clone());
    }
}
