//! Per-model statistics across saved conversations
//!
//! For every assistant message with stage-1 data:
//!
//! - **Percentile rank**: `(rank - 1) / (n - 1) * 100`, 0 = best. Taken
//!   from aggregate rankings (weighted by vote count) or, when those are
//!   absent, from each stage-2 parsed ranking.
//! - **Normalized delay**: stage-1 elapsed time over the fastest model in
//!   the same message.
//! - **Cost**: stage-1 cost per response.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{AnalyticsError, AnalyticsResult};
use crate::state::{AssistantMessage, Conversation, ModelResult};

/// Percentile position of a rank among `total` entries
pub fn percentile(rank: f64, total: usize) -> f64 {
    if total <= 1 {
        return 0.0;
    }
    (rank - 1.0) / (total as f64 - 1.0) * 100.0
}

/// Stage-1 cost as billed: usage block first, then the result's own field
pub fn stage1_cost(result: &ModelResult) -> Option<f64> {
    result
        .usage
        .as_ref()
        .and_then(|usage| usage.cost.or(usage.upstream_inference_cost))
        .or(result.cost)
}

/// Load one saved conversation
pub fn load_conversation(path: &Path) -> AnalyticsResult<Conversation> {
    let data = std::fs::read_to_string(path).map_err(|e| AnalyticsError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&data).map_err(|e| AnalyticsError::JsonParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load every `*.json` conversation in `dir`, in filename order
///
/// Unreadable or malformed files are skipped with a warning.
pub fn load_conversations(dir: &Path) -> AnalyticsResult<Vec<Conversation>> {
    if !dir.is_dir() {
        return Err(AnalyticsError::NotADirectory(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir).map_err(|e| AnalyticsError::DirRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut conversations = Vec::with_capacity(paths.len());
    for path in paths {
        match load_conversation(&path) {
            Ok(conversation) => conversations.push(conversation),
            Err(e) => warn!(error = %e, "Skipping conversation file"),
        }
    }
    debug!(dir = %dir.display(), count = conversations.len(), "Loaded conversations");
    Ok(conversations)
}

/// Running sums for one model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub pct_sum: f64,
    pub pct_count: u32,
    pub delay_sum: f64,
    pub delay_count: u32,
    pub cost_sum: f64,
    pub cost_count: u32,
}

fn mean(sum: f64, count: u32) -> Option<f64> {
    (count > 0).then(|| sum / f64::from(count))
}

impl ModelStats {
    pub fn avg_percentile(&self) -> Option<f64> {
        mean(self.pct_sum, self.pct_count)
    }

    pub fn avg_delay(&self) -> Option<f64> {
        mean(self.delay_sum, self.delay_count)
    }

    pub fn avg_cost(&self) -> Option<f64> {
        mean(self.cost_sum, self.cost_count)
    }
}

/// Accumulated statistics for a set of conversations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub models: BTreeMap<String, ModelStats>,
    pub conversations: usize,
}

/// Weighted percentile sums per model for one message
fn collect_percentiles(message: &AssistantMessage) -> BTreeMap<String, (f64, u32)> {
    let mut percentiles = BTreeMap::new();
    let Some(metadata) = message.metadata.as_ref() else {
        return percentiles;
    };
    let label_count = metadata.label_to_model.len();

    if !metadata.aggregate_rankings.is_empty() {
        let n = if label_count > 0 {
            label_count
        } else {
            metadata.aggregate_rankings.len()
        };
        for entry in &metadata.aggregate_rankings {
            if entry.model.is_empty() || !entry.average_rank.is_finite() {
                continue;
            }
            let count = entry.rankings_count.max(1);
            let pct = percentile(entry.average_rank, n);
            percentiles.insert(entry.model.clone(), (pct * f64::from(count), count));
        }
        return percentiles;
    }

    for ranking in message.stage2.iter().flatten() {
        let n = if label_count > 0 {
            label_count
        } else {
            ranking.parsed_ranking.len()
        };
        for (index, label) in ranking.parsed_ranking.iter().enumerate() {
            let Some(model) = metadata.label_to_model.get(label) else {
                continue;
            };
            let slot = percentiles.entry(model.clone()).or_insert((0.0, 0));
            slot.0 += percentile(index as f64 + 1.0, n);
            slot.1 += 1;
        }
    }
    percentiles
}

fn accumulate_message(models: &mut BTreeMap<String, ModelStats>, message: &AssistantMessage) {
    let Some(stage1) = message.stage1.as_ref().filter(|s| !s.is_empty()) else {
        return;
    };

    let fastest = stage1
        .iter()
        .filter(|r| !r.model.is_empty())
        .filter_map(|r| r.elapsed_time)
        .reduce(f64::min);

    for result in stage1 {
        if result.model.is_empty() {
            continue;
        }
        let stats = models.entry(result.model.clone()).or_default();

        if let Some(cost) = stage1_cost(result) {
            stats.cost_sum += cost;
            stats.cost_count += 1;
        }
        if let (Some(fastest), Some(elapsed)) = (fastest, result.elapsed_time) {
            if fastest > 0.0 {
                stats.delay_sum += elapsed / fastest;
                stats.delay_count += 1;
            }
        }
    }

    for (model, (pct_sum, pct_count)) in collect_percentiles(message) {
        if pct_count == 0 {
            continue;
        }
        let stats = models.entry(model).or_default();
        stats.pct_sum += pct_sum;
        stats.pct_count += pct_count;
    }
}

/// Fold every assistant message of every conversation into per-model sums
pub fn compute_stats(conversations: &[Conversation]) -> StatsSummary {
    let mut models = BTreeMap::new();
    for conversation in conversations {
        for message in conversation.messages.iter().filter_map(|m| m.as_assistant()) {
            accumulate_message(&mut models, message);
        }
    }
    StatsSummary {
        models,
        conversations: conversations.len(),
    }
}

/// One table row; `avg_cost` is in currency units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRow {
    pub model: String,
    pub avg_percentile: Option<f64>,
    pub norm_delay: Option<f64>,
    pub avg_cost: Option<f64>,
}

/// Rows sorted by average percentile (missing last), then model name
pub fn build_rows(summary: &StatsSummary) -> Vec<StatsRow> {
    let mut rows: Vec<StatsRow> = summary
        .models
        .iter()
        .map(|(model, stats)| StatsRow {
            model: model.clone(),
            avg_percentile: stats.avg_percentile(),
            norm_delay: stats.avg_delay(),
            avg_cost: stats.avg_cost(),
        })
        .collect();

    rows.sort_by(|a, b| {
        let a_pct = a.avg_percentile.unwrap_or(f64::INFINITY);
        let b_pct = b.avg_percentile.unwrap_or(f64::INFINITY);
        a_pct.total_cmp(&b_pct).then_with(|| a.model.cmp(&b.model))
    });
    rows
}
