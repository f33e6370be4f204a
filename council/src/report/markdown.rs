//! Markdown report for one council turn

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::chart::{render_chart, ChartInput};
use crate::config::ViewConfig;
use crate::display::{
    deanonymize, resolve_ranking, short_model_name, Indicator, StatsComparator,
};
use crate::state::{AssistantMessage, ModelResult, TurnMetadata};

/// An ATX heading line: up to three spaces, then one to six `#`
static ATX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^( {0,3})(#{1,6})(\s|$)").expect("ATX_HEADING regex should compile")
});

/// Push every ATX heading down one level (`#` becomes `##`), capped at h6
///
/// Lines inside fenced code blocks are left alone.
pub fn shift_headings(markdown: &str) -> String {
    let mut fence: Option<&str> = None;
    let mut lines = Vec::new();

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        let marker = if trimmed.starts_with("```") {
            Some("```")
        } else if trimmed.starts_with("~~~") {
            Some("~~~")
        } else {
            None
        };

        match (fence, marker) {
            (None, Some(open)) => {
                fence = Some(open);
                lines.push(line.to_string());
                continue;
            }
            (Some(open), Some(close)) if open == close => {
                fence = None;
                lines.push(line.to_string());
                continue;
            }
            (Some(_), _) => {
                lines.push(line.to_string());
                continue;
            }
            (None, None) => {}
        }

        let shifted = ATX_HEADING.replace(line, |caps: &regex::Captures| {
            let hashes = &caps[2];
            let extra = if hashes.len() < 6 { "#" } else { "" };
            format!("{}{}{}{}", &caps[1], hashes, extra, &caps[3])
        });
        lines.push(shifted.into_owned());
    }

    lines.join("\n")
}

fn fmt_seconds(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}s"),
        _ => "n/a".to_string(),
    }
}

fn fmt_cost(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("${v:.4}"),
        _ => "n/a".to_string(),
    }
}

fn with_indicator(text: String, indicator: Option<Indicator>) -> String {
    match indicator {
        Some(indicator) => format!("{text} {} {indicator}", indicator.glyph()),
        None => text,
    }
}

/// Inputs for one report, borrowed from the conversation
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub title: &'a str,
    pub question: Option<&'a str>,
    pub message: &'a AssistantMessage,
    pub config: &'a ViewConfig,
}

/// Build the markdown document
///
/// Output depends only on the inputs: the same message renders to the same
/// bytes every time.
pub fn render_report(ctx: &ReportContext<'_>) -> String {
    let message = ctx.message;
    let empty = TurnMetadata::default();
    let metadata = message.metadata.as_ref().unwrap_or(&empty);
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# {}", ctx.title));
    lines.push(String::new());

    if let Some(question) = ctx.question {
        lines.push("## Question".to_string());
        lines.push(String::new());
        lines.push(question.trim_end().to_string());
        lines.push(String::new());
    }

    // Final answer
    lines.push("## Final Answer".to_string());
    lines.push(String::new());
    match &message.stage3 {
        Some(final_result) => {
            lines.push(format!(
                "**Chairman:** {} · Time: {} · Cost: {}",
                short_model_name(&final_result.model),
                fmt_seconds(final_result.elapsed_time),
                fmt_cost(final_result.cost),
            ));
            if final_result.custom_chairman_instructions {
                lines.push(String::new());
                lines.push("_Custom chairman instructions were used._".to_string());
            }
            lines.push(String::new());
            lines.push(shift_headings(&final_result.response));
        }
        None => lines.push("_No final answer was produced._".to_string()),
    }
    lines.push(String::new());

    // Run summary
    lines.push("## Run Summary".to_string());
    lines.push(String::new());
    lines.push(format!(
        "- Total time: {}",
        fmt_seconds(message.elapsed_running_time)
    ));
    lines.push(format!("- Total cost: {}", fmt_cost(message.total_cost)));
    let modes = message.run_modes();
    if !modes.is_empty() {
        lines.push(format!("- Modes: {}", modes.join(", ")));
    }
    lines.push(String::new());

    // Chart; a rendering failure drops the section, not the export
    if let Some(input) = ChartInput::from_turn(message) {
        match render_chart(&input, &ctx.config.chart) {
            Ok(image) => {
                lines.push("## Performance Chart".to_string());
                lines.push(String::new());
                lines.push(format!(
                    "![Average rank vs. total time and cost]({})",
                    image.to_data_uri()
                ));
                lines.push(String::new());
            }
            Err(e) => warn!(error = %e, "Chart rendering failed; exporting without it"),
        }
    }

    // Peer rankings
    if let Some(rankings) = message.stage2.as_ref().filter(|r| !r.is_empty()) {
        lines.push("## Peer Rankings".to_string());
        lines.push(String::new());
        for ranking in rankings {
            lines.push(format!("### {}", short_model_name(&ranking.model)));
            lines.push(String::new());
            lines.push(shift_headings(&deanonymize(
                &ranking.ranking,
                &metadata.label_to_model,
            )));
            lines.push(String::new());
            let resolved = resolve_ranking(&ranking.parsed_ranking, &metadata.label_to_model);
            if !resolved.is_empty() {
                let ordered: Vec<String> = resolved
                    .iter()
                    .enumerate()
                    .map(|(i, name)| format!("{}. {}", i + 1, name))
                    .collect();
                lines.push(format!("**Resolved ranking:** {}", ordered.join(", ")));
                lines.push(String::new());
            }
        }
    }

    // Per-model sections
    let thresholds = ctx.config.thresholds;
    let time_cmp = StatsComparator::from_values(
        metadata
            .aggregate_rankings
            .iter()
            .map(|r| r.total_elapsed_time),
        thresholds,
    );
    let cost_cmp = StatsComparator::from_values(
        metadata.aggregate_rankings.iter().map(|r| r.total_cost),
        thresholds,
    );

    let stage1: &[ModelResult] = message.stage1.as_deref().unwrap_or_default();
    let mut ordered_models: Vec<&str> = metadata
        .rankings_by_rank()
        .into_iter()
        .map(|r| r.model.as_str())
        .collect();
    for result in stage1 {
        if !ordered_models.contains(&result.model.as_str()) {
            ordered_models.push(&result.model);
        }
    }

    for model in ordered_models {
        lines.push(format!("## {}", model));
        lines.push(String::new());

        if let Some(aggregate) = metadata.ranking_for(model) {
            lines.push(format!(
                "- Average rank: {:.2} ({} votes)",
                aggregate.average_rank, aggregate.rankings_count
            ));
            lines.push(format!(
                "- Total time: {}",
                with_indicator(
                    fmt_seconds(aggregate.total_elapsed_time),
                    time_cmp.indicator(aggregate.total_elapsed_time)
                )
            ));
            lines.push(format!(
                "- Total cost: {}",
                with_indicator(
                    fmt_cost(aggregate.total_cost),
                    cost_cmp.indicator(aggregate.total_cost)
                )
            ));
        }

        match message.stage1_for(model) {
            Some(result) => {
                lines.push(format!(
                    "- Stage 1 time: {}",
                    fmt_seconds(result.elapsed_time)
                ));
                lines.push(format!(
                    "- Stage 1 cost: {}",
                    fmt_cost(result.effective_cost())
                ));
                lines.push(String::new());
                lines.push("### Response".to_string());
                lines.push(String::new());
                lines.push(shift_headings(&result.response));
            }
            None => {
                lines.push(String::new());
                lines.push("_No stage 1 response recorded._".to_string());
            }
        }
        lines.push(String::new());
    }

    let mut document = lines.join("\n");
    while document.ends_with("\n\n") {
        document.pop();
    }
    if !document.ends_with('\n') {
        document.push('\n');
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_headings_levels() {
        let input = "# Title\n## Sub\ntext # not a heading\n###### Deep\n   # indented\n#hashtag";
        let expected = "## Title\n### Sub\ntext # not a heading\n###### Deep\n   ## indented\n#hashtag";
        assert_eq!(shift_headings(input), expected);
    }

    #[test]
    fn test_shift_headings_skips_fenced_code() {
        let input = "# A\n```bash\n# comment\n~~~\n# still code\n```\n# B\n~~~\n# tilde code\n~~~";
        let expected =
            "## A\n```bash\n# comment\n~~~\n# still code\n```\n## B\n~~~\n# tilde code\n~~~";
        assert_eq!(shift_headings(input), expected);
    }

    #[test]
    fn test_bare_heading_marker() {
        assert_eq!(shift_headings("#"), "##");
    }

    #[test]
    fn test_indicator_suffix() {
        assert_eq!(
            with_indicator("1.00s".into(), Some(Indicator::Good)),
            "1.00s 🟢 good"
        );
        assert_eq!(with_indicator("n/a".into(), None), "n/a");
    }
}
