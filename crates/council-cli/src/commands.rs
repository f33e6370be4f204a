//! Subcommand implementations

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use council::analytics::{build_rows, chart_input, compute_stats, format_table, load_conversations};
use council::config::ChartConfig;
use council::report::export_latest;
use council::state::{AssistantMessage, Stage};
use council::{render_chart, replay, ChartInput, Conversation, Effect, TurnPhase, ViewConfig, ViewState};
use tracing::{info, warn};

use crate::capture::read_capture;

/// Replay a capture into a fresh conversation
///
/// A capture that stops before `complete`/`error` is a transport failure:
/// the optimistic turn is rolled back and an error returned.
pub async fn replay_capture(
    source: &Path,
    question: &str,
    title: Option<&str>,
) -> Result<(ViewState, Vec<Effect>)> {
    let capture = read_capture(source).await?;

    let mut conversation = Conversation::new();
    if let Some(title) = title {
        conversation = conversation.with_title(title);
    }
    let state = ViewState::new(conversation).begin_turn(question)?;
    let (state, effects) = replay(state, capture.events.iter());

    if state.phase == TurnPhase::Streaming {
        let state = state.rollback();
        bail!(
            "Capture {} ended before the turn finished ({} events, {} rejected); rolled back to {} messages",
            source.display(),
            capture.events.len(),
            capture.rejected,
            state.conversation.messages.len()
        );
    }

    info!(
        events = capture.events.len(),
        rejected = capture.rejected,
        phase = %state.phase,
        "Capture replayed"
    );
    Ok((state, effects))
}

// ── replay ──────────────────────────────────────────────────────────

pub struct ReplayArgs<'a> {
    pub source: &'a Path,
    pub question: &'a str,
    pub title: Option<&'a str>,
    pub export_dir: Option<&'a Path>,
    pub json: bool,
}

pub async fn run_replay(args: ReplayArgs<'_>, config: &ViewConfig) -> Result<()> {
    let (state, effects) = replay_capture(args.source, args.question, args.title).await?;

    for effect in &effects {
        if let Effect::ShowError { message } = effect {
            warn!(error = %message, "Turn ended with an error");
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("{}", format_summary(&state));
    }

    if let Some(dir) = args.export_dir {
        let artifact = export_latest(&state.conversation, config)?;
        let path = artifact.write_to(dir)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn stage_line(message: &AssistantMessage, stage: Stage, produced: Option<usize>) -> String {
    let progress = match message.progress.get(stage) {
        Some(p) => {
            let majority = if p.majority_reached { " (majority)" } else { "" };
            format!("{}/{}{}", p.completed, p.total, majority)
        }
        None => "-".to_string(),
    };
    let results = produced.map_or_else(|| "none".to_string(), |n| n.to_string());
    let loading = if message.loading.get(stage) { " [loading]" } else { "" };
    format!("  {stage}: progress {progress}, results {results}{loading}")
}

/// Human-readable summary of a replayed turn
pub fn format_summary(state: &ViewState) -> String {
    let mut lines = vec![
        format!("Conversation: {}", state.conversation.title),
        format!("Phase: {}", state.phase),
    ];
    if let Some(error) = &state.last_error {
        lines.push(format!("Error: {}", error));
    }

    let Some(message) = state.current_message() else {
        lines.push("No assistant message".to_string());
        return lines.join("\n");
    };

    lines.push(stage_line(
        message,
        Stage::Stage1,
        message.stage1.as_ref().map(Vec::len),
    ));
    lines.push(stage_line(
        message,
        Stage::Stage2,
        message.stage2.as_ref().map(Vec::len),
    ));
    lines.push(stage_line(
        message,
        Stage::Stage3,
        message.stage3.as_ref().map(|_| 1),
    ));

    if let Some(metadata) = &message.metadata {
        for (position, aggregate) in metadata.rankings_by_rank().into_iter().enumerate() {
            lines.push(format!(
                "  #{} {} (avg rank {:.2}, {} votes)",
                position + 1,
                aggregate.model,
                aggregate.average_rank,
                aggregate.rankings_count
            ));
        }
    }
    if let Some(elapsed) = message.elapsed_running_time {
        lines.push(format!("Total time: {:.2}s", elapsed));
    }
    if let Some(cost) = message.total_cost {
        lines.push(format!("Total cost: ${:.4}", cost));
    }
    let modes = message.run_modes();
    if !modes.is_empty() {
        lines.push(format!("Modes: {}", modes.join(", ")));
    }
    lines.join("\n")
}

// ── chart ───────────────────────────────────────────────────────────

/// Output format picked from the file extension
fn wants_png(out: &Path) -> Result<bool> {
    match out.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => Ok(true),
        Some(ext) if ext.eq_ignore_ascii_case("svg") => Ok(false),
        _ => bail!("Chart output must end in .png or .svg: {}", out.display()),
    }
}

fn write_chart(input: &ChartInput, config: &ChartConfig, out: &Path) -> Result<PathBuf> {
    let png = wants_png(out)?;
    let config = ChartConfig {
        embed_png: png,
        ..config.clone()
    };
    let image = render_chart(input, &config)?;

    let bytes = match image.png {
        Some(bytes) if png => bytes,
        _ => image.svg.into_bytes(),
    };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(out, &bytes).with_context(|| format!("Failed to write {}", out.display()))?;
    info!(path = %out.display(), bytes = bytes.len(), "Chart written");
    Ok(out.to_path_buf())
}

pub async fn run_chart(source: &Path, out: &Path, config: &ViewConfig) -> Result<()> {
    wants_png(out)?;
    let (state, _) = replay_capture(source, "Replayed turn", None).await?;
    let message = state
        .current_message()
        .context("Replay produced no assistant message")?;
    let input = ChartInput::from_turn(message)
        .context("Turn has no aggregate rankings or stage 1 results to chart")?;

    let path = write_chart(&input, &config.chart, out)?;
    println!("Chart written to {}", path.display());
    Ok(())
}

// ── stats ───────────────────────────────────────────────────────────

pub fn run_stats(dir: &Path, chart: Option<&Path>, config: &ViewConfig) -> Result<()> {
    let conversations = load_conversations(dir)?;
    let summary = compute_stats(&conversations);
    let rows = build_rows(&summary);

    println!("Conversations analyzed: {}", summary.conversations);
    println!("{}", format_table(&rows));

    if let Some(out) = chart {
        let input = chart_input(&rows);
        if input.points.is_empty() {
            warn!("No model has a percentile rank; skipping chart");
        } else {
            let path = write_chart(&input, &config.chart, out)?;
            println!("Chart written to {}", path.display());
        }
    }
    Ok(())
}
