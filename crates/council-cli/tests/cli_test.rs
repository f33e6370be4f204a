//! Drives the `council-view` binary against captures on disk.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn council_view(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_council-view"))
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("COUNCIL_VIEW_CONFIG")
        .output()
        .expect("binary should run")
}

/// Helper: a short single-model turn in SSE form.
fn write_capture(dir: &Path, terminated: bool) -> String {
    let mut frames = vec![
        r#"{"type":"stage1_start"}"#.to_string(),
        r#"{"type":"stage1_complete","data":[{"model":"a/solo","response":"Use a ring buffer.","elapsed_time":2.5,"cost":0.002}]}"#.to_string(),
        r#"{"type":"stage2_start"}"#.to_string(),
        r#"{"type":"stage2_complete","data":[{"model":"a/solo","ranking":"FINAL RANKING:\n1. Response A","parsed_ranking":["Response A"]}],"metadata":{"label_to_model":{"Response A":"a/solo"},"aggregate_rankings":[{"model":"a/solo","average_rank":1.0,"rankings_count":1,"total_elapsed_time":4.0,"total_cost":0.003}]}}"#.to_string(),
        r#"{"type":"stage3_start"}"#.to_string(),
        r#"{"type":"stage3_complete","data":{"model":"a/chair","response":"Ring buffer."}}"#.to_string(),
        r#"{"type":"title_complete","data":{"title":"Bounded queues"}}"#.to_string(),
    ];
    if terminated {
        frames.push(r#"{"type":"complete"}"#.to_string());
    }

    let text: String = frames.iter().map(|f| format!("data: {f}\n\n")).collect();
    let path = dir.join(if terminated { "turn.sse" } else { "cut.sse" });
    fs::write(&path, text).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_replay_prints_summary_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), true);
    let out_dir = dir.path().join("reports");

    let output = council_view(&["replay", &capture, "--export", out_dir.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Conversation: Bounded queues"));
    assert!(stdout.contains("Phase: completed"));
    assert!(stdout.contains("#1 a/solo"));

    let report = fs::read_to_string(out_dir.join("Bounded_queues.md")).unwrap();
    assert!(report.starts_with("# Bounded queues\n"));
    assert!(report.contains("## Question\n\nReplayed turn"));
}

#[test]
fn test_unterminated_capture_fails() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), false);

    let output = council_view(&["replay", &capture]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ended before the turn finished"));
}

#[test]
fn test_chart_writes_svg() {
    let dir = tempfile::tempdir().unwrap();
    let capture = write_capture(dir.path(), true);
    let out = dir.path().join("chart.svg");

    let output = council_view(&["chart", &capture, "--out", out.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(fs::read_to_string(&out).unwrap().starts_with("<svg"));
}

#[test]
fn test_stats_on_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = council_view(&["stats", dir.path().to_str().unwrap()]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Conversations analyzed: 0"));
}
