//! Export filename derivation

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ExportConfig;
use crate::state::DEFAULT_TITLE;

/// Characters that are unsafe in filenames on at least one common platform
static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1f\x7f]"#).expect("UNSAFE_CHARS regex should compile")
});

/// Stem used when even the configured default sanitizes to nothing
const FALLBACK_STEM: &str = "council-report";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN regex should compile"));

/// Derive `<stem>.<extension>` from a conversation title
///
/// Unsafe characters are stripped, whitespace runs become a single `_`,
/// and the stem is capped at `max_filename_len` characters. A missing,
/// placeholder or fully stripped title falls back to `default_filename`.
pub fn export_filename(title: Option<&str>, config: &ExportConfig) -> String {
    let stem = title
        .filter(|t| *t != DEFAULT_TITLE)
        .map(|t| sanitize_stem(t, config.max_filename_len))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            let stem = sanitize_stem(&config.default_filename, config.max_filename_len);
            if stem.is_empty() {
                FALLBACK_STEM.to_string()
            } else {
                stem
            }
        });

    let extension = config.extension.trim_start_matches('.');
    if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    }
}

pub(crate) fn sanitize_stem(raw: &str, max_len: usize) -> String {
    let stripped = UNSAFE_CHARS.replace_all(raw, "");
    let collapsed = WHITESPACE_RUN.replace_all(stripped.trim(), "_");
    let capped: String = collapsed.chars().take(max_len).collect();
    capped
        .trim_start_matches(['.', '_'])
        .trim_end_matches(['.', '_'])
        .to_string()
}
