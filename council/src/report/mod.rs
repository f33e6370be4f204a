//! Report export
//!
//! Turns one finished assistant message into a standalone markdown
//! document with the chart embedded as a `data:` URI.

pub mod filename;
pub mod markdown;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ViewConfig;
use crate::state::Conversation;

pub use filename::export_filename;
pub use markdown::{render_report, shift_headings, ReportContext};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No assistant message at index {0}")]
    NoAssistantMessage(usize),

    #[error("Conversation {0} has no assistant messages")]
    EmptyConversation(String),

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// A downloadable export: suggested filename plus document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content: String,
}

impl ExportArtifact {
    /// Write into `dir` (created if needed) and return the full path
    pub fn write_to(&self, dir: &Path) -> ExportResult<PathBuf> {
        let path = dir.join(&self.filename);
        std::fs::create_dir_all(dir).map_err(|e| ExportError::FileWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;
        std::fs::write(&path, &self.content).map_err(|e| ExportError::FileWrite {
            path: path.clone(),
            source: e,
        })?;
        info!(path = %path.display(), bytes = self.content.len(), "Report written");
        Ok(path)
    }
}

/// Export the assistant message at `index`
pub fn export_turn(
    conversation: &Conversation,
    index: usize,
    config: &ViewConfig,
) -> ExportResult<ExportArtifact> {
    let message = conversation
        .assistant_at(index)
        .ok_or(ExportError::NoAssistantMessage(index))?;

    let title = if conversation.has_custom_title() {
        Some(conversation.title.as_str())
    } else {
        None
    };
    let filename = export_filename(title, &config.export);

    let ctx = ReportContext {
        title: title.unwrap_or("Council Report"),
        question: conversation.question_for(index),
        message,
        config,
    };
    Ok(ExportArtifact {
        filename,
        content: render_report(&ctx),
    })
}

/// Export the most recent assistant message
pub fn export_latest(conversation: &Conversation, config: &ViewConfig) -> ExportResult<ExportArtifact> {
    let index = conversation
        .last_assistant_index()
        .ok_or_else(|| ExportError::EmptyConversation(conversation.id.clone()))?;
    export_turn(conversation, index, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AssistantMessage, Message};
    use chrono::Utc;

    #[test]
    fn test_export_requires_assistant_message() {
        let mut conversation = Conversation::with_id("c", Utc::now());
        conversation.messages.push(Message::user("hello"));

        let config = ViewConfig::default();
        assert!(matches!(
            export_turn(&conversation, 0, &config),
            Err(ExportError::NoAssistantMessage(0))
        ));
        assert!(matches!(
            export_latest(&conversation, &config),
            Err(ExportError::EmptyConversation(id)) if id == "c"
        ));
    }

    #[test]
    fn test_untitled_conversation_uses_default_name() {
        let mut conversation = Conversation::with_id("c", Utc::now());
        conversation.messages.push(Message::user("hello"));
        conversation
            .messages
            .push(Message::Assistant(AssistantMessage::pending()));

        let artifact = export_latest(&conversation, &ViewConfig::default()).unwrap();
        assert_eq!(artifact.filename, "council-report.md");
        assert!(artifact.content.starts_with("# Council Report\n"));
        assert!(artifact.content.contains("## Question\n\nhello"));
    }

    #[test]
    fn test_write_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact {
            filename: "x.md".into(),
            content: "# x\n".into(),
        };
        let path = artifact.write_to(&dir.path().join("nested")).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# x\n");
    }
}
