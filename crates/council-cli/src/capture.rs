//! Reading captured event streams from a file or stdin

use std::path::Path;

use anyhow::{Context, Result};
use council::{StreamDecoder, StreamEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// Decoded events plus how many frames were rejected
#[derive(Debug, Default)]
pub struct Capture {
    pub events: Vec<StreamEvent>,
    pub rejected: usize,
}

impl Capture {
    /// Whether the stream reached `complete` or `error`
    pub fn is_terminated(&self) -> bool {
        self.events.last().is_some_and(StreamEvent::is_terminal)
    }
}

/// Read a capture; `-` means stdin
pub async fn read_capture(source: &Path) -> Result<Capture> {
    if source == Path::new("-") {
        debug!("Reading capture from stdin");
        let reader = BufReader::new(tokio::io::stdin());
        return decode_lines(reader).await;
    }

    let file = tokio::fs::File::open(source)
        .await
        .with_context(|| format!("Failed to open capture {}", source.display()))?;
    decode_lines(BufReader::new(file))
        .await
        .with_context(|| format!("Failed to read capture {}", source.display()))
}

/// Feed a line-oriented reader through the frame decoder
///
/// Bad frames are logged and counted; they never stop the replay.
pub async fn decode_lines<R>(reader: R) -> Result<Capture>
where
    R: AsyncBufRead + Unpin,
{
    let mut decoder = StreamDecoder::new();
    let mut capture = Capture::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        collect(&mut capture, decoder.push(&format!("{line}\n")));
    }
    collect(&mut capture, decoder.finish());

    debug!(
        frames = decoder.frames_seen(),
        events = capture.events.len(),
        rejected = capture.rejected,
        "Capture decoded"
    );
    Ok(capture)
}

fn collect(capture: &mut Capture, decoded: Vec<council::events::DecodeResult<StreamEvent>>) {
    for result in decoded {
        match result {
            Ok(event) => capture.events.push(event),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable frame");
                capture.rejected += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decode_lines_counts_rejections() {
        let text = "data: {\"type\":\"stage1_start\"}\n\n\
                    data: {\"type\":\"mystery\"}\n\n\
                    : keep-alive\n\n\
                    data: {\"type\":\"complete\"}\n\n";
        let capture = decode_lines(text.as_bytes()).await.unwrap();

        assert_eq!(capture.events.len(), 2);
        assert_eq!(capture.rejected, 1);
        assert!(capture.is_terminated());
    }

    #[tokio::test]
    async fn test_unterminated_capture() {
        let text = "{\"type\":\"stage1_start\"}\n{\"type\":\"stage2_start\"}";
        let capture = decode_lines(text.as_bytes()).await.unwrap();

        assert_eq!(capture.events.len(), 2);
        assert!(!capture.is_terminated());
    }
}
