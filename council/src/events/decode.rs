//! Frame decoding for the council event stream
//!
//! The pipeline sends server-sent-event frames (`data: {...}` followed by a
//! blank line). Newline-delimited JSON is also accepted: a line that starts
//! with `{` is treated as a complete frame on its own.

use serde_json::Value;
use tracing::debug;

use super::types::StreamEvent;

/// Error type for frame decoding
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed event JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event is missing its `type` tag")]
    MissingType,

    #[error("Unknown event type: {0}")]
    UnknownEvent(String),

    #[error("Invalid payload for {event_type}: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for decoding operations
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Decode one JSON event payload
///
/// The tag is checked against the known set before the payload is read, so
/// an unrecognized event is rejected instead of half-parsed.
pub fn decode_event(payload: &str) -> DecodeResult<StreamEvent> {
    let value: Value = serde_json::from_str(payload)?;
    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?
        .to_string();

    if !StreamEvent::KNOWN_TYPES.contains(&event_type.as_str()) {
        return Err(DecodeError::UnknownEvent(event_type));
    }

    serde_json::from_value(value).map_err(|source| DecodeError::Payload { event_type, source })
}

/// Decode a single frame (its lines, without the terminating blank line)
///
/// Returns `Ok(None)` for frames that carry no data, such as keep-alive
/// comments.
pub fn decode_frame(frame: &str) -> DecodeResult<Option<StreamEvent>> {
    let mut data = String::new();
    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        } else if line.trim_start().starts_with('{') {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(line.trim());
        }
        // Comments (`:`) and `event:`/`id:`/`retry:` fields carry nothing we use
    }

    if data.trim().is_empty() {
        return Ok(None);
    }
    decode_event(&data).map(Some)
}

/// Incremental decoder fed with arbitrary chunks of stream text
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Text after the last complete line
    partial: String,
    /// Lines of the frame currently being assembled
    frame: Vec<String>,
    frames_seen: u64,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty frames decoded so far
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Feed a chunk, returning every frame it completed
    pub fn push(&mut self, chunk: &str) -> Vec<DecodeResult<StreamEvent>> {
        self.partial.push_str(chunk);

        let mut decoded = Vec::new();
        while let Some(newline) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=newline).collect();
            let line = line.trim_end_matches(&['\n', '\r'][..]);
            self.accept_line(line, &mut decoded);
        }
        decoded
    }

    /// Flush whatever is buffered once the stream has ended
    pub fn finish(&mut self) -> Vec<DecodeResult<StreamEvent>> {
        let mut decoded = Vec::new();
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.accept_line(line.trim_end_matches('\r'), &mut decoded);
        }
        self.flush_frame(&mut decoded);
        decoded
    }

    fn accept_line(&mut self, line: &str, out: &mut Vec<DecodeResult<StreamEvent>>) {
        if line.is_empty() {
            self.flush_frame(out);
        } else if self.frame.is_empty() && line.trim_start().starts_with('{') {
            // Newline-delimited JSON: the line is a frame by itself
            self.frame.push(line.to_string());
            self.flush_frame(out);
        } else {
            self.frame.push(line.to_string());
        }
    }

    fn flush_frame(&mut self, out: &mut Vec<DecodeResult<StreamEvent>>) {
        if self.frame.is_empty() {
            return;
        }
        let frame = std::mem::take(&mut self.frame).join("\n");
        match decode_frame(&frame) {
            Ok(Some(event)) => {
                self.frames_seen += 1;
                out.push(Ok(event));
            }
            Ok(None) => debug!("Skipping frame without data"),
            Err(e) => {
                self.frames_seen += 1;
                out.push(Err(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sse_frame() {
        let event = decode_frame("data: {\"type\": \"stage1_start\"}").unwrap();
        assert_eq!(event, Some(StreamEvent::Stage1Start));
    }

    #[test]
    fn test_unknown_event_rejected() {
        let err = decode_event(r#"{"type": "stage4_start"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEvent(tag) if tag == "stage4_start"));
    }

    #[test]
    fn test_missing_type_rejected() {
        let err = decode_event(r#"{"model": "a/b"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingType));
    }

    #[test]
    fn test_bad_payload_reports_event_type() {
        let err = decode_event(r#"{"type": "stage1_model_failed", "model": "a/b"}"#).unwrap_err();
        assert!(
            matches!(err, DecodeError::Payload { ref event_type, .. } if event_type == "stage1_model_failed")
        );
    }

    #[test]
    fn test_comment_frame_yields_nothing() {
        assert_eq!(decode_frame(": keep-alive").unwrap(), None);
    }

    #[test]
    fn test_decoder_handles_split_chunks() {
        let mut decoder = StreamDecoder::new();

        let first = decoder.push("data: {\"type\": \"stage1_");
        assert!(first.is_empty());

        let second = decoder.push("start\"}\n\ndata: {\"type\": \"complete\"}\n");
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].as_ref().unwrap(), &StreamEvent::Stage1Start);

        let rest = decoder.push("\n");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].as_ref().unwrap(), &StreamEvent::Complete);
        assert_eq!(decoder.frames_seen(), 2);
    }

    #[test]
    fn test_decoder_accepts_ndjson() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.push("{\"type\": \"stage2_start\"}\r\n{\"type\": \"stage3_start\"}\n");
        let events: Vec<StreamEvent> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(events, vec![StreamEvent::Stage2Start, StreamEvent::Stage3Start]);
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.push("data: {\"type\": \"complete\"}").is_empty());

        let events = decoder.finish();
        assert_eq!(events.len(), 1);
        assert!(events[0].as_ref().unwrap().is_terminal());
    }
}
