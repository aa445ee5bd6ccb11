//! Update frame parsing with delimiter-based recovery.
//!
//! The server usually sends one JSON object per transport chunk, so the whole
//! buffer is tried first. When that fails the buffer is split on the blank-line
//! delimiter (`"\n\n"`):
//!
//! - every segment except the last is parsed on its own, and a segment that
//!   does not parse is dropped and reported;
//! - the last segment is always kept as the remainder, even if it looks
//!   complete, since it may be cut at a delimiter boundary;
//! - with no delimiter present, nothing is consumed.

use crate::error::FrameDecodeError;
use crate::types::UpdateFrame;

/// The frame delimiter used when several frames share a buffer.
pub const DELIMITER: &str = "\n\n";

/// Result of one parse over the accumulated buffer.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub frames: Vec<UpdateFrame>,
    /// Text not yet consumed; becomes the accumulator's new buffer.
    pub remainder: String,
    /// Interior segments that were dropped.
    pub errors: Vec<FrameDecodeError>,
}

/// Try to decode `text` as exactly one update frame.
pub fn try_parse(text: &str) -> Result<UpdateFrame, FrameDecodeError> {
    serde_json::from_str::<UpdateFrame>(text).map_err(|e| FrameDecodeError {
        segment: text.to_string(),
        message: e.to_string(),
    })
}

/// Parse as many complete frames as possible out of `buffer`.
pub fn parse_buffer(buffer: String) -> ParseOutcome {
    if let Ok(frame) = try_parse(&buffer) {
        return ParseOutcome {
            frames: vec![frame],
            ..ParseOutcome::default()
        };
    }

    let Some(tail_start) = buffer.rfind(DELIMITER) else {
        return ParseOutcome {
            remainder: buffer,
            ..ParseOutcome::default()
        };
    };

    let mut outcome = ParseOutcome {
        remainder: buffer[tail_start + DELIMITER.len()..].to_string(),
        ..ParseOutcome::default()
    };

    for segment in buffer[..tail_start].split(DELIMITER) {
        if segment.trim().is_empty() {
            continue;
        }
        match try_parse(segment) {
            Ok(frame) => outcome.frames.push(frame),
            Err(e) => outcome.errors.push(e),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UpdateType;

    const INIT: &str = r#"{"updateType":"init","title":"Starting"}"#;
    const PREVIEW: &str = r#"{"updateType":"preview","percentage":"50"}"#;

    #[test]
    fn test_fast_path_single_frame() {
        let outcome = parse_buffer(INIT.to_string());
        assert_eq!(outcome.frames.len(), 1);
        assert_eq!(outcome.frames[0].update_type, UpdateType::Init);
        assert!(outcome.remainder.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_fast_path_tolerates_surrounding_whitespace() {
        let outcome = parse_buffer(format!("\n\n{}\n\n", INIT));
        assert_eq!(outcome.frames.len(), 1);
        assert!(outcome.remainder.is_empty());
    }

    #[test]
    fn test_partial_frame_without_delimiter_waits() {
        let partial = r#"{"updateType":"pre"#.to_string();
        let outcome = parse_buffer(partial.clone());
        assert!(outcome.frames.is_empty());
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.remainder, partial);
    }

    #[test]
    fn test_garbage_without_delimiter_is_kept() {
        let outcome = parse_buffer("not json at all".to_string());
        assert!(outcome.frames.is_empty());
        assert_eq!(outcome.remainder, "not json at all");
    }

    #[test]
    fn test_last_segment_is_always_remainder() {
        let outcome = parse_buffer(format!("{}\n\n{}", INIT, PREVIEW));
        assert_eq!(outcome.frames.len(), 1);
        assert_eq!(outcome.frames[0].update_type, UpdateType::Init);
        assert_eq!(outcome.remainder, PREVIEW);
    }

    #[test]
    fn test_multiple_frames_with_trailing_delimiter() {
        let outcome = parse_buffer(format!("{}\n\n{}\n\n", INIT, PREVIEW));
        assert_eq!(outcome.frames.len(), 2);
        assert_eq!(outcome.frames[1].update_type, UpdateType::Preview);
        assert!(outcome.remainder.is_empty());
    }

    #[test]
    fn test_partial_tail_kept() {
        let outcome = parse_buffer(format!("{}\n\n{{\"updateTy", INIT));
        assert_eq!(outcome.frames.len(), 1);
        assert_eq!(outcome.remainder, "{\"updateTy");
    }

    #[test]
    fn test_malformed_interior_segment_dropped() {
        let outcome = parse_buffer(format!("{}\n\n{{broken\n\n{}\n\n", INIT, PREVIEW));
        assert_eq!(outcome.frames.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].segment, "{broken");
        assert!(outcome.remainder.is_empty());
    }

    #[test]
    fn test_blank_segments_skipped() {
        let outcome = parse_buffer(format!("{}\n\n\n\n\n\n{}\n\n{{", INIT, PREVIEW));
        assert_eq!(outcome.frames.len(), 2);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.remainder, "{");
    }

    #[test]
    fn test_valid_json_but_not_a_frame() {
        assert!(try_parse(r#"{"title":"no discriminant"}"#).is_err());
        let outcome = parse_buffer(r#"{"title":"x"}"#.to_string());
        assert!(outcome.frames.is_empty());
        assert_eq!(outcome.remainder, r#"{"title":"x"}"#);
    }

    #[test]
    fn test_empty_buffer() {
        let outcome = parse_buffer(String::new());
        assert!(outcome.frames.is_empty());
        assert!(outcome.errors.is_empty());
        assert!(outcome.remainder.is_empty());
    }
}
