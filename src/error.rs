use thiserror::Error;

/// Errors returned by session and client operations.
///
/// `Http`, `Network` and `NotStreaming` are transport failures: they end the
/// current submission. Everything that goes wrong *inside* the stream is
/// recovered instead and surfaces as a [`RecoveredError`].
#[derive(Error, Debug)]
pub enum GenError {
    /// The server returned a non-success HTTP status.
    #[error("Server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// The response carried no streaming body to read updates from.
    #[error("Response is not a stream")]
    NotStreaming,

    /// A job is already running on this session.
    #[error("Image generation already running")]
    AlreadyRunning,

    /// The server returned a body that did not match the expected shape.
    #[error("{0}")]
    InvalidResponse(String),

    /// The job request failed validation before it was sent.
    #[error("Invalid job request: {0}")]
    InvalidRequest(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenError {
    /// True for failures of the transport itself (connection, status, body).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GenError::Http { .. } | GenError::Network { .. } | GenError::NotStreaming
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GenError>;

/// One delimited segment of the stream could not be decoded as an update frame.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Could not process segment ({message}): {}", preview(.segment))]
pub struct FrameDecodeError {
    pub segment: String,
    pub message: String,
}

fn preview(segment: &str) -> &str {
    let end = segment
        .char_indices()
        .nth(120)
        .map(|(i, _)| i)
        .unwrap_or(segment.len());
    &segment[..end]
}

/// A frame carried an `updateType` the classifier does not know.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unexpected update type: {0}")]
pub struct UnexpectedUpdateKind(pub String);

/// A pixel payload could not be turned into a displayable image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterializationError {
    /// The raw array had no rows, or its first row had no pixels.
    #[error("Pixel payload is empty")]
    EmptyPayload,

    /// A row's length differs from the first row's.
    #[error("Row {row} has {found} pixels, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A pixel was not an array of three numbers.
    #[error("Pixel at row {row}, column {col} is not an RGB triple")]
    BadPixel { row: usize, col: usize },

    /// The payload was neither an image reference nor a pixel array.
    #[error("Unrecognized pixel payload shape")]
    UnrecognizedShape,

    /// PNG encoding of the pixel buffer failed.
    #[error("Image encoding failed: {0}")]
    Encode(String),
}

/// Any error the frame-handling path recovers from.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecoveredError {
    #[error(transparent)]
    Decode(#[from] FrameDecodeError),

    #[error(transparent)]
    UnexpectedKind(#[from] UnexpectedUpdateKind),

    #[error(transparent)]
    Materialization(#[from] MaterializationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(GenError::NotStreaming.is_transport());
        assert!(GenError::Http {
            status: 500,
            body: String::new()
        }
        .is_transport());
        assert!(!GenError::AlreadyRunning.is_transport());
        assert!(!GenError::InvalidRequest("x".into()).is_transport());
    }

    #[test]
    fn test_decode_error_truncates_segment() {
        let err = FrameDecodeError {
            segment: "é".repeat(500),
            message: "EOF".into(),
        };
        let shown = err.to_string();
        assert!(shown.starts_with("Could not process segment (EOF): "));
        assert_eq!(shown.chars().filter(|c| *c == 'é').count(), 120);
    }

    #[test]
    fn test_recovered_error_is_transparent() {
        let err: RecoveredError = UnexpectedUpdateKind("bogus".into()).into();
        assert_eq!(err.to_string(), "Unexpected update type: bogus");
    }
}
