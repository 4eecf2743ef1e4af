//! Codec error types and error codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while converting a value into a body part.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body encoding failed: {0}")]
    Body(String),

    #[error("invalid boundary: {0:?}")]
    InvalidBoundary(String),
}

/// Errors raised while parsing a multipart body.
///
/// `part` fields are zero-based indexes of the section being parsed.
#[derive(Debug, Error)]
pub enum DecodingError {
    #[error("missing boundary parameter in content type")]
    MissingBoundary,

    #[error("invalid boundary: {0:?}")]
    InvalidBoundary(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("missing multipart delimiter")]
    MissingDelimiter,

    #[error("malformed delimiter at byte offset {offset}")]
    MalformedDelimiter { offset: usize },

    #[error("part {part}: header block is not terminated")]
    UnterminatedHeaders { part: usize },

    #[error("part {part}: malformed header line {line:?}")]
    MalformedHeader { part: usize, line: String },

    #[error("part {part}: header block is not valid UTF-8")]
    InvalidHeaderEncoding { part: usize },

    #[error("part {part}: missing Content-Disposition header")]
    MissingContentDisposition { part: usize },

    #[error("part {part}: Content-Disposition has no name")]
    MissingName { part: usize },

    #[error("too many parts (max {max})")]
    TooManyParts { max: usize },

    #[error("body too large: {size} bytes (max {max})")]
    BodyTooLarge { size: usize, max: usize },
}

/// Either side of the codec failing.
#[derive(Debug, Error)]
pub enum FormDataError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Decoding(#[from] DecodingError),
}

/// Stable error codes for reporting codec failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EncodingFailed,
    MissingBoundary,
    InvalidBoundary,
    UnsupportedMediaType,
    MalformedBody,
    MalformedHeader,
    MissingName,
    LimitExceeded,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::EncodingFailed => write!(f, "ENCODING_FAILED"),
            ErrorCode::MissingBoundary => write!(f, "MISSING_BOUNDARY"),
            ErrorCode::InvalidBoundary => write!(f, "INVALID_BOUNDARY"),
            ErrorCode::UnsupportedMediaType => write!(f, "UNSUPPORTED_MEDIA_TYPE"),
            ErrorCode::MalformedBody => write!(f, "MALFORMED_BODY"),
            ErrorCode::MalformedHeader => write!(f, "MALFORMED_HEADER"),
            ErrorCode::MissingName => write!(f, "MISSING_NAME"),
            ErrorCode::LimitExceeded => write!(f, "LIMIT_EXCEEDED"),
        }
    }
}

impl EncodingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EncodingError::InvalidBoundary(_) => ErrorCode::InvalidBoundary,
            EncodingError::Json(_) | EncodingError::Body(_) => ErrorCode::EncodingFailed,
        }
    }
}

impl DecodingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodingError::MissingBoundary => ErrorCode::MissingBoundary,
            DecodingError::InvalidBoundary(_) => ErrorCode::InvalidBoundary,
            DecodingError::UnsupportedMediaType(_) => ErrorCode::UnsupportedMediaType,
            DecodingError::MissingDelimiter
            | DecodingError::MalformedDelimiter { .. }
            | DecodingError::UnterminatedHeaders { .. } => ErrorCode::MalformedBody,
            DecodingError::MalformedHeader { .. }
            | DecodingError::InvalidHeaderEncoding { .. }
            | DecodingError::MissingContentDisposition { .. } => ErrorCode::MalformedHeader,
            DecodingError::MissingName { .. } => ErrorCode::MissingName,
            DecodingError::TooManyParts { .. } | DecodingError::BodyTooLarge { .. } => {
                ErrorCode::LimitExceeded
            }
        }
    }
}

impl FormDataError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FormDataError::Encoding(e) => e.code(),
            FormDataError::Decoding(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoding_error_codes() {
        assert_eq!(
            DecodingError::MissingBoundary.code(),
            ErrorCode::MissingBoundary
        );
        assert_eq!(
            DecodingError::MalformedDelimiter { offset: 3 }.code(),
            ErrorCode::MalformedBody
        );
        assert_eq!(
            DecodingError::MissingContentDisposition { part: 0 }.code(),
            ErrorCode::MalformedHeader
        );
        assert_eq!(
            DecodingError::TooManyParts { max: 1 }.code(),
            ErrorCode::LimitExceeded
        );
        assert_eq!(
            EncodingError::Body("nope".into()).code(),
            ErrorCode::EncodingFailed
        );
        assert_eq!(
            EncodingError::InvalidBoundary(String::new()).code(),
            ErrorCode::InvalidBoundary
        );
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::MissingBoundary), "MISSING_BOUNDARY");
        assert_eq!(format!("{}", ErrorCode::MalformedBody), "MALFORMED_BODY");
        assert_eq!(format!("{}", ErrorCode::LimitExceeded), "LIMIT_EXCEEDED");
        assert_eq!(
            format!("{}", ErrorCode::UnsupportedMediaType),
            "UNSUPPORTED_MEDIA_TYPE"
        );
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::MissingName).unwrap();
        assert_eq!(json, "\"MISSING_NAME\"");

        let parsed: ErrorCode = serde_json::from_str("\"ENCODING_FAILED\"").unwrap();
        assert_eq!(parsed, ErrorCode::EncodingFailed);
    }

    #[test]
    fn test_error_display() {
        let err = DecodingError::BodyTooLarge { size: 100, max: 50 };
        assert!(err.to_string().contains("100"));

        let err = DecodingError::MalformedHeader {
            part: 2,
            line: "garbage".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("part 2"));
        assert!(msg.contains("garbage"));

        let err: FormDataError = DecodingError::MissingBoundary.into();
        assert!(err.to_string().contains("boundary"));
        assert_eq!(err.code(), ErrorCode::MissingBoundary);
    }
}
