//! Boundary generation and content-type parsing.

use crate::error::DecodingError;
use crate::{BOUNDARY_PREFIX, MAX_BOUNDARY_LEN, MULTIPART_FORM_DATA};
use uuid::Uuid;

/// Generates a fresh boundary: the fixed prefix followed by 32 random hex digits.
pub fn generate() -> String {
    format!("{}{}", BOUNDARY_PREFIX, Uuid::new_v4().simple())
}

/// Checks that a boundary can be carried in a header and on a delimiter line.
pub fn validate(boundary: &str) -> Result<(), DecodingError> {
    if boundary.is_empty()
        || boundary.len() > MAX_BOUNDARY_LEN
        || boundary.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
    {
        return Err(DecodingError::InvalidBoundary(boundary.to_string()));
    }
    Ok(())
}

/// Formats the `Content-Type` header value for a boundary.
pub fn content_type(boundary: &str) -> String {
    format!("{}; boundary={}", MULTIPART_FORM_DATA, boundary)
}

/// Extracts the boundary parameter from a `multipart/form-data` content type.
///
/// Parameter keys are matched case-insensitively and quoted values are unquoted.
pub fn parse_content_type(content_type: &str) -> Result<String, DecodingError> {
    let mut params = content_type.split(';');
    let media_type = params.next().unwrap_or("").trim();
    if !media_type.eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
        return Err(DecodingError::UnsupportedMediaType(media_type.to_string()));
    }

    for param in params {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("boundary") {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            validate(value)?;
            return Ok(value.to_string());
        }
    }

    Err(DecodingError::MissingBoundary)
}
