//! Multipart body encoder and decoder.
//!
//! Body layout:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="<name>"[; filename="<filename>"]\r\n
//! [Content-Type: <type>\r\n]
//! \r\n
//! <raw bytes>\r\n
//! --<boundary>\r\n
//! ...
//! --<boundary>--\r\n
//! ```
//!
//! Delimiters are only recognized at the start of the buffer or right after a
//! CRLF, and only when followed by CRLF or `--`. Payloads are never rescanned
//! for the boundary; a payload that contains `\r\n--<boundary>\r\n` will be
//! split. Random boundaries make that negligible.

use crate::error::DecodingError;
use crate::part::{parse_content_disposition, BodyPart, Headers};
use crate::CONTENT_DISPOSITION;
use bytes::{BufMut, Bytes, BytesMut};

const CRLF: &[u8] = b"\r\n";
const DASHES: &[u8] = b"--";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Optional resource limits applied while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum number of parts.
    pub max_parts: Option<usize>,
    /// Maximum size of the whole body in bytes.
    pub max_body_size: Option<usize>,
}

impl DecodeLimits {
    /// No limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_parts(mut self, max: usize) -> Self {
        self.max_parts = Some(max);
        self
    }

    pub fn with_max_body_size(mut self, max: usize) -> Self {
        self.max_body_size = Some(max);
        self
    }
}

/// Serializes parts into a multipart body delimited by `boundary`.
pub fn encode(boundary: &str, parts: &[BodyPart]) -> BytesMut {
    let delimiter_len = DASHES.len() + boundary.len() + CRLF.len();
    let estimate: usize = parts
        .iter()
        .map(|p| {
            let headers: usize = p.headers().iter().map(|(k, v)| k.len() + v.len() + 4).sum();
            delimiter_len + headers + CRLF.len() + p.data().len() + CRLF.len()
        })
        .sum::<usize>()
        + delimiter_len
        + DASHES.len();
    let mut buf = BytesMut::with_capacity(estimate);

    for part in parts {
        buf.put_slice(DASHES);
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(CRLF);

        for (name, value) in part.headers().wire_order() {
            buf.put_slice(name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(CRLF);
        }
        buf.put_slice(CRLF);

        buf.put_slice(part.data());
        buf.put_slice(CRLF);
    }

    buf.put_slice(DASHES);
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(DASHES);
    buf.put_slice(CRLF);

    buf
}

/// Parses a multipart body delimited by `boundary` into its parts.
pub fn decode(
    body: &[u8],
    boundary: &str,
    limits: &DecodeLimits,
) -> Result<Vec<BodyPart>, DecodingError> {
    if let Some(max) = limits.max_body_size {
        if body.len() > max {
            return Err(DecodingError::BodyTooLarge {
                size: body.len(),
                max,
            });
        }
    }

    Parser::new(boundary).parse(body, limits)
}

struct Parser {
    /// `--<boundary>`
    delimiter: Vec<u8>,
    /// `\r\n--<boundary>`
    separator: Vec<u8>,
}

impl Parser {
    fn new(boundary: &str) -> Self {
        let mut delimiter = Vec::with_capacity(DASHES.len() + boundary.len());
        delimiter.extend_from_slice(DASHES);
        delimiter.extend_from_slice(boundary.as_bytes());

        let mut separator = Vec::with_capacity(CRLF.len() + delimiter.len());
        separator.extend_from_slice(CRLF);
        separator.extend_from_slice(&delimiter);

        Self {
            delimiter,
            separator,
        }
    }

    fn parse(&self, body: &[u8], limits: &DecodeLimits) -> Result<Vec<BodyPart>, DecodingError> {
        if !body.starts_with(&self.delimiter) || !self.is_delimiter_end(body, self.delimiter.len())
        {
            return Err(DecodingError::MissingDelimiter);
        }

        let mut parts = Vec::new();
        // Always positioned at the first byte of a `--<boundary>` line.
        let mut pos = 0;

        loop {
            let after = pos + self.delimiter.len();
            let rest = &body[after..];
            if rest.starts_with(DASHES) {
                break;
            }
            if !rest.starts_with(CRLF) {
                return Err(DecodingError::MalformedDelimiter { offset: after });
            }

            if let Some(max) = limits.max_parts {
                if parts.len() >= max {
                    return Err(DecodingError::TooManyParts { max });
                }
            }

            let index = parts.len();
            let header_start = after + CRLF.len();
            let (header_block, data_start) = if body[header_start..].starts_with(CRLF) {
                (&body[header_start..header_start], header_start + CRLF.len())
            } else {
                let end = find(body, HEADER_END, header_start)
                    .ok_or(DecodingError::UnterminatedHeaders { part: index })?;
                (&body[header_start..end], end + HEADER_END.len())
            };

            let headers = parse_headers(header_block, index)?;
            let disposition = headers
                .get(CONTENT_DISPOSITION)
                .ok_or(DecodingError::MissingContentDisposition { part: index })?;
            let (name, filename) = parse_content_disposition(disposition);
            let name = name.ok_or(DecodingError::MissingName { part: index })?;

            let data_end = self
                .find_separator(body, data_start)
                .ok_or(DecodingError::MissingDelimiter)?;
            let data = Bytes::copy_from_slice(&body[data_start..data_end]);

            parts.push(BodyPart::from_parsed(name, filename, headers, data));
            pos = data_end + CRLF.len();
        }

        Ok(parts)
    }

    /// Finds the next `\r\n--<boundary>` that is followed by CRLF, `--`, or the end of input.
    fn find_separator(&self, body: &[u8], from: usize) -> Option<usize> {
        let mut from = from;
        while let Some(idx) = find(body, &self.separator, from) {
            if self.is_delimiter_end(body, idx + self.separator.len()) {
                return Some(idx);
            }
            from = idx + 1;
        }
        None
    }

    fn is_delimiter_end(&self, body: &[u8], at: usize) -> bool {
        let rest = &body[at..];
        rest.is_empty() || rest.starts_with(CRLF) || rest.starts_with(DASHES)
    }
}

fn parse_headers(block: &[u8], part: usize) -> Result<Headers, DecodingError> {
    let text =
        std::str::from_utf8(block).map_err(|_| DecodingError::InvalidHeaderEncoding { part })?;

    let mut headers = Headers::new();
    for line in text.split("\r\n").filter(|l| !l.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| DecodingError::MalformedHeader {
                part,
                line: line.to_string(),
            })?;
        headers.append(name.trim(), value.trim());
    }
    Ok(headers)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
