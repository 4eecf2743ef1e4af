//! # formdata-codec
//!
//! multipart/form-data encoding and decoding.
//!
//! This crate provides:
//! - An ordered part store with typed append operations (text, files, JSON,
//!   URL-encoded parameters, self-encoding bodies)
//! - Boundary generation and `Content-Type` parsing
//! - A binary-safe encoder and decoder for complete in-memory bodies
//! - Error types and stable error codes

pub mod body;
pub mod boundary;
pub mod codec;
pub mod error;
pub mod form;
pub mod params;
pub mod part;

pub use body::{JsonBody, RequestBody};
pub use codec::DecodeLimits;
pub use error::{DecodingError, EncodingError, ErrorCode, FormDataError};
pub use form::FormData;
pub use params::SearchParams;
pub use part::{BodyPart, Headers};

/// Media type of the bodies produced and consumed here.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Content type of JSON parts.
pub const APPLICATION_JSON: &str = "application/json";

/// Fallback content type for files.
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Literal prefix of generated boundaries.
pub const BOUNDARY_PREFIX: &str = "formdata.boundary.";

/// Maximum boundary length (RFC 2046).
pub const MAX_BOUNDARY_LEN: usize = 70;
