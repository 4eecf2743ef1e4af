//! Values that produce their own part payload.

use crate::error::EncodingError;
use crate::APPLICATION_JSON;
use serde::Serialize;
use std::borrow::Cow;

/// A value that knows how to encode itself as a part body.
///
/// Implementors pick their own serialization (key naming, format). The content
/// type defaults to JSON.
pub trait RequestBody {
    fn content_type(&self) -> Cow<'static, str> {
        Cow::Borrowed(APPLICATION_JSON)
    }

    fn encode_body(&self) -> Result<Vec<u8>, EncodingError>;
}

/// Wraps a serializable value as a JSON body.
///
/// Key naming is whatever the value's `Serialize` impl produces, so
/// `#[serde(rename_all = "snake_case")]` on the type controls it.
#[derive(Debug, Clone)]
pub struct JsonBody<T> {
    value: T,
    pretty: bool,
}

impl<T: Serialize> JsonBody<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            pretty: false,
        }
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Serialize> RequestBody for JsonBody<T> {
    fn encode_body(&self) -> Result<Vec<u8>, EncodingError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&self.value)?
        } else {
            serde_json::to_vec(&self.value)?
        };
        Ok(bytes)
    }
}
