//! Body parts and their header lists.

use crate::{CONTENT_DISPOSITION, CONTENT_TYPE};
use bytes::Bytes;

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets `name`, replacing the existing entry in place or appending a new one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Appends without replacing, as a parser does with repeated headers.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates in wire order: Content-Disposition, Content-Type, then the rest.
    pub(crate) fn wire_order(&self) -> impl Iterator<Item = (&str, &str)> {
        let disposition = self.entries.iter().filter(|(k, _)| is(k, CONTENT_DISPOSITION));
        let content_type = self.entries.iter().filter(|(k, _)| is(k, CONTENT_TYPE));
        let rest = self
            .entries
            .iter()
            .filter(|(k, _)| !is(k, CONTENT_DISPOSITION) && !is(k, CONTENT_TYPE));
        disposition
            .chain(content_type)
            .chain(rest)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn is(name: &str, expected: &str) -> bool {
    name.eq_ignore_ascii_case(expected)
}

/// Drops CR and LF so a value cannot end its header line early.
fn single_line(mut value: String) -> String {
    if value.contains(['\r', '\n']) {
        value.retain(|c| c != '\r' && c != '\n');
    }
    value
}

/// One named section of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    name: String,
    filename: Option<String>,
    headers: Headers,
    data: Bytes,
}

impl BodyPart {
    /// Creates a part, building its Content-Disposition and optional Content-Type.
    ///
    /// Name and filename are quoted but not escaped, so they must not contain `"`.
    /// CR and LF are dropped from name, filename and content type.
    pub fn new(
        name: impl Into<String>,
        filename: Option<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let name = single_line(name.into());
        let filename = filename.map(single_line);
        let mut headers = Headers::new();
        headers.insert(
            CONTENT_DISPOSITION,
            content_disposition(&name, filename.as_deref()),
        );
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, single_line(content_type));
        }
        Self {
            name,
            filename,
            headers,
            data: data.into(),
        }
    }

    /// Assembles a part from already-parsed pieces.
    pub(crate) fn from_parsed(
        name: String,
        filename: Option<String>,
        headers: Headers,
        data: Bytes,
    ) -> Self {
        Self {
            name,
            filename,
            headers,
            data,
        }
    }

    /// Adds an extra header after the standard ones, or replaces Content-Type.
    ///
    /// Content-Disposition is owned by the part's name and filename, so
    /// setting it here is ignored. CR and LF are dropped from name and value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = single_line(name.into());
        if !is(&name, CONTENT_DISPOSITION) {
            self.headers.insert(name, single_line(value.into()));
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Returns the payload as text when it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Formats a `Content-Disposition` value for a form field.
pub fn content_disposition(name: &str, filename: Option<&str>) -> String {
    match filename {
        Some(filename) => format!("form-data; name=\"{}\"; filename=\"{}\"", name, filename),
        None => format!("form-data; name=\"{}\"", name),
    }
}

/// Extracts `(name, filename)` from a `Content-Disposition` value.
///
/// Keys are matched case-insensitively; values may be quoted or bare tokens.
pub fn parse_content_disposition(value: &str) -> (Option<String>, Option<String>) {
    let mut name = None;
    let mut filename = None;

    for param in split_params(value).into_iter().skip(1) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let raw = raw.trim();
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(raw);

        if key.eq_ignore_ascii_case("name") && name.is_none() {
            name = Some(unquoted.to_string());
        } else if key.eq_ignore_ascii_case("filename") && filename.is_none() {
            filename = Some(unquoted.to_string());
        }
    }

    (name, filename)
}

/// Splits on `;` outside of double quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}
