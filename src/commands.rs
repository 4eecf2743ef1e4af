//! Command execution.

use crate::config::{Config, OutputFormat};
use colored::Colorize;
use formdata_codec::{BodyPart, FormData, SearchParams};
use serde::Serialize;
use serde_json::Value;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Longest text preview shown when listing parts.
const PREVIEW_CHARS: usize = 60;

/// Inputs of the `encode` command.
#[derive(Debug, Default)]
pub struct EncodeRequest {
    pub fields: Vec<String>,
    pub files: Vec<String>,
    pub json: Vec<String>,
    pub params: Vec<String>,
    pub boundary: Option<String>,
}

/// Summary of a decoded part.
#[derive(Debug, Clone, Serialize)]
pub struct PartSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl PartSummary {
    fn from_part(part: &BodyPart) -> Self {
        Self {
            name: part.name().to_string(),
            filename: part.filename().map(str::to_string),
            content_type: part.content_type().map(str::to_string),
            size: part.data().len(),
            text: part.text().map(preview),
        }
    }
}

/// Builds a form from command-line field specs.
///
/// Parts are appended by kind: text fields, files, JSON values, then
/// parameter sets, each group in the order given.
pub fn build_form(
    request: &EncodeRequest,
    config: &Config,
) -> Result<FormData, Box<dyn std::error::Error>> {
    let boundary = request
        .boundary
        .as_ref()
        .or(config.encode.boundary.as_ref());
    let mut form = match boundary {
        Some(b) => FormData::with_boundary(b.clone())?,
        None => FormData::new(),
    };

    for spec in &request.fields {
        let (name, value) = parse_assignment(spec)?;
        form.append_text(name, value);
    }

    for spec in &request.files {
        let file = FileSpec::parse(spec)?;
        let data = std::fs::read(&file.path)
            .map_err(|e| format!("failed to read '{}': {}", file.path.display(), e))?;
        let content_type = file
            .content_type
            .unwrap_or_else(|| config.encode.default_file_content_type.clone());
        tracing::debug!(
            name = %file.name,
            path = %file.path.display(),
            size = data.len(),
            "appending file"
        );
        form.append_binary(file.name, data, file.filename, content_type);
    }

    for spec in &request.json {
        let (name, raw) = parse_assignment(spec)?;
        let value = parse_json_arg(raw)?;
        form.append_json(name, &value)?;
    }

    for spec in &request.params {
        let (name, query) = parse_assignment(spec)?;
        form.append_params(name, &SearchParams::parse(query));
    }

    Ok(form)
}

/// Encodes a form and writes the body to `output` (stdout when `None`).
///
/// Returns the content type that must accompany the body.
pub fn encode(
    request: &EncodeRequest,
    output: Option<&Path>,
    config: &Config,
) -> Result<String, Box<dyn std::error::Error>> {
    let form = build_form(request, config)?;
    let body = form.encode();
    tracing::info!(parts = form.len(), bytes = body.len(), "encoded form");

    match output {
        Some(path) => std::fs::write(path, &body)
            .map_err(|e| format!("failed to write '{}': {}", path.display(), e))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&body)?;
            stdout.flush()?;
        }
    }

    Ok(form.content_type())
}

/// Decodes a body read from `input` (stdin when `None` or `-`) and formats its parts.
pub fn decode(
    input: Option<&Path>,
    content_type: &str,
    format: OutputFormat,
    config: &Config,
) -> Result<String, Box<dyn std::error::Error>> {
    let body = read_input(input)?;
    let form = FormData::decode_with_limits(&body, content_type, &config.decode.limits())?;
    tracing::info!(parts = form.len(), bytes = body.len(), "decoded form");

    let summaries: Vec<PartSummary> = form.iter().map(PartSummary::from_part).collect();
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Text => Ok(format_parts(&summaries)),
    }
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    match input {
        Some(path) if path != Path::new("-") => Ok(std::fs::read(path)
            .map_err(|e| format!("failed to read '{}': {}", path.display(), e))?),
        _ => {
            let mut body = Vec::new();
            std::io::stdin().lock().read_to_end(&mut body)?;
            Ok(body)
        }
    }
}

/// A `NAME=@PATH[;type=MIME]` file spec.
#[derive(Debug, PartialEq, Eq)]
struct FileSpec {
    name: String,
    path: PathBuf,
    filename: String,
    content_type: Option<String>,
}

impl FileSpec {
    fn parse(spec: &str) -> Result<Self, String> {
        let (name, rest) = parse_assignment(spec)?;
        let rest = rest.strip_prefix('@').unwrap_or(rest);

        let (path, content_type) = match rest.split_once(";type=") {
            Some((path, mime)) if !mime.is_empty() => (path, Some(mime.to_string())),
            Some((path, _)) => (path, None),
            None => (rest, None),
        };
        if path.is_empty() {
            return Err(format!("missing file path in '{}'", spec));
        }

        let path = PathBuf::from(path);
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .ok_or_else(|| format!("'{}' has no file name", path.display()))?;

        Ok(Self {
            name: name.to_string(),
            path,
            filename,
            content_type,
        })
    }
}

/// Splits `NAME=VALUE`.
fn parse_assignment(spec: &str) -> Result<(&str, &str), String> {
    spec.split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", spec))
}

/// Reads a JSON field value, inline or from `@path`.
fn parse_json_arg(arg: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read '{}': {}", path, e))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON value: {}", e).into())
}

fn format_parts(parts: &[PartSummary]) -> String {
    if parts.is_empty() {
        return "(no parts)".dimmed().to_string();
    }

    let mut lines = Vec::with_capacity(parts.len() * 2);
    for (i, part) in parts.iter().enumerate() {
        let mut line = format!("{}. {}", i + 1, part.name.cyan());
        if let Some(ref filename) = part.filename {
            line.push_str(&format!(" ({})", filename.yellow()));
        }
        if let Some(ref content_type) = part.content_type {
            line.push_str(&format!(" [{}]", content_type));
        }
        line.push_str(&format!(" {}", format_size(part.size).dimmed()));
        lines.push(line);

        if let Some(ref text) = part.text {
            lines.push(format!("   {}", text));
        }
    }
    lines.join("\n")
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", truncated)
}

/// Formats a part size with a binary unit.
fn format_size(size: usize) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if size < 1024 {
        return format!("{} B", size);
    }
    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
