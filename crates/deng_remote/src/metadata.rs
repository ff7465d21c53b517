//! `info.dei` package metadata
//!
//! Doomsday Info syntax as used for package metadata: one `key: value` per
//! line, lists written as `key <a, b, c>`. Values that would not survive
//! that syntax are quoted, with `\"`, `\\` and `\n` escapes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::package::{PackageInfo, ID_PREFIX};

/// Metadata parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("Line {line}: expected 'key: value' or 'key <list>'")]
    Syntax { line: usize },

    #[error("Line {line}: unterminated list")]
    UnterminatedList { line: usize },

    #[error("Missing required key '{0}'")]
    MissingKey(&'static str),
}

/// Metadata for one package
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub id: String,
    pub title: String,
    pub version: String,
    pub author: String,
    pub license: String,
    pub tags: Vec<String>,
    pub data_files: Vec<String>,
}

impl PackageMetadata {
    /// Synthesize metadata for an idgames package: the title is the file
    /// name, tags are the mirror categories
    pub fn for_package(info: &PackageInfo) -> Self {
        let mut tags = vec![ID_PREFIX.to_string()];
        tags.extend(info.categories());
        Self {
            id: info.id.clone(),
            title: info.file_name().to_string(),
            version: info.version.clone(),
            author: "Unknown".to_string(),
            license: "Unknown".to_string(),
            tags,
            data_files: vec![info.path.clone()],
        }
    }

    /// Serialize as `info.dei` text
    pub fn to_info(&self) -> String {
        let mut out = String::new();
        for (key, value) in [
            ("ID", &self.id),
            ("title", &self.title),
            ("version", &self.version),
            ("author", &self.author),
            ("license", &self.license),
        ] {
            out.push_str(&format!("{}: {}\n", key, quote_if_needed(value)));
        }
        out.push_str(&format!("tags {}\n", format_list(&self.tags)));
        out.push_str(&format!("dataFiles {}\n", format_list(&self.data_files)));
        out
    }

    /// Parse `info.dei` text. Unknown keys are ignored; `ID` is required.
    pub fn from_info(text: &str) -> Result<Self, MetadataError> {
        let mut meta = Self::default();
        let mut has_id = false;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let list_start = line.find('<');
            let colon = line.find(':');
            match (colon, list_start) {
                (Some(c), l) if l.map_or(true, |l| c < l) => {
                    let key = line[..c].trim();
                    let value = unquote(line[c + 1..].trim());
                    if key.is_empty() {
                        return Err(MetadataError::Syntax { line: line_no });
                    }
                    match key.to_ascii_lowercase().as_str() {
                        "id" => {
                            meta.id = value;
                            has_id = true;
                        }
                        "title" => meta.title = value,
                        "version" => meta.version = value,
                        "author" => meta.author = value,
                        "license" => meta.license = value,
                        other => log::debug!("Ignoring info key '{}'", other),
                    }
                }
                (_, Some(l)) => {
                    let key = line[..l].trim();
                    let body = line[l + 1..]
                        .trim_end()
                        .strip_suffix('>')
                        .ok_or(MetadataError::UnterminatedList { line: line_no })?;
                    if key.is_empty() {
                        return Err(MetadataError::Syntax { line: line_no });
                    }
                    let items = parse_list(body);
                    match key.to_ascii_lowercase().as_str() {
                        "tags" => meta.tags = items,
                        "datafiles" => meta.data_files = items,
                        other => log::debug!("Ignoring info list '{}'", other),
                    }
                }
                _ => return Err(MetadataError::Syntax { line: line_no }),
            }
        }

        if !has_id {
            return Err(MetadataError::MissingKey("ID"));
        }
        Ok(meta)
    }
}

fn needs_quotes(item: &str) -> bool {
    item.is_empty() || item.contains([',', '<', '>', '"', '\\', '\n', '\r']) || item.trim() != item
}

fn quote_if_needed(item: &str) -> String {
    if !needs_quotes(item) {
        return item.to_string();
    }
    let mut quoted = String::with_capacity(item.len() + 2);
    quoted.push('"');
    for c in item.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        'r' => '\r',
        c => c,
    }
}

fn format_list(items: &[String]) -> String {
    let items: Vec<String> = items.iter().map(|item| quote_if_needed(item)).collect();
    format!("<{}>", items.join(", "))
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(unescape(next));
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Split a list body on commas outside quotes
fn parse_list(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    // Length of `current` when its closing quote was seen
    let mut quoted_len: Option<usize> = None;
    let mut in_quotes = false;
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(unescape(next));
                }
            }
            '"' if in_quotes => {
                in_quotes = false;
                quoted_len = Some(current.len());
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => {
                push_item(&mut items, &current, quoted_len);
                current.clear();
                quoted_len = None;
            }
            _ => current.push(c),
        }
    }
    push_item(&mut items, &current, quoted_len);
    items
}

fn push_item(items: &mut Vec<String>, raw: &str, quoted_len: Option<usize>) {
    match quoted_len {
        Some(len) => items.push(raw[..len].to_string()),
        None => {
            let item = raw.trim();
            if !item.is_empty() {
                items.push(item.to_string());
            }
        }
    }
}
