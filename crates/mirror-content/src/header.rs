//! Front matter parsing and rendering
//!
//! Source notes carry a YAML header fenced by `---` lines (TOML headers
//! fenced by `+++` are accepted too). Published documents always carry a
//! TOML header fenced by `+++`.

use serde::{Deserialize, Serialize};
use toml::value::Datetime;

use crate::error::{Error, Result};

/// Header fields keyed by name, in sorted order.
pub type Header = toml::Table;

/// Supported header formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderFormat {
    Yaml,
    Toml,
}

impl HeaderFormat {
    /// The fence line that opens and closes a header block
    pub fn fence(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    /// Detect the header format from a fence line
    pub fn from_fence(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }
}

/// A source document split into header fields and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub header: Header,
    pub body: String,
    /// Format of the header block, if one was found and parsed
    pub format: Option<HeaderFormat>,
    /// Why the header block was discarded, if it was
    pub header_error: Option<String>,
}

struct RawSplit<'a> {
    format: HeaderFormat,
    header: &'a str,
    body: &'a str,
}

/// Split `text` into a fenced header block and the body that follows.
fn split(text: &str) -> Option<RawSplit<'_>> {
    let (first, mut rest) = text.split_once('\n')?;
    let format = HeaderFormat::from_fence(first)?;

    let header_start = first.len() + 1;
    let mut offset = header_start;
    loop {
        let (line, remainder) = match rest.split_once('\n') {
            Some((line, remainder)) => (line, Some(remainder)),
            None => (rest, None),
        };

        if line.trim_end() == format.fence() {
            let header = &text[header_start..offset];
            let body = remainder.unwrap_or("");
            let body = body.trim_start_matches(['\n', '\r']);
            return Some(RawSplit {
                format,
                header,
                body,
            });
        }

        offset += line.len() + 1;
        rest = remainder?;
    }
}

/// Parse a raw header block into header fields.
pub fn parse_header(format: HeaderFormat, raw: &str) -> Result<Header> {
    match format {
        HeaderFormat::Toml => {
            toml::from_str::<Header>(raw).map_err(|e| Error::parse(format.name(), e.to_string()))
        }
        HeaderFormat::Yaml if raw.trim().is_empty() => Ok(Header::new()),
        HeaderFormat::Yaml => {
            let value: serde_yaml::Value = serde_yaml::from_str(raw)
                .map_err(|e| Error::parse(format.name(), e.to_string()))?;
            match value {
                serde_yaml::Value::Null => Ok(Header::new()),
                serde_yaml::Value::Mapping(mapping) => Ok(mapping_to_table(mapping)),
                _ => Err(Error::NotAMapping {
                    format: format.name().to_string(),
                }),
            }
        }
    }
}

/// Parse a whole document.
///
/// Never fails: a header that cannot be parsed leaves the header empty and
/// the entire raw text becomes the body.
pub fn parse_document(text: &str) -> ParsedDocument {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some(raw) = split(text) else {
        return ParsedDocument {
            header: Header::new(),
            body: text.to_string(),
            format: None,
            header_error: None,
        };
    };

    match parse_header(raw.format, raw.header) {
        Ok(header) => ParsedDocument {
            header,
            body: raw.body.to_string(),
            format: Some(raw.format),
            header_error: None,
        },
        Err(e) => ParsedDocument {
            header: Header::new(),
            body: text.to_string(),
            format: None,
            header_error: Some(e.to_string()),
        },
    }
}

/// Render a published document: TOML header block, one blank line, body.
pub fn render_document(header: &Header, body: &str) -> Result<String> {
    let fence = HeaderFormat::Toml.fence();
    let rendered = toml::to_string(header)?;
    Ok(format!("{fence}\n{rendered}{fence}\n\n{body}"))
}

fn mapping_to_table(mapping: serde_yaml::Mapping) -> Header {
    let mut table = Header::new();
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        if let Some(value) = yaml_to_toml(value) {
            table.insert(key, value);
        }
    }
    table
}

/// Convert a YAML value into its TOML counterpart. TOML has no null, so
/// nulls are dropped.
fn yaml_to_toml(value: serde_yaml::Value) -> Option<toml::Value> {
    use serde_yaml::Value as Yaml;

    let converted = match value {
        Yaml::Null => return None,
        Yaml::Bool(b) => toml::Value::Boolean(b),
        Yaml::Number(n) => match n.as_i64() {
            Some(i) => toml::Value::Integer(i),
            None => toml::Value::Float(n.as_f64()?),
        },
        Yaml::String(s) => match parse_date(&s) {
            Some(date) => toml::Value::Datetime(date),
            None => toml::Value::String(s),
        },
        Yaml::Sequence(items) => {
            toml::Value::Array(items.into_iter().filter_map(yaml_to_toml).collect())
        }
        Yaml::Mapping(mapping) => toml::Value::Table(mapping_to_table(mapping)),
        Yaml::Tagged(tagged) => return yaml_to_toml(tagged.value),
    };
    Some(converted)
}

/// Unquoted YAML dates arrive as strings; keep them typed in TOML.
fn parse_date(s: &str) -> Option<Datetime> {
    let bytes = s.as_bytes();
    let date_shaped = bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[7] == b'-';
    if !date_shaped {
        return None;
    }
    s.parse::<Datetime>().ok()
}
