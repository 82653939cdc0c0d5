//! Front matter splitting.
//!
//! A document starts with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! date: 2024-01-15
//! ---
//! Body text
//! ```
//!
//! The block must be a flat mapping of scalars. Values are kept as text in
//! declaration order; the body is returned as a verbatim slice of the input.

use serde::ser::Serializer;
use serde_yaml::Value;

const DELIMITER: &str = "---";

/// Ordered `key: value` pairs from a front matter block.
pub type Fields = Vec<(String, String)>;

/// Front matter parsing failure.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    #[error("front matter is not terminated by a `---` line")]
    Unterminated,
    #[error("invalid YAML: {0}")]
    Yaml(String),
    #[error("front matter must be a mapping")]
    NotMapping,
    #[error("value of `{0}` is not a scalar")]
    NonScalar(String),
    #[error("missing required key `{0}`")]
    MissingKey(&'static str),
}

/// Typed front matter of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    /// Raw date text, validated during assembly.
    pub date: String,
    pub spoiler: Option<String>,
    pub cta: Option<String>,
    /// Remaining keys in declaration order.
    pub extra: Fields,
}

impl FrontMatter {
    /// Build typed front matter from parsed fields.
    ///
    /// # Errors
    ///
    /// Returns [`FrontMatterError::MissingKey`] if `title` or `date` is absent.
    pub fn from_fields(fields: Fields) -> Result<Self, FrontMatterError> {
        let mut title = None;
        let mut date = None;
        let mut spoiler = None;
        let mut cta = None;
        let mut extra = Vec::new();

        for (key, value) in fields {
            match key.as_str() {
                "title" => title = Some(value),
                "date" => date = Some(value),
                "spoiler" => spoiler = Some(value),
                "cta" => cta = Some(value),
                _ => extra.push((key, value)),
            }
        }

        Ok(Self {
            title: title.ok_or(FrontMatterError::MissingKey("title"))?,
            date: date.ok_or(FrontMatterError::MissingKey("date"))?,
            spoiler,
            cta,
            extra,
        })
    }

    /// Look up an extra key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Split raw text into front matter fields and body.
///
/// Text without a leading `---` line has no front matter: the fields are
/// empty and the whole input is the body.
///
/// # Errors
///
/// Returns [`FrontMatterError`] if the block is unterminated, is not valid
/// YAML, or is not a flat mapping of scalars.
pub fn split_front_matter(input: &str) -> Result<(Fields, &str), FrontMatterError> {
    let Some(rest) = strip_opening(input) else {
        return Ok((Fields::new(), input));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let fields = parse_fields(&rest[..offset])?;
            return Ok((fields, &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

/// Split a document, requiring `title` and `date`.
///
/// # Errors
///
/// Returns [`FrontMatterError`] on any splitting failure or a missing key.
pub fn split_document(input: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    let (fields, body) = split_front_matter(input)?;
    Ok((FrontMatter::from_fields(fields)?, body))
}

/// Return the text after the opening delimiter line, if present.
fn strip_opening(input: &str) -> Option<&str> {
    let (first, rest) = input.split_once('\n').unwrap_or((input, ""));
    (first.trim_end() == DELIMITER).then_some(rest)
}

fn parse_fields(yaml: &str) -> Result<Fields, FrontMatterError> {
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontMatterError::Yaml(e.to_string()))?;
    let mapping = match value {
        Value::Null => return Ok(Fields::new()),
        Value::Mapping(mapping) => mapping,
        _ => return Err(FrontMatterError::NotMapping),
    };

    mapping
        .into_iter()
        .map(|(key, value)| {
            let key = scalar_text(key).ok_or(FrontMatterError::NotMapping)?;
            let value =
                scalar_text(value).ok_or_else(|| FrontMatterError::NonScalar(key.clone()))?;
            Ok((key, value))
        })
        .collect()
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_text(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Serialize ordered fields as a map.
pub(crate) fn serialize_fields<S>(fields: &Fields, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(fields.iter().map(|(k, v)| (k, v)))
}
