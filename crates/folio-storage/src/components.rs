//! Per-document component override types.
//!
//! A document may ship a sidecar mapping placeholder names to HTML templates.
//! This module contains only the data type and its YAML parsing - lookup and
//! merge with the process-wide defaults happen in the rendering layer.

use std::collections::BTreeMap;

/// Component overrides loaded from a document sidecar.
///
/// Maps a placeholder or element name (e.g., `"Counter"`, `"a"`, `"h2"`) to an
/// HTML template. Ordered so that iteration is deterministic.
pub type ComponentOverrides = BTreeMap<String, String>;

/// Error type for component sidecar parsing.
#[derive(Debug, thiserror::Error)]
pub enum ComponentsError {
    /// The sidecar is not a YAML mapping of names to strings.
    #[error("{0}")]
    Parse(String),
}

/// Parse a component sidecar from YAML content.
///
/// Empty content yields an empty mapping.
///
/// # Errors
///
/// Returns [`ComponentsError::Parse`] if the YAML is malformed or any value is
/// not a string.
pub fn parse_components(content: &str) -> Result<ComponentOverrides, ComponentsError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(ComponentOverrides::new());
    }

    serde_yaml::from_str(trimmed).map_err(|e| ComponentsError::Parse(format!("Invalid YAML: {e}")))
}
