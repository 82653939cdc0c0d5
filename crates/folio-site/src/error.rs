use std::time::Duration;

use folio_storage::StorageError;

use crate::front_matter::FrontMatterError;

/// Error returned when a document cannot be rendered.
///
/// Node-level problems never surface here; they are reported as diagnostics
/// on the rendered document.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No document exists for the identifier.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// The identifier is empty, absolute or escapes the storage root.
    #[error("Invalid document identifier: {0:?}")]
    InvalidIdentifier(String),
    /// Storage did not answer within the configured timeout.
    #[error("Timed out loading {slug} after {}ms", .timeout.as_millis())]
    LoadTimeout { slug: String, timeout: Duration },
    #[error("Malformed front matter in {slug}: {source}")]
    MalformedFrontMatter {
        slug: String,
        #[source]
        source: FrontMatterError,
    },
    #[error("Invalid date {value:?} in {slug}")]
    InvalidDate { slug: String, value: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RenderError {
    /// Whether the error means the document does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
