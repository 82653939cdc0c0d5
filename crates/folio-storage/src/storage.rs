//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait for abstracting document lookup and retrieval,
//! along with [`StorageError`] for unified error handling across backends.
//!
//! # Identifier Convention
//!
//! All path parameters in Storage methods are **document identifiers** (slugs),
//! not file paths:
//! - `"hello-world"` - a top-level post
//! - `"notes/rust-traits"` - a nested post
//!
//! Storage implementations handle the mapping from identifiers to their internal
//! storage format.

use std::path::PathBuf;

use crate::components::ComponentOverrides;

/// Document entry returned by storage scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Document identifier (e.g., "hello-world", "notes/rust-traits").
    pub path: String,
    /// Best-effort title (front matter `title` line, falling back to the slug).
    pub title: String,
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Invalid path or identifier.
    InvalidPath,
    /// Resource exists but its content could not be decoded.
    InvalidData,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid path, malformed content).
    #[default]
    Permanent,
    /// Retry immediately (timeout, connection reset).
    Temporary,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => StorageErrorKind::Timeout,
            std::io::ErrorKind::InvalidData => StorageErrorKind::InvalidData,
            _ => StorageErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut => ErrorStatus::Temporary,
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }

    /// Whether this error means the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::InvalidData => "Invalid data",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Timeout => "Timeout",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Validate a document identifier.
///
/// Rejects empty identifiers, absolute paths, backslashes, NUL bytes and any
/// `.`/`..`/empty segment so that identifiers can never escape the storage root.
///
/// # Errors
///
/// Returns [`StorageErrorKind::InvalidPath`] when the identifier is rejected.
pub fn validate_identifier(id: &str) -> Result<(), StorageError> {
    let invalid = id.is_empty()
        || id.starts_with('/')
        || id.contains(['\\', '\0'])
        || id
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if invalid {
        return Err(StorageError::new(StorageErrorKind::InvalidPath).with_path(id));
    }
    Ok(())
}

/// Storage abstraction for document lookup and retrieval.
///
/// All path parameters are **document identifiers**, not file paths.
/// Implementations are read-only: documents are treated as immutable for the
/// lifetime of the process.
pub trait Storage: Send + Sync {
    /// Scan and return all documents, sorted by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if scanning fails (e.g., permission denied).
    fn scan(&self) -> Result<Vec<Document>, StorageError>;

    /// Read the raw document text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the document doesn't exist or can't be read.
    fn read(&self, path: &str) -> Result<String, StorageError>;

    /// Read the per-document component overrides.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(overrides))` - An override sidecar exists and was parsed
    /// - `Ok(None)` - The document has no overrides
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on I/O error or when the sidecar cannot be parsed.
    fn components(&self, path: &str) -> Result<Option<ComponentOverrides>, StorageError>;
}
