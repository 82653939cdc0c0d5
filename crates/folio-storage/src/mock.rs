//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::components::ComponentOverrides;
use crate::storage::{Document, Storage, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores documents, content and component overrides in memory. Use the
/// builder methods to configure the mock with test data.
///
/// # Example
///
/// ```ignore
/// use folio_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_file("hello", "Hello", "---\ntitle: Hello\ndate: 2024-01-01\n---\nBody");
///
/// let content = storage.read("hello").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    documents: RwLock<Vec<Document>>,
    contents: RwLock<HashMap<String, String>>,
    components: RwLock<HashMap<String, ComponentOverrides>>,
    broken_components: RwLock<Vec<String>>,
    read_delay: Option<Duration>,
    components_delay: Option<Duration>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document entry with content.
    #[must_use]
    pub fn with_file(
        self,
        path: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let path = path.into();
        write(&self.documents).push(Document {
            path: path.clone(),
            title: title.into(),
        });
        write(&self.contents).insert(path, content.into());
        self
    }

    /// Add content for an identifier without listing it in `scan()`.
    #[must_use]
    pub fn with_content(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        write(&self.contents).insert(path.into(), content.into());
        self
    }

    /// Add a single component override for an identifier.
    #[must_use]
    pub fn with_component(
        self,
        path: impl Into<String>,
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        write(&self.components)
            .entry(path.into())
            .or_default()
            .insert(name.into(), template.into());
        self
    }

    /// Make `components()` fail with `InvalidData` for an identifier.
    #[must_use]
    pub fn with_broken_components(self, path: impl Into<String>) -> Self {
        write(&self.broken_components).push(path.into());
        self
    }

    /// Delay every `read()` call, to exercise caller timeouts.
    #[must_use]
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Delay every `components()` call, to exercise caller timeouts.
    #[must_use]
    pub fn with_components_delay(mut self, delay: Duration) -> Self {
        self.components_delay = Some(delay);
        self
    }

    fn not_found(path: &str) -> StorageError {
        StorageError::new(StorageErrorKind::NotFound)
            .with_path(path)
            .with_backend(BACKEND)
    }
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

impl Storage for MockStorage {
    fn scan(&self) -> Result<Vec<Document>, StorageError> {
        let mut documents = read(&self.documents).clone();
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(documents)
    }

    fn read(&self, path: &str) -> Result<String, StorageError> {
        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }
        read(&self.contents)
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    fn components(&self, path: &str) -> Result<Option<ComponentOverrides>, StorageError> {
        if let Some(delay) = self.components_delay {
            std::thread::sleep(delay);
        }
        if read(&self.broken_components).iter().any(|p| p == path) {
            return Err(StorageError::new(StorageErrorKind::InvalidData)
                .with_path(path)
                .with_backend(BACKEND));
        }
        Ok(read(&self.components).get(path).cloned())
    }
}
