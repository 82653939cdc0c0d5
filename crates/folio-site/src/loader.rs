//! Document loading with a bounded wait and an optional byte cache.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use folio_storage::{
    ComponentOverrides, ErrorStatus, Storage, StorageError, StorageErrorKind, validate_identifier,
};

use crate::error::RenderError;

/// Raw text of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentSource {
    pub identifier: String,
    /// Shared with the loader cache when caching is enabled.
    pub raw_text: Arc<str>,
}

/// Loads documents from storage.
///
/// Reads run on a worker thread so a stalled backend surfaces as
/// [`RenderError::LoadTimeout`] instead of blocking the caller. Documents are
/// immutable for the process lifetime, so cached text is never invalidated.
pub(crate) struct Loader {
    storage: Arc<dyn Storage>,
    timeout: Duration,
    cache: Option<RwLock<HashMap<String, Arc<str>>>>,
}

impl Loader {
    pub(crate) fn new(storage: Arc<dyn Storage>, timeout: Duration, cache_enabled: bool) -> Self {
        Self {
            storage,
            timeout,
            cache: cache_enabled.then(RwLock::default),
        }
    }

    /// Load a document by identifier.
    pub(crate) fn load(&self, slug: &str) -> Result<DocumentSource, RenderError> {
        validate_identifier(slug).map_err(|_| RenderError::InvalidIdentifier(slug.to_owned()))?;

        if let Some(cache) = &self.cache
            && let Some(text) = cache
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(slug)
        {
            tracing::debug!(slug, "Document cache hit");
            return Ok(DocumentSource {
                identifier: slug.to_owned(),
                raw_text: Arc::clone(text),
            });
        }

        let raw_text = self.read_with_timeout(slug)?;
        if let Some(cache) = &self.cache {
            cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(slug.to_owned(), Arc::clone(&raw_text));
        }

        Ok(DocumentSource {
            identifier: slug.to_owned(),
            raw_text,
        })
    }

    /// Load a document's component overrides within the same timeout.
    ///
    /// A timeout is reported as a temporary [`StorageErrorKind::Timeout`].
    pub(crate) fn load_components(
        &self,
        slug: &str,
    ) -> Result<Option<ComponentOverrides>, StorageError> {
        match self.bounded(slug, |storage, id| storage.components(id)) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(StorageError::new(StorageErrorKind::Timeout)
                .with_status(ErrorStatus::Temporary)
                .with_path(slug)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(StorageError::new(StorageErrorKind::Unavailable).with_path(slug))
            }
        }
    }

    fn read_with_timeout(&self, slug: &str) -> Result<Arc<str>, RenderError> {
        match self.bounded(slug, |storage, id| storage.read(id)) {
            Ok(Ok(text)) => Ok(Arc::from(text)),
            Ok(Err(e)) if e.is_not_found() => Err(RenderError::NotFound(slug.to_owned())),
            Ok(Err(e)) => Err(RenderError::Storage(e)),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(slug, timeout = ?self.timeout, "Document load timed out");
                Err(RenderError::LoadTimeout {
                    slug: slug.to_owned(),
                    timeout: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(RenderError::Storage(
                StorageError::new(StorageErrorKind::Unavailable).with_path(slug),
            )),
        }
    }

    /// Run a storage call on a worker thread, waiting at most the load timeout.
    fn bounded<T, F>(
        &self,
        slug: &str,
        op: F,
    ) -> Result<Result<T, StorageError>, RecvTimeoutError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Storage, &str) -> Result<T, StorageError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let storage = Arc::clone(&self.storage);
        let id = slug.to_owned();
        let spawned = thread::Builder::new()
            .name("folio-load".to_owned())
            .spawn(move || {
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(op(storage.as_ref(), &id));
            });
        if let Err(e) = spawned {
            return Ok(Err(StorageError::io(e, None)));
        }
        rx.recv_timeout(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use folio_storage::MockStorage;

    use super::*;

    fn loader(storage: MockStorage, cache_enabled: bool) -> Loader {
        Loader::new(Arc::new(storage), Duration::from_secs(5), cache_enabled)
    }

    #[test]
    fn test_load() {
        let loader = loader(MockStorage::new().with_content("hello", "Hello"), false);

        let source = loader.load("hello").unwrap();

        assert_eq!(source.identifier, "hello");
        assert_eq!(&*source.raw_text, "Hello");
    }

    #[test]
    fn test_not_found() {
        let err = loader(MockStorage::new(), false).load("missing").unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_identifier() {
        let loader = loader(MockStorage::new(), false);

        for id in ["", "../secret", "/abs", "a\\b"] {
            let err = loader.load(id).unwrap_err();
            assert!(matches!(err, RenderError::InvalidIdentifier(_)), "id: {id:?}");
        }
    }

    #[test]
    fn test_cache_shares_text() {
        let loader = loader(MockStorage::new().with_content("post", "Body"), true);

        let first = loader.load("post").unwrap();
        let second = loader.load("post").unwrap();

        assert!(Arc::ptr_eq(&first.raw_text, &second.raw_text));
    }

    #[test]
    fn test_without_cache_reads_again() {
        let loader = loader(MockStorage::new().with_content("post", "Body"), false);

        let first = loader.load("post").unwrap();
        let second = loader.load("post").unwrap();

        assert!(!Arc::ptr_eq(&first.raw_text, &second.raw_text));
        assert_eq!(first, second);
    }

    #[test]
    fn test_timeout() {
        let storage = MockStorage::new()
            .with_content("slow", "Body")
            .with_read_delay(Duration::from_millis(500));
        let loader = Loader::new(Arc::new(storage), Duration::from_millis(20), false);

        let err = loader.load("slow").unwrap_err();

        assert!(matches!(err, RenderError::LoadTimeout { slug, .. } if slug == "slow"));
    }

    #[test]
    fn test_components_timeout() {
        let storage = MockStorage::new()
            .with_component("slow", "Note", "<aside/>")
            .with_components_delay(Duration::from_secs(3));
        let loader = Loader::new(Arc::new(storage), Duration::from_millis(20), false);
        let start = std::time::Instant::now();

        let err = loader.load_components("slow").unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(err.kind, StorageErrorKind::Timeout);
        assert_eq!(err.status, ErrorStatus::Temporary);
    }

    #[test]
    fn test_load_components() {
        let loader = loader(MockStorage::new().with_component("post", "Note", "<aside/>"), false);

        let overrides = loader.load_components("post").unwrap().unwrap();

        assert_eq!(overrides.len(), 1);
        assert_eq!(loader.load_components("other").unwrap(), None);
    }
}
