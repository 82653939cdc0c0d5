//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`] for reading documents from the local filesystem
//! with mtime-based caching for title extraction.
//!
//! # Layout
//!
//! A document identifier maps to either a directory or a single file:
//! - `<root>/<slug>/index.md` (preferred, may carry `components.yaml` next to it)
//! - `<root>/<slug>.md`

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use regex::Regex;

use crate::components::{ComponentOverrides, parse_components};
use crate::storage::{Document, Storage, StorageError, StorageErrorKind, validate_identifier};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// File name of a directory document.
const INDEX_FILE: &str = "index.md";

/// File name of the component override sidecar.
const COMPONENTS_FILE: &str = "components.yaml";

/// Cached file metadata for incremental title extraction.
#[derive(Clone, Debug)]
struct CachedFile {
    /// File modification time.
    mtime: SystemTime,
    /// Extracted title from the file.
    title: String,
}

/// Filesystem storage implementation.
///
/// Scans a source directory recursively for documents and extracts titles
/// from the `title:` front matter line. Uses mtime caching to avoid re-reading
/// unchanged files during repeated scans.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use folio_storage::{FsStorage, Storage};
///
/// let storage = FsStorage::new(PathBuf::from("posts"));
/// let text = storage.read("hello-world")?;
/// ```
pub struct FsStorage {
    /// Root directory for document storage.
    source_dir: PathBuf,
    /// Regex for extracting the front matter title line.
    title_regex: Regex,
    /// Mtime cache for incremental title extraction.
    mtime_cache: Mutex<HashMap<PathBuf, CachedFile>>,
}

impl FsStorage {
    /// Create a new filesystem storage rooted at `source_dir`.
    ///
    /// # Panics
    ///
    /// Panics if the internal title regex fails to compile.
    /// This should never happen as the regex is a compile-time constant.
    #[must_use]
    pub fn new(source_dir: PathBuf) -> Self {
        Self {
            source_dir,
            title_regex: Regex::new(r#"(?m)^title:\s*["']?(.+?)["']?\s*$"#).unwrap(),
            mtime_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Root directory of this storage.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Resolve an identifier to the backing markdown file.
    fn resolve(&self, id: &str) -> Result<PathBuf, StorageError> {
        validate_identifier(id).map_err(|e| e.with_backend(BACKEND))?;

        let dir_index = self.source_dir.join(id).join(INDEX_FILE);
        if dir_index.is_file() {
            return Ok(dir_index);
        }

        let file = self.source_dir.join(format!("{id}.md"));
        if file.is_file() {
            return Ok(file);
        }

        Err(StorageError::not_found(dir_index).with_backend(BACKEND))
    }

    /// Scan directory recursively and collect documents.
    fn scan_directory(&self, dir_path: &Path, prefix: &str, documents: &mut Vec<Document>) {
        let Ok(entries) = fs::read_dir(dir_path) else {
            return;
        };

        let mut entries: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                let name = e.file_name().to_string_lossy().into_owned();
                (e, is_dir, name)
            })
            .collect();
        entries.sort_by(|(_, _, a), (_, _, b)| a.cmp(b));

        for (entry, is_dir, name) in entries {
            // Skip hidden and underscore-prefixed files/dirs
            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }

            let path = entry.path();
            let id = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };

            if is_dir {
                let index = path.join(INDEX_FILE);
                if index.is_file() {
                    let title = self.get_title(&index, &name);
                    documents.push(Document {
                        path: id.clone(),
                        title,
                    });
                }
                self.scan_directory(&path, &id, documents);
            } else if name != INDEX_FILE
                && let Some(stem) = name.strip_suffix(".md")
            {
                let id = id.strip_suffix(".md").unwrap_or(&id).to_owned();
                let title = self.get_title(&path, stem);
                documents.push(Document { path: id, title });
            }
        }
    }

    /// Get title for a file, using mtime cache when possible.
    fn get_title(&self, file_path: &Path, fallback_name: &str) -> String {
        let current_mtime = fs::metadata(file_path).ok().and_then(|m| m.modified().ok());

        {
            let cache = self
                .mtime_cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let (Some(cached), Some(mtime)) = (cache.get(file_path), current_mtime)
                && cached.mtime == mtime
            {
                return cached.title.clone();
            }
        }

        let title = self
            .extract_title_from_content(file_path)
            .unwrap_or_else(|| title_from_name(fallback_name));

        if let Some(mtime) = current_mtime {
            self.mtime_cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(
                    file_path.to_path_buf(),
                    CachedFile {
                        mtime,
                        title: title.clone(),
                    },
                );
        }

        title
    }

    /// Extract the `title:` value from the leading front matter block.
    fn extract_title_from_content(&self, file_path: &Path) -> Option<String> {
        let content = fs::read_to_string(file_path).ok()?;
        let rest = content.strip_prefix("---")?;
        let end = rest.find("\n---")?;
        self.title_regex
            .captures(&rest[..end])
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_owned())
    }
}

/// Generate a title from a file or directory name.
fn title_from_name(name: &str) -> String {
    name.replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl Storage for FsStorage {
    fn scan(&self) -> Result<Vec<Document>, StorageError> {
        if !self.source_dir.exists() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        self.scan_directory(&self.source_dir, "", &mut documents);
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(documents)
    }

    fn read(&self, path: &str) -> Result<String, StorageError> {
        let full_path = self.resolve(path)?;
        fs::read_to_string(&full_path)
            .map_err(|e| StorageError::io(e, Some(full_path.clone())).with_backend(BACKEND))
    }

    fn components(&self, path: &str) -> Result<Option<ComponentOverrides>, StorageError> {
        validate_identifier(path).map_err(|e| e.with_backend(BACKEND))?;

        let sidecar = self.source_dir.join(path).join(COMPONENTS_FILE);
        let content = match fs::read_to_string(&sidecar) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(e, Some(sidecar)).with_backend(BACKEND)),
        };

        parse_components(&content).map(Some).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidData)
                .with_path(sidecar)
                .with_backend(BACKEND)
                .with_source(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_fs_storage_is_send_sync() {
        assert_send_sync::<FsStorage>();
    }

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write_post(root: &Path, slug: &str, content: &str) {
        let dir = root.join(slug);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.md"), content).unwrap();
    }

    #[test]
    fn test_scan_empty_dir() {
        let temp_dir = create_test_dir();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        assert!(storage.scan().unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_dir() {
        let storage = FsStorage::new(PathBuf::from("/nonexistent/posts"));

        assert!(storage.scan().unwrap().is_empty());
    }

    #[test]
    fn test_scan_directories_and_files() {
        let temp_dir = create_test_dir();
        write_post(
            temp_dir.path(),
            "hello-world",
            "---\ntitle: Hello, World\ndate: 2024-01-01\n---\nBody",
        );
        fs::write(
            temp_dir.path().join("quick-note.md"),
            "---\ntitle: \"Quick Note\"\ndate: 2024-02-01\n---\nBody",
        )
        .unwrap();

        let docs = storage_docs(temp_dir.path());

        assert_eq!(
            docs,
            vec![
                Document {
                    path: "hello-world".to_owned(),
                    title: "Hello, World".to_owned(),
                },
                Document {
                    path: "quick-note".to_owned(),
                    title: "Quick Note".to_owned(),
                },
            ]
        );
    }

    fn storage_docs(root: &Path) -> Vec<Document> {
        FsStorage::new(root.to_path_buf()).scan().unwrap()
    }

    #[test]
    fn test_scan_falls_back_to_name() {
        let temp_dir = create_test_dir();
        write_post(temp_dir.path(), "no-front-matter", "Just text");

        let docs = storage_docs(temp_dir.path());

        assert_eq!(docs[0].title, "No Front Matter");
    }

    #[test]
    fn test_scan_skips_hidden_and_underscore() {
        let temp_dir = create_test_dir();
        write_post(temp_dir.path(), ".draft", "---\ntitle: Draft\n---\n");
        write_post(temp_dir.path(), "_partial", "---\ntitle: Partial\n---\n");
        write_post(temp_dir.path(), "visible", "---\ntitle: Visible\n---\n");

        let docs = storage_docs(temp_dir.path());

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, "visible");
    }

    #[test]
    fn test_scan_nested_documents() {
        let temp_dir = create_test_dir();
        write_post(temp_dir.path(), "notes", "---\ntitle: Notes\n---\n");
        write_post(temp_dir.path(), "notes/traits", "---\ntitle: Traits\n---\n");

        let docs = storage_docs(temp_dir.path());
        let paths: Vec<_> = docs.iter().map(|d| d.path.as_str()).collect();

        assert_eq!(paths, vec!["notes", "notes/traits"]);
    }

    #[test]
    fn test_read_directory_document() {
        let temp_dir = create_test_dir();
        write_post(temp_dir.path(), "hello", "---\ntitle: Hello\n---\nBody");
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        assert_eq!(storage.read("hello").unwrap(), "---\ntitle: Hello\n---\nBody");
    }

    #[test]
    fn test_read_file_document() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("single.md"), "Content").unwrap();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        assert_eq!(storage.read("single").unwrap(), "Content");
    }

    #[test]
    fn test_read_missing_document() {
        let temp_dir = create_test_dir();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        let err = storage.read("missing").unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.backend, Some("Fs"));
    }

    #[test]
    fn test_read_rejects_traversal() {
        let temp_dir = create_test_dir();
        let storage = FsStorage::new(temp_dir.path().join("posts"));
        fs::write(temp_dir.path().join("secret.md"), "secret").unwrap();

        let err = storage.read("../secret").unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::InvalidPath);
    }

    #[test]
    fn test_mtime_cache_detects_changes() {
        let temp_dir = create_test_dir();
        write_post(temp_dir.path(), "post", "---\ntitle: Original\n---\n");
        let storage = FsStorage::new(temp_dir.path().to_path_buf());
        assert_eq!(storage.scan().unwrap()[0].title, "Original");

        write_post(temp_dir.path(), "post", "---\ntitle: Updated\n---\n");
        let file = temp_dir.path().join("post/index.md");
        let later = SystemTime::now() + std::time::Duration::from_secs(5);
        fs::File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert_eq!(storage.scan().unwrap()[0].title, "Updated");
    }

    #[test]
    fn test_components_missing_is_none() {
        let temp_dir = create_test_dir();
        write_post(temp_dir.path(), "post", "Body");
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        assert_eq!(storage.components("post").unwrap(), None);
    }

    #[test]
    fn test_components_loaded_from_sidecar() {
        let temp_dir = create_test_dir();
        write_post(temp_dir.path(), "post", "Body");
        fs::write(
            temp_dir.path().join("post/components.yaml"),
            "Counter: \"<button>0</button>\"\n",
        )
        .unwrap();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        let components = storage.components("post").unwrap().unwrap();

        assert_eq!(components["Counter"], "<button>0</button>");
    }

    #[test]
    fn test_components_invalid_yaml() {
        let temp_dir = create_test_dir();
        write_post(temp_dir.path(), "post", "Body");
        fs::write(temp_dir.path().join("post/components.yaml"), "- a\n- b\n").unwrap();
        let storage = FsStorage::new(temp_dir.path().to_path_buf());

        let err = storage.components("post").unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::InvalidData);
    }

    #[test]
    fn test_title_from_name() {
        assert_eq!(title_from_name("setup-guide"), "Setup Guide");
        assert_eq!(title_from_name("my_post"), "My Post");
    }
}
