//! Read-only document storage for Folio.
//!
//! This crate provides a [`Storage`] trait for abstracting document lookup and
//! content retrieval from the underlying backend. This enables:
//!
//! - **Unit testing** without touching the real filesystem
//! - **Backend flexibility** (filesystem today, object stores later)
//! - **Clean separation** between the rendering pipeline and I/O
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Storage`] trait with `scan()`, `read()` and `components()`
//! - [`FsStorage`] implementation for filesystem backends with mtime-cached titles
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use folio_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("posts"));
//! for doc in storage.scan()? {
//!     println!("{}: {}", doc.path, doc.title);
//! }
//! ```

mod components;
mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use components::{ComponentOverrides, ComponentsError, parse_components};
pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{
    Document, ErrorStatus, Storage, StorageError, StorageErrorKind, validate_identifier,
};
