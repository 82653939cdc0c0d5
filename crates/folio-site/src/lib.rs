//! Document loading, assembly and rendering for Folio.
//!
//! This crate provides:
//! - [`Blog`]: render, list and batch-render documents from a [`Storage`]
//! - Front matter splitting with typed accessors
//! - [`RenderedDocument`]: the serializable output of one render
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use folio_config::Config;
//! use folio_site::Blog;
//!
//! let config = Config::load(None, None)?;
//! let blog = Blog::from_config(&config);
//!
//! let doc = blog.render("hello-world")?;
//! println!("{} ({})", doc.title, doc.formatted_date);
//! # Ok(())
//! # }
//! ```
//!
//! [`Storage`]: folio_storage::Storage

mod blog;
mod components;
mod date;
mod document;
mod error;
mod front_matter;
mod loader;

pub use blog::{Blog, RenderOutcome, pipeline_from_config};
pub use date::{format_date, parse_date};
pub use document::{PostSummary, RenderedDocument};
pub use error::RenderError;
pub use front_matter::{
    Fields, FrontMatter, FrontMatterError, split_document, split_front_matter,
};
pub use loader::DocumentSource;

// Re-export renderer types that appear in rendered documents.
pub use folio_renderer::{Diagnostic, DiagnosticKind, Node, TocEntry};
