//! Markdown rendering through a typed content tree.
//!
//! A body is parsed into a closed [`Node`] tree, rewritten by an ordered set
//! of [`Stage`]s, has its component placeholders substituted, and is finally
//! serialized to HTML.
//!
//! # Architecture
//!
//! - [`extract_headings`] scans the raw body and assigns anchor ids to level 2
//!   and 3 headings. The resulting [`AnchorMap`] is handed to the parser so
//!   heading nodes and TOC entries share the same [`AnchorId`].
//! - [`parse`] builds the tree from pulldown-cmark events.
//! - [`Pipeline`] runs typography, math, highlighting and live evaluation.
//!   Failures degrade the offending node and record a [`Diagnostic`]; they
//!   never abort the render.
//! - [`to_html`] serializes the tree, routing links and headings through the
//!   [`ComponentSet`].
//!
//! # Example
//!
//! ```
//! use folio_renderer::{MarkdownRenderer, Pipeline};
//!
//! let pipeline = Pipeline::default();
//! let result = MarkdownRenderer::new(&pipeline).render("## Hello\n\n\"Quoted\" text");
//!
//! assert_eq!(result.toc[0].id.as_ref(), "hello");
//! assert!(result.html.contains("“Quoted”"));
//! ```

mod anchor;
mod code_block;
mod component;
mod html;
mod node;
mod parser;
mod pipeline;
mod renderer;
mod toc;
mod util;

pub use anchor::{AnchorGenerator, AnchorMap, TocEntry, slugify};
pub use code_block::{FenceInfo, parse_fence_info};
pub use component::{Builtin, Component, ComponentSet, Props};
pub use html::to_html;
pub use node::{AnchorId, Node, NodeError, Token, TokenClass, plain_text};
pub use parser::parse;
pub use pipeline::{
    CommandEvaluator, Diagnostic, DiagnosticKind, EvalError, Evaluator, Language, MathError,
    Pipeline, Stage, StageContext, highlight, tex_to_mathml,
};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use toc::extract_headings;
pub use util::escape_html;
