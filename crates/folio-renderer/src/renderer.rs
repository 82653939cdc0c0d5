//! Markdown body to content tree, transformed and serialized.

use crate::anchor::TocEntry;
use crate::component::ComponentSet;
use crate::html::to_html;
use crate::node::Node;
use crate::parser::parse;
use crate::pipeline::{Diagnostic, Evaluator, Pipeline, StageContext};
use crate::toc::extract_headings;

/// Result of rendering a markdown body.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderResult {
    /// Transformed content tree.
    pub nodes: Vec<Node>,
    /// Serialized HTML.
    pub html: String,
    /// Level 2 and 3 headings in document order.
    pub toc: Vec<TocEntry>,
    /// Node-level issues recorded during the render.
    pub diagnostics: Vec<Diagnostic>,
}

/// Renders markdown bodies through the transform pipeline.
///
/// The renderer is immutable and can be shared across threads; every call to
/// [`render`](Self::render) starts from fresh anchor and diagnostic state.
#[derive(Clone, Copy)]
pub struct MarkdownRenderer<'a> {
    pipeline: &'a Pipeline,
    components: &'a ComponentSet,
    evaluator: Option<&'a dyn Evaluator>,
}

impl<'a> MarkdownRenderer<'a> {
    /// Create a renderer with the default components and no evaluator.
    #[must_use]
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self {
            pipeline,
            components: ComponentSet::defaults(),
            evaluator: None,
        }
    }

    /// Use a document-specific component set.
    #[must_use]
    pub fn with_components(mut self, components: &'a ComponentSet) -> Self {
        self.components = components;
        self
    }

    /// Enable live evaluation with the given evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: &'a dyn Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Render a markdown body.
    #[must_use]
    pub fn render(&self, body: &str) -> RenderResult {
        let mut anchors = extract_headings(body);
        let nodes = parse(body, &mut anchors);

        let mut ctx = StageContext::new(&anchors, self.components);
        if let Some(evaluator) = self.evaluator {
            ctx = ctx.with_evaluator(evaluator);
        }
        let nodes = self.pipeline.run(nodes, &mut ctx);
        let diagnostics = ctx.into_diagnostics();

        let html = to_html(&nodes, self.components);
        RenderResult {
            nodes,
            html,
            toc: anchors.toc().to_vec(),
            diagnostics,
        }
    }
}
