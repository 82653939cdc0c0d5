//! Transform pipeline over the content tree.
//!
//! Stages run in a fixed order; each consumes the previous stage's output.
//! Placeholder substitution always runs last. Node-level failures never abort
//! a render: the node degrades and a [`Diagnostic`] is recorded.

mod evaluate;
mod highlight;
mod math;
mod substitute;
mod typography;

use std::time::Instant;

pub use evaluate::{CommandEvaluator, EvalError, Evaluator};
pub use highlight::{Language, highlight};
pub use math::{MathError, tex_to_mathml};

use crate::anchor::AnchorMap;
use crate::component::ComponentSet;
use crate::node::{Node, NodeError};

/// A transform stage. Declaration order is execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Curly quotes, dashes and ellipses in text runs.
    Typography,
    /// TeX math to MathML.
    Math,
    /// Syntax highlighting of fenced code.
    Highlight,
    /// Live evaluation of code blocks marked `live`.
    Evaluate,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [
        Stage::Typography,
        Stage::Math,
        Stage::Highlight,
        Stage::Evaluate,
    ];

    /// Stage name for logging.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Typography => "typography",
            Self::Math => "math",
            Self::Highlight => "highlight",
            Self::Evaluate => "evaluate",
        }
    }

    /// Apply the stage to a tree.
    pub fn apply(self, nodes: Vec<Node>, ctx: &mut StageContext<'_>) -> Vec<Node> {
        match self {
            Self::Typography => typography::apply(nodes),
            Self::Math => math::apply(nodes, ctx),
            Self::Highlight => highlight::apply(nodes, ctx),
            Self::Evaluate => evaluate::apply(nodes, ctx),
        }
    }
}

/// Kind of a node-level diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum DiagnosticKind {
    InvalidMath,
    HighlightUnsupported,
    EvaluationError,
    UnresolvedComponent,
}

/// Non-fatal issue recorded during a render.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl From<&NodeError> for Diagnostic {
    fn from(error: &NodeError) -> Self {
        let kind = match error {
            NodeError::InvalidMath { .. } => DiagnosticKind::InvalidMath,
            NodeError::HighlightUnsupported { .. } => DiagnosticKind::HighlightUnsupported,
            NodeError::EvaluationError { .. } => DiagnosticKind::EvaluationError,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

/// Shared state passed to every stage of one render.
pub struct StageContext<'a> {
    anchors: &'a AnchorMap,
    components: &'a ComponentSet,
    evaluator: Option<&'a dyn Evaluator>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> StageContext<'a> {
    /// Create a context without an evaluator.
    #[must_use]
    pub fn new(anchors: &'a AnchorMap, components: &'a ComponentSet) -> Self {
        Self {
            anchors,
            components,
            evaluator: None,
            diagnostics: Vec::new(),
        }
    }

    /// Set the evaluator used by [`Stage::Evaluate`].
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: &'a dyn Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Anchors assigned to this document's headings.
    #[must_use]
    pub fn anchors(&self) -> &'a AnchorMap {
        self.anchors
    }

    /// Components available for substitution.
    #[must_use]
    pub fn components(&self) -> &'a ComponentSet {
        self.components
    }

    /// Record a degraded node.
    pub fn degrade(&mut self, fallback: Node, error: NodeError) -> Node {
        if matches!(error, NodeError::HighlightUnsupported { .. }) {
            tracing::debug!(%error, "Node degraded");
        } else {
            tracing::warn!(%error, "Node degraded");
        }
        self.diagnostics.push(Diagnostic::from(&error));
        Node::Degraded {
            fallback: Box::new(fallback),
            error,
        }
    }

    /// Record a diagnostic that has no degraded node.
    pub fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(?kind, %message, "Render diagnostic");
        self.diagnostics.push(Diagnostic { kind, message });
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the context, returning the recorded diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn evaluator(&self) -> Option<&'a dyn Evaluator> {
        self.evaluator
    }
}

/// An ordered set of enabled stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Create a pipeline from enabled stages.
    ///
    /// Stages are sorted into execution order and deduplicated.
    pub fn new(stages: impl IntoIterator<Item = Stage>) -> Self {
        let mut stages: Vec<Stage> = stages.into_iter().collect();
        stages.sort_unstable();
        stages.dedup();
        Self { stages }
    }

    /// Enabled stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run all enabled stages, then substitute placeholders.
    pub fn run(&self, mut nodes: Vec<Node>, ctx: &mut StageContext<'_>) -> Vec<Node> {
        for stage in &self.stages {
            let start = Instant::now();
            nodes = stage.apply(nodes, ctx);
            tracing::debug!(
                stage = stage.as_str(),
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Stage complete"
            );
        }
        substitute::apply(nodes, ctx)
    }
}

impl Default for Pipeline {
    /// All stages except evaluation.
    fn default() -> Self {
        Self::new([Stage::Typography, Stage::Math, Stage::Highlight])
    }
}

/// Rebuild a tree bottom-up, replacing each node with `f(node)`.
///
/// Children are rewritten before their parent is passed to `f`.
pub(crate) fn rewrite<F>(nodes: Vec<Node>, f: &mut F) -> Vec<Node>
where
    F: FnMut(Node) -> Option<Node>,
{
    nodes
        .into_iter()
        .filter_map(|mut node| {
            if let Some(children) = node.children_mut() {
                let taken = std::mem::take(children);
                *children = rewrite(taken, f);
            }
            f(node)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_pipeline_orders_and_dedups() {
        let pipeline = Pipeline::new([
            Stage::Evaluate,
            Stage::Typography,
            Stage::Highlight,
            Stage::Typography,
        ]);

        assert_eq!(
            pipeline.stages(),
            &[Stage::Typography, Stage::Highlight, Stage::Evaluate]
        );
    }

    #[test]
    fn test_default_pipeline_excludes_evaluate() {
        assert_eq!(
            Pipeline::default().stages(),
            &[Stage::Typography, Stage::Math, Stage::Highlight]
        );
    }

    #[test]
    fn test_rewrite_bottom_up() {
        let nodes = vec![Node::Paragraph {
            children: vec![Node::text("a"), Node::Rule, Node::text("b")],
        }];
        let mut visited = Vec::new();

        let result = rewrite(nodes, &mut |node| {
            visited.push(matches!(node, Node::Paragraph { .. }));
            (!matches!(node, Node::Rule)).then_some(node)
        });

        assert_eq!(visited, vec![false, false, false, true]);
        assert_eq!(
            result,
            vec![Node::Paragraph {
                children: vec![Node::text("a"), Node::text("b")],
            }]
        );
    }

    #[test]
    fn test_degrade_records_diagnostic() {
        let anchors = AnchorMap::new();
        let components = ComponentSet::new();
        let mut ctx = StageContext::new(&anchors, &components);

        let node = ctx.degrade(
            Node::text("x"),
            NodeError::InvalidMath {
                message: "unbalanced braces".to_owned(),
            },
        );

        assert!(matches!(node, Node::Degraded { .. }));
        assert_eq!(
            ctx.diagnostics(),
            &[Diagnostic {
                kind: DiagnosticKind::InvalidMath,
                message: "invalid math: unbalanced braces".to_owned(),
            }]
        );
    }
}
