//! Placeholder substitution.

use crate::component::Props;
use crate::node::Node;

use super::{DiagnosticKind, StageContext, rewrite};

/// Replace every placeholder with its component's rendered fragment.
///
/// Unknown names are dropped from the output and reported.
pub(super) fn apply(nodes: Vec<Node>, ctx: &mut StageContext<'_>) -> Vec<Node> {
    rewrite(nodes, &mut |node| match node {
        Node::Placeholder { name, attrs } => {
            let props = Props::new().attrs(&attrs).toc(ctx.anchors().toc());
            match ctx.components().render(&name, &props) {
                Some(html) => Some(Node::Fragment { html }),
                None => {
                    ctx.report(
                        DiagnosticKind::UnresolvedComponent,
                        format!("unknown component `{name}`"),
                    );
                    None
                }
            }
        }
        other => Some(other),
    })
}
