//! TeX to MathML translation.
//!
//! Sources are checked for balanced groups and bounded nesting before they
//! reach `latex2mathml`, so hostile input degrades the node instead of
//! exhausting the stack.

use latex2mathml::{DisplayStyle, latex_to_mathml};

use crate::node::{Node, NodeError};

use super::{StageContext, rewrite};

/// Deepest allowed nesting of `{}` groups and `\left`/`\right` pairs.
const MAX_NESTING: usize = 64;

/// Most commands and scripts allowed in one expression.
const MAX_COMMANDS: usize = 1024;

/// TeX translation error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("unbalanced braces")]
    UnbalancedBraces,
    #[error("\\left without matching \\right")]
    UnmatchedLeft,
    #[error("\\right without matching \\left")]
    UnmatchedRight,
    #[error("nesting deeper than 64 levels")]
    TooDeep,
    #[error("more than 1024 commands")]
    TooComplex,
    #[error("{0}")]
    Latex(String),
}

pub(super) fn apply(nodes: Vec<Node>, ctx: &mut StageContext<'_>) -> Vec<Node> {
    rewrite(nodes, &mut |node| {
        Some(match node {
            Node::Math { display, source } => match tex_to_mathml(&source, display) {
                Ok(mathml) => Node::MathRendered { display, mathml },
                Err(err) => ctx.degrade(
                    Node::Math { display, source },
                    NodeError::InvalidMath {
                        message: err.to_string(),
                    },
                ),
            },
            other => other,
        })
    })
}

/// Translate TeX source to a MathML `<math>` element.
pub fn tex_to_mathml(source: &str, display: bool) -> Result<String, MathError> {
    let source = source.trim();
    check_structure(source)?;
    let style = if display {
        DisplayStyle::Block
    } else {
        DisplayStyle::Inline
    };
    latex_to_mathml(source, style).map_err(|e| MathError::Latex(e.to_string()))
}

/// Validate group balance, nesting depth and command count.
fn check_structure(source: &str) -> Result<(), MathError> {
    let mut braces = 0usize;
    let mut fences = 0usize;
    let mut commands = 0usize;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek().filter(|c| c.is_ascii_alphabetic()) {
                    name.push(next);
                    chars.next();
                }
                if name.is_empty() {
                    // Escaped symbol such as `\{`.
                    chars.next();
                    continue;
                }
                commands += 1;
                match name.as_str() {
                    "left" => fences += 1,
                    "right" => fences = fences.checked_sub(1).ok_or(MathError::UnmatchedRight)?,
                    _ => {}
                }
            }
            '{' => braces += 1,
            '}' => braces = braces.checked_sub(1).ok_or(MathError::UnbalancedBraces)?,
            '^' | '_' => commands += 1,
            _ => {}
        }
        if braces + fences > MAX_NESTING {
            return Err(MathError::TooDeep);
        }
        if commands > MAX_COMMANDS {
            return Err(MathError::TooComplex);
        }
    }

    if braces > 0 {
        return Err(MathError::UnbalancedBraces);
    }
    if fences > 0 {
        return Err(MathError::UnmatchedLeft);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::anchor::AnchorMap;
    use crate::component::ComponentSet;
    use crate::pipeline::DiagnosticKind;

    #[test]
    fn test_translates_scripts_and_fractions() {
        assert!(tex_to_mathml("x^2", false).unwrap().contains("<msup>"));
        assert!(tex_to_mathml(r"\frac{1}{2}", false).unwrap().contains("<mfrac>"));
    }

    #[test]
    fn test_display_style() {
        let block = tex_to_mathml("x", true).unwrap();
        let inline = tex_to_mathml("x", false).unwrap();

        assert!(block.starts_with("<math"));
        assert!(block.contains(r#"display="block""#));
        assert!(!inline.contains(r#"display="block""#));
    }

    #[test]
    fn test_structure_errors() {
        assert_eq!(tex_to_mathml("{x", false), Err(MathError::UnbalancedBraces));
        assert_eq!(tex_to_mathml("x}", false), Err(MathError::UnbalancedBraces));
        assert_eq!(tex_to_mathml(r"\left( x", false), Err(MathError::UnmatchedLeft));
        assert_eq!(tex_to_mathml(r"x \right)", false), Err(MathError::UnmatchedRight));
    }

    #[test]
    fn test_escaped_braces_are_not_groups() {
        assert_eq!(check_structure(r"\{ x \}"), Ok(()));
        assert_eq!(check_structure(r"\left\{ x \right."), Ok(()));
    }

    #[test]
    fn test_limits_match_messages() {
        assert_eq!(
            MathError::TooDeep.to_string(),
            format!("nesting deeper than {MAX_NESTING} levels")
        );
        assert_eq!(
            MathError::TooComplex.to_string(),
            format!("more than {MAX_COMMANDS} commands")
        );
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let allowed = format!("{}x{}", "{".repeat(MAX_NESTING), "}".repeat(MAX_NESTING));
        assert_eq!(check_structure(&allowed), Ok(()));

        let source = "{".repeat(100_000);
        assert_eq!(tex_to_mathml(&source, true), Err(MathError::TooDeep));

        let fences = r"\left(".repeat(MAX_NESTING + 1);
        assert_eq!(tex_to_mathml(&fences, false), Err(MathError::TooDeep));
    }

    #[test]
    fn test_command_chains_rejected() {
        let source = format!("{}x", r"\sqrt".repeat(50_000));

        assert_eq!(tex_to_mathml(&source, false), Err(MathError::TooComplex));
    }

    #[test]
    fn test_stage_degrades_invalid_math() {
        let anchors = AnchorMap::new();
        let components = ComponentSet::new();
        let mut ctx = StageContext::new(&anchors, &components);
        let nodes = vec![
            Node::Math {
                display: false,
                source: "x^2".to_owned(),
            },
            Node::Math {
                display: true,
                source: r"\frac{1".to_owned(),
            },
        ];

        let nodes = apply(nodes, &mut ctx);

        assert!(matches!(nodes[0], Node::MathRendered { display: false, .. }));
        let Node::Degraded { fallback, error } = &nodes[1] else {
            panic!("expected degraded node");
        };
        assert_eq!(
            **fallback,
            Node::Math {
                display: true,
                source: r"\frac{1".to_owned()
            }
        );
        assert_eq!(
            error,
            &NodeError::InvalidMath {
                message: "unbalanced braces".to_owned()
            }
        );
        assert_eq!(ctx.diagnostics()[0].kind, DiagnosticKind::InvalidMath);
    }
}
