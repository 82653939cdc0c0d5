//! Typographic normalization of text runs.
//!
//! Straight quotes become curly quotes, `--` an en dash, `---` an em dash and
//! `...` an ellipsis. Code, math, raw HTML and components are left alone.

use crate::node::Node;

/// Stand-in for the character preceding non-text inline content.
const OPAQUE: char = 'x';

pub(super) fn apply(mut nodes: Vec<Node>) -> Vec<Node> {
    for node in &mut nodes {
        let mut prev = None;
        walk(node, &mut prev);
    }
    nodes
}

/// Rewrite text in place. `prev` is the last character emitted in the
/// current block, used to decide between opening and closing quotes.
fn walk(node: &mut Node, prev: &mut Option<char>) {
    match node {
        Node::Text { value } => {
            *value = smarten(value, prev);
        }
        Node::InlineCode { .. }
        | Node::Math { .. }
        | Node::MathRendered { .. }
        | Node::Html { .. }
        | Node::Placeholder { .. }
        | Node::Fragment { .. }
        | Node::Image { .. } => *prev = Some(OPAQUE),
        Node::SoftBreak | Node::HardBreak => *prev = Some(' '),
        _ => {
            let Some(children) = node.children_mut() else {
                return;
            };
            for child in children {
                // Every block starts a fresh quoting context.
                if child.is_block() {
                    *prev = None;
                }
                walk(child, prev);
            }
        }
    }
}

fn smarten(text: &str, prev: &mut Option<char>) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let emitted = match c {
            '-' if chars.get(i + 1) == Some(&'-') => {
                if chars.get(i + 2) == Some(&'-') {
                    i += 2;
                    '\u{2014}'
                } else {
                    i += 1;
                    '\u{2013}'
                }
            }
            '.' if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') => {
                i += 2;
                '\u{2026}'
            }
            '"' => {
                if opens_quote(*prev) {
                    '\u{201C}'
                } else {
                    '\u{201D}'
                }
            }
            '\'' => {
                if opens_quote(*prev) {
                    '\u{2018}'
                } else {
                    '\u{2019}'
                }
            }
            other => other,
        };
        out.push(emitted);
        *prev = Some(emitted);
        i += 1;
    }

    out
}

/// A quote opens at the start of a block or after whitespace, an opening
/// bracket, a dash or another opening quote.
fn opens_quote(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => {
            c.is_whitespace()
                || matches!(
                    c,
                    '(' | '[' | '{' | '\u{2013}' | '\u{2014}' | '\u{201C}' | '\u{2018}'
                )
        }
    }
}
