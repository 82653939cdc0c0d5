//! Content tree produced by the parser and rewritten by pipeline stages.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Heading anchor identifier, shared between heading nodes and TOC entries.
pub type AnchorId = Arc<str>;

/// A node of the rendered body tree.
///
/// The set of variants is closed: every stage consumes and produces this type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum Node {
    Paragraph {
        children: Vec<Node>,
    },
    Heading {
        level: u8,
        id: AnchorId,
        children: Vec<Node>,
    },
    /// Fenced or indented code block before highlighting.
    CodeBlock {
        language: Option<String>,
        source: String,
        /// Fence info carried the `live` flag.
        live: bool,
    },
    HighlightedCode {
        language: String,
        source: String,
        live: bool,
        tokens: Vec<Token>,
    },
    /// A static code node followed by its evaluation output (plain text).
    LiveCode {
        code: Box<Node>,
        output: String,
    },
    InlineCode {
        code: String,
    },
    Link {
        href: String,
        title: String,
        children: Vec<Node>,
    },
    Image {
        src: String,
        title: String,
        alt: String,
    },
    Emphasis {
        children: Vec<Node>,
    },
    Strong {
        children: Vec<Node>,
    },
    Strikethrough {
        children: Vec<Node>,
    },
    BlockQuote {
        children: Vec<Node>,
    },
    List {
        start: Option<u64>,
        items: Vec<Node>,
    },
    Item {
        children: Vec<Node>,
    },
    Rule,
    SoftBreak,
    HardBreak,
    /// Raw HTML passed through from the source.
    Html {
        html: String,
    },
    /// TeX source awaiting the math stage.
    Math {
        display: bool,
        source: String,
    },
    MathRendered {
        display: bool,
        mathml: String,
    },
    /// Named component placeholder, e.g. `<Counter start="3" />`.
    Placeholder {
        name: String,
        attrs: BTreeMap<String, String>,
    },
    /// Trusted HTML produced by a component.
    Fragment {
        html: String,
    },
    /// A node whose transformation failed; the fallback is rendered instead.
    Degraded {
        fallback: Box<Node>,
        error: NodeError,
    },
    Text {
        value: String,
    },
}

impl Node {
    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Child nodes of container variants.
    #[must_use]
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Self::Paragraph { children }
            | Self::Heading { children, .. }
            | Self::Link { children, .. }
            | Self::Emphasis { children }
            | Self::Strong { children }
            | Self::Strikethrough { children }
            | Self::BlockQuote { children }
            | Self::Item { children } => Some(children),
            Self::List { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Mutable child nodes of container variants.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Paragraph { children }
            | Self::Heading { children, .. }
            | Self::Link { children, .. }
            | Self::Emphasis { children }
            | Self::Strong { children }
            | Self::Strikethrough { children }
            | Self::BlockQuote { children }
            | Self::Item { children } => Some(children),
            Self::List { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Whether the node renders as a block element.
    #[must_use]
    pub fn is_block(&self) -> bool {
        match self {
            Self::Paragraph { .. }
            | Self::Heading { .. }
            | Self::CodeBlock { .. }
            | Self::HighlightedCode { .. }
            | Self::LiveCode { .. }
            | Self::BlockQuote { .. }
            | Self::List { .. }
            | Self::Item { .. }
            | Self::Rule => true,
            Self::Math { display, .. } | Self::MathRendered { display, .. } => *display,
            Self::Degraded { fallback, .. } => fallback.is_block(),
            _ => false,
        }
    }

    /// Concatenated text content, as a reader would see it.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text { value } => out.push_str(value),
            Self::InlineCode { code } => out.push_str(code),
            Self::Math { source, .. } => out.push_str(source),
            Self::SoftBreak | Self::HardBreak => out.push(' '),
            Self::Image { alt, .. } => out.push_str(alt),
            Self::Degraded { fallback, .. } => fallback.collect_text(out),
            _ => {
                if let Some(children) = self.children() {
                    for child in children {
                        child.collect_text(out);
                    }
                }
            }
        }
    }
}

/// Plain text of a node sequence.
#[must_use]
pub fn plain_text(nodes: &[Node]) -> String {
    nodes.iter().map(Node::plain_text).collect()
}

/// Node-level transformation failure. Never aborts a render.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum NodeError {
    #[error("invalid math: {message}")]
    InvalidMath { message: String },
    #[error("no highlighter for language \"{language}\"")]
    HighlightUnsupported { language: String },
    #[error("evaluation failed: {message}")]
    EvaluationError { message: String },
}

/// Style class of a highlighted code span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum TokenClass {
    Keyword,
    String,
    Comment,
    Number,
    Function,
    Punctuation,
    Tag,
    Attr,
    Plain,
}

impl TokenClass {
    /// CSS class suffix for this token class.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::String => "string",
            Self::Comment => "comment",
            Self::Number => "number",
            Self::Function => "function",
            Self::Punctuation => "punctuation",
            Self::Tag => "tag",
            Self::Attr => "attr",
            Self::Plain => "plain",
        }
    }
}

/// A styled span of highlighted code.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    pub class: TokenClass,
    pub text: String,
}
