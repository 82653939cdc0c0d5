//! HTML serialization of the content tree.
//!
//! Links and `h2`..`h4` headings go through the component set so documents
//! can override them. Text and code are escaped; only raw HTML, component
//! fragments and rendered math are emitted verbatim.

use std::fmt::Write;

use crate::component::{ComponentSet, Props};
use crate::node::{Node, NodeError, Token, TokenClass};
use crate::util::escape_html;

/// Serialize nodes to an HTML string.
#[must_use]
pub fn to_html(nodes: &[Node], components: &ComponentSet) -> String {
    let mut out = String::new();
    HtmlWriter { components }.write_all(nodes, &mut out);
    out
}

struct HtmlWriter<'a> {
    components: &'a ComponentSet,
}

impl HtmlWriter<'_> {
    fn write_all(&self, nodes: &[Node], out: &mut String) {
        for node in nodes {
            self.write(node, out);
        }
    }

    fn inner(&self, children: &[Node]) -> String {
        let mut html = String::new();
        self.write_all(children, &mut html);
        html
    }

    fn wrap(&self, tag: &str, children: &[Node], out: &mut String) {
        let _ = write!(out, "<{tag}>");
        self.write_all(children, out);
        let _ = write!(out, "</{tag}>");
    }

    fn write(&self, node: &Node, out: &mut String) {
        match node {
            Node::Paragraph { children } => self.wrap("p", children, out),
            Node::Heading {
                level,
                id,
                children,
            } => self.heading(*level, id, children, out),
            Node::CodeBlock {
                language, source, ..
            } => code_block(language.as_deref(), source, out),
            Node::HighlightedCode {
                language, tokens, ..
            } => highlighted_code(language, tokens, out),
            Node::LiveCode { code, output } => {
                out.push_str(r#"<div class="live-code">"#);
                self.write(code, out);
                let _ = write!(
                    out,
                    r#"<output class="live-output"><pre>{}</pre></output></div>"#,
                    escape_html(output)
                );
            }
            Node::InlineCode { code } => {
                let _ = write!(out, "<code>{}</code>", escape_html(code));
            }
            Node::Link {
                href,
                title,
                children,
            } => self.link(href, title, children, out),
            Node::Image { src, title, alt } => {
                let _ = write!(out, r#"<img src="{}" alt="{}""#, escape_html(src), escape_html(alt));
                if !title.is_empty() {
                    let _ = write!(out, r#" title="{}""#, escape_html(title));
                }
                out.push('>');
            }
            Node::Emphasis { children } => self.wrap("em", children, out),
            Node::Strong { children } => self.wrap("strong", children, out),
            Node::Strikethrough { children } => self.wrap("del", children, out),
            Node::BlockQuote { children } => self.wrap("blockquote", children, out),
            Node::List { start, items } => match start {
                None => self.wrap("ul", items, out),
                Some(1) => self.wrap("ol", items, out),
                Some(start) => {
                    let _ = write!(out, r#"<ol start="{start}">"#);
                    self.write_all(items, out);
                    out.push_str("</ol>");
                }
            },
            Node::Item { children } => self.wrap("li", children, out),
            Node::Rule => out.push_str("<hr>"),
            Node::SoftBreak => out.push('\n'),
            Node::HardBreak => out.push_str("<br>"),
            Node::Html { html } | Node::Fragment { html } => out.push_str(html),
            Node::Math { display, source } => {
                let class = if *display { "math math-display" } else { "math" };
                let _ = write!(out, r#"<code class="{class}">{}</code>"#, escape_html(source));
            }
            Node::MathRendered { mathml, .. } => out.push_str(mathml),
            // Unresolved placeholders never reach the serializer after
            // substitution; render nothing if one does.
            Node::Placeholder { .. } => {}
            Node::Degraded { fallback, error } => {
                self.write(fallback, out);
                error_badge(error, out);
            }
            Node::Text { value } => out.push_str(&escape_html(value)),
        }
    }

    fn heading(&self, level: u8, id: &str, children: &[Node], out: &mut String) {
        let inner = self.inner(children);
        let props = Props::new()
            .attr("level", level.to_string())
            .attr("id", id)
            .children(inner);
        if let Some(html) = self.components.render(&format!("h{level}"), &props) {
            out.push_str(&html);
        } else {
            let _ = write!(out, r#"<h{level} id="{}">"#, escape_html(id));
            self.write_all(children, out);
            let _ = write!(out, "</h{level}>");
        }
    }

    fn link(&self, href: &str, title: &str, children: &[Node], out: &mut String) {
        let props = Props::new()
            .attr("href", href)
            .attr("title", title)
            .children(self.inner(children));
        if let Some(html) = self.components.render("a", &props) {
            out.push_str(&html);
        } else {
            let _ = write!(out, r#"<a href="{}">"#, escape_html(href));
            self.write_all(children, out);
            out.push_str("</a>");
        }
    }
}

fn code_block(language: Option<&str>, source: &str, out: &mut String) {
    match language {
        Some(language) => {
            let _ = write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(language),
                escape_html(source)
            );
        }
        None => {
            let _ = write!(out, "<pre><code>{}</code></pre>", escape_html(source));
        }
    }
}

fn highlighted_code(language: &str, tokens: &[Token], out: &mut String) {
    let _ = write!(
        out,
        r#"<pre class="highlight"><code class="language-{}">"#,
        escape_html(language)
    );
    for token in tokens {
        if token.class == TokenClass::Plain {
            out.push_str(&escape_html(&token.text));
        } else {
            let _ = write!(
                out,
                r#"<span class="tok-{}">{}</span>"#,
                token.class.as_str(),
                escape_html(&token.text)
            );
        }
    }
    out.push_str("</code></pre>");
}

/// Visible marker after a degraded node. Unsupported highlight languages are
/// not worth flagging to readers.
fn error_badge(error: &NodeError, out: &mut String) {
    if matches!(error, NodeError::HighlightUnsupported { .. }) {
        return;
    }
    let _ = write!(
        out,
        r#"<span class="render-error" role="note">{}</span>"#,
        escape_html(&error.to_string())
    );
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn html(nodes: &[Node]) -> String {
        to_html(nodes, ComponentSet::defaults())
    }

    #[test]
    fn test_paragraph_escapes_text() {
        let nodes = vec![Node::Paragraph {
            children: vec![
                Node::text("a < b & "),
                Node::Strong {
                    children: vec![Node::text("c")],
                },
            ],
        }];

        assert_eq!(html(&nodes), "<p>a &lt; b &amp; <strong>c</strong></p>");
    }

    #[test]
    fn test_heading_uses_component() {
        let nodes = vec![Node::Heading {
            level: 2,
            id: Arc::from("intro"),
            children: vec![Node::text("Intro")],
        }];

        assert_eq!(
            html(&nodes),
            r##"<h2 id="intro"><a class="anchor" href="#intro" aria-hidden="true">#</a>Intro</h2>"##
        );
    }

    #[test]
    fn test_heading_fallback_for_other_levels() {
        let nodes = vec![Node::Heading {
            level: 5,
            id: Arc::from("deep"),
            children: vec![Node::text("Deep")],
        }];

        assert_eq!(html(&nodes), r#"<h5 id="deep">Deep</h5>"#);
    }

    #[test]
    fn test_heading_override() {
        let overrides = BTreeMap::from([(
            "h2".to_owned(),
            r#"<h2 id="{{id}}" class="fancy">{{children}}</h2>"#.to_owned(),
        )]);
        let components = ComponentSet::with_overrides(&overrides);
        let nodes = vec![Node::Heading {
            level: 2,
            id: Arc::from("intro"),
            children: vec![Node::text("Intro")],
        }];

        assert_eq!(
            to_html(&nodes, &components),
            r#"<h2 id="intro" class="fancy">Intro</h2>"#
        );
    }

    #[test]
    fn test_link_and_image() {
        let nodes = vec![
            Node::Link {
                href: "/about".to_owned(),
                title: String::new(),
                children: vec![Node::text("About")],
            },
            Node::Image {
                src: "a.png".to_owned(),
                title: "T".to_owned(),
                alt: "pic".to_owned(),
            },
        ];

        assert_eq!(
            html(&nodes),
            r#"<a href="/about">About</a><img src="a.png" alt="pic" title="T">"#
        );
    }

    #[test]
    fn test_code_blocks() {
        let nodes = vec![
            Node::CodeBlock {
                language: None,
                source: "<x>".to_owned(),
                live: false,
            },
            Node::HighlightedCode {
                language: "rust".to_owned(),
                source: "fn f".to_owned(),
                live: false,
                tokens: vec![
                    Token {
                        class: TokenClass::Keyword,
                        text: "fn".to_owned(),
                    },
                    Token {
                        class: TokenClass::Plain,
                        text: " f".to_owned(),
                    },
                ],
            },
        ];

        assert_eq!(
            html(&nodes),
            concat!(
                "<pre><code>&lt;x&gt;</code></pre>",
                r#"<pre class="highlight"><code class="language-rust"><span class="tok-keyword">fn</span> f</code></pre>"#
            )
        );
    }

    #[test]
    fn test_live_output_escaped() {
        let nodes = vec![Node::LiveCode {
            code: Box::new(Node::CodeBlock {
                language: Some("sh".to_owned()),
                source: "echo".to_owned(),
                live: true,
            }),
            output: "<script>".to_owned(),
        }];

        assert_eq!(
            html(&nodes),
            concat!(
                r#"<div class="live-code"><pre><code class="language-sh">echo</code></pre>"#,
                r#"<output class="live-output"><pre>&lt;script&gt;</pre></output></div>"#
            )
        );
    }

    #[test]
    fn test_degraded_math_shows_source_and_badge() {
        let nodes = vec![Node::Degraded {
            fallback: Box::new(Node::Math {
                display: false,
                source: "\\frac{a".to_owned(),
            }),
            error: NodeError::InvalidMath {
                message: "unbalanced braces".to_owned(),
            },
        }];

        assert_eq!(
            html(&nodes),
            r#"<code class="math">\frac{a</code><span class="render-error" role="note">invalid math: unbalanced braces</span>"#
        );
    }

    #[test]
    fn test_unsupported_highlight_has_no_badge() {
        let nodes = vec![Node::Degraded {
            fallback: Box::new(Node::CodeBlock {
                language: Some("cobol".to_owned()),
                source: "X".to_owned(),
                live: false,
            }),
            error: NodeError::HighlightUnsupported {
                language: "cobol".to_owned(),
            },
        }];

        assert_eq!(
            html(&nodes),
            r#"<pre><code class="language-cobol">X</code></pre>"#
        );
    }

    #[test]
    fn test_lists() {
        let nodes = vec![
            Node::List {
                start: Some(3),
                items: vec![Node::Item {
                    children: vec![Node::text("c")],
                }],
            },
            Node::List {
                start: None,
                items: vec![Node::Item {
                    children: vec![Node::text("x")],
                }],
            },
        ];

        assert_eq!(
            html(&nodes),
            r#"<ol start="3"><li>c</li></ol><ul><li>x</li></ul>"#
        );
    }

    #[test]
    fn test_fragment_and_placeholder() {
        let nodes = vec![
            Node::Fragment {
                html: "<b>ok</b>".to_owned(),
            },
            Node::Placeholder {
                name: "Missing".to_owned(),
                attrs: BTreeMap::new(),
            },
        ];

        assert_eq!(html(&nodes), "<b>ok</b>");
    }
}
