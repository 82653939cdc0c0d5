//! Markdown to content tree conversion.
//!
//! Walks pulldown-cmark events with a stack of open containers. Heading ids
//! come from the [`AnchorMap`] built by the heading extractor.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::{Captures, Regex};

use crate::anchor::AnchorMap;
use crate::code_block::{FenceInfo, parse_fence_info};
use crate::node::{Node, plain_text};
use crate::util::heading_level_to_num;

/// Markdown extensions shared by the parser and the heading extractor.
pub(crate) const MARKDOWN_OPTIONS: Options =
    Options::ENABLE_STRIKETHROUGH.union(Options::ENABLE_MATH);

/// Fence language rendered as display math instead of code.
const MATH_LANGUAGE: &str = "math";

/// Self-closing component tag with a capitalized name, e.g. `<Counter start="3" />`.
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<([A-Z][A-Za-z0-9]*)((?:\s+[A-Za-z_:][-A-Za-z0-9_:.]*(?:\s*=\s*(?:"[^"]*"|'[^']*'))?)*)\s*/>"#,
    )
    .expect("invalid placeholder regex")
});

static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'))?"#)
        .expect("invalid attribute regex")
});

/// Parse a markdown body into a content tree.
///
/// TOC-level headings take their ids from `anchors`; all other headings get
/// ids from the same generator so that no two ids collide.
pub fn parse(body: &str, anchors: &mut AnchorMap) -> Vec<Node> {
    let mut builder = TreeBuilder::new(anchors);
    for event in Parser::new_ext(body, MARKDOWN_OPTIONS) {
        builder.process_event(event);
    }
    builder.finish()
}

/// An open container awaiting its end tag.
enum Frame {
    Root,
    Paragraph,
    Heading(u8),
    BlockQuote,
    List(Option<u64>),
    Item,
    Emphasis,
    Strong,
    Strikethrough,
    Link { href: String, title: String },
    Image { src: String, title: String },
    /// Unsupported container whose children are spliced into the parent.
    Transparent,
}

struct TreeBuilder<'m> {
    anchors: &'m mut AnchorMap,
    stack: Vec<(Frame, Vec<Node>)>,
    /// Open code block and its buffered source.
    code: Option<(FenceInfo, String)>,
    /// Buffered raw HTML block.
    html_block: Option<String>,
}

impl<'m> TreeBuilder<'m> {
    fn new(anchors: &'m mut AnchorMap) -> Self {
        Self {
            anchors,
            stack: vec![(Frame::Root, Vec::new())],
            code: None,
            html_block: None,
        }
    }

    fn finish(mut self) -> Vec<Node> {
        // Unclosed frames cannot happen with well-formed event streams; fold
        // them into their parents rather than dropping content.
        while self.stack.len() > 1 {
            self.close_frame();
        }
        self.stack.pop().map(|(_, nodes)| nodes).unwrap_or_default()
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push(Node::InlineCode {
                code: code.into_string(),
            }),
            Event::InlineMath(source) => self.push(Node::Math {
                display: false,
                source: source.into_string(),
            }),
            Event::DisplayMath(source) => self.push(Node::Math {
                display: true,
                source: source.into_string(),
            }),
            Event::Html(html) => self.block_html(&html),
            Event::InlineHtml(html) => self.inline_html(&html),
            Event::FootnoteReference(label) => self.push(Node::text(format!("[^{label}]"))),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.push(Node::HardBreak),
            Event::Rule => self.push(Node::Rule),
            Event::TaskListMarker(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::CodeBlock(kind) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => parse_fence_info(&info),
                    CodeBlockKind::Indented => FenceInfo::default(),
                };
                self.code = Some((info, String::new()));
                return;
            }
            Tag::HtmlBlock => {
                self.html_block = Some(String::new());
                return;
            }
            Tag::Paragraph => Frame::Paragraph,
            Tag::Heading { level, .. } => Frame::Heading(heading_level_to_num(level)),
            Tag::BlockQuote(_) => Frame::BlockQuote,
            Tag::List(start) => Frame::List(start),
            Tag::Item => Frame::Item,
            Tag::Emphasis => Frame::Emphasis,
            Tag::Strong => Frame::Strong,
            Tag::Strikethrough => Frame::Strikethrough,
            Tag::Link {
                dest_url, title, ..
            } => Frame::Link {
                href: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image {
                src: dest_url.into_string(),
                title: title.into_string(),
            },
            _ => Frame::Transparent,
        };
        self.stack.push((frame, Vec::new()));
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => self.end_code_block(),
            TagEnd::HtmlBlock => {
                if let Some(html) = self.html_block.take() {
                    for node in split_html(&html) {
                        self.push(node);
                    }
                }
            }
            _ => self.close_frame(),
        }
    }

    fn close_frame(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some((frame, children)) = self.stack.pop() else {
            return;
        };

        let node = match frame {
            Frame::Root => return,
            Frame::Transparent => {
                for child in children {
                    self.push(child);
                }
                return;
            }
            Frame::Paragraph => Node::Paragraph { children },
            Frame::Heading(level) => {
                let title = plain_text(&children);
                let title = title.trim();
                // Only top-level headings are tracked by the extractor.
                let at_root = matches!(self.stack.last(), Some((Frame::Root, _)));
                let tracked = if at_root && matches!(level, 2 | 3) {
                    self.anchors.claim(title, level)
                } else {
                    None
                };
                let id = tracked.unwrap_or_else(|| self.anchors.generate(title));
                Node::Heading {
                    level,
                    id,
                    children,
                }
            }
            Frame::BlockQuote => Node::BlockQuote { children },
            Frame::List(start) => Node::List {
                start,
                items: children,
            },
            Frame::Item => Node::Item { children },
            Frame::Emphasis => Node::Emphasis { children },
            Frame::Strong => Node::Strong { children },
            Frame::Strikethrough => Node::Strikethrough { children },
            Frame::Link { href, title } => Node::Link {
                href,
                title,
                children,
            },
            Frame::Image { src, title } => Node::Image {
                src,
                title,
                alt: plain_text(&children),
            },
        };
        self.push(node);
    }

    fn end_code_block(&mut self) {
        let Some((info, source)) = self.code.take() else {
            return;
        };
        let node = match info.language {
            Some(language) if language == MATH_LANGUAGE => Node::Math {
                display: true,
                source: source.trim_end().to_owned(),
            },
            language => Node::CodeBlock {
                language,
                source,
                live: info.live,
            },
        };
        self.push(node);
    }

    fn text(&mut self, text: &str) {
        if let Some((_, buffer)) = &mut self.code {
            buffer.push_str(text);
            return;
        }
        self.push(Node::text(text));
    }

    fn soft_break(&mut self) {
        if let Some((_, buffer)) = &mut self.code {
            buffer.push('\n');
            return;
        }
        self.push(Node::SoftBreak);
    }

    fn block_html(&mut self, html: &str) {
        if let Some(buffer) = &mut self.html_block {
            buffer.push_str(html);
            return;
        }
        for node in split_html(html) {
            self.push(node);
        }
    }

    fn inline_html(&mut self, html: &str) {
        let node = match PLACEHOLDER_PATTERN.captures(html) {
            Some(caps) if caps.get(0).is_some_and(|m| m.as_str() == html.trim()) => {
                placeholder(&caps)
            }
            _ => Node::Html {
                html: html.to_owned(),
            },
        };
        self.push(node);
    }

    /// Append a node to the innermost open container, merging adjacent text.
    fn push(&mut self, node: Node) {
        let Some((_, children)) = self.stack.last_mut() else {
            return;
        };
        if let Node::Text { value } = &node
            && let Some(Node::Text { value: previous }) = children.last_mut()
        {
            previous.push_str(value);
            return;
        }
        children.push(node);
    }
}

/// Split raw HTML into passthrough chunks and component placeholders.
fn split_html(html: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER_PATTERN.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_raw_html(&mut nodes, &html[last..whole.start()]);
        nodes.push(placeholder(&caps));
        last = whole.end();
    }
    push_raw_html(&mut nodes, &html[last..]);

    nodes
}

fn push_raw_html(nodes: &mut Vec<Node>, html: &str) {
    if !html.trim().is_empty() {
        nodes.push(Node::Html {
            html: html.to_owned(),
        });
    }
}

fn placeholder(caps: &Captures<'_>) -> Node {
    let name = caps.get(1).map_or("", |m| m.as_str()).to_owned();
    let attrs = caps
        .get(2)
        .map(|m| parse_attrs(m.as_str()))
        .unwrap_or_default();
    Node::Placeholder { name, attrs }
}

/// Parse tag attributes. Attributes without a value are set to `"true"`.
fn parse_attrs(source: &str) -> BTreeMap<String, String> {
    ATTR_PATTERN
        .captures_iter(source)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_owned();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("true", |m| m.as_str())
                .to_owned();
            Some((key, value))
        })
        .collect()
}
