//! Heading extraction from raw markdown.
//!
//! Walks the same pulldown-cmark event stream the parser sees, so only
//! headings the parser will produce at the top level become TOC entries.
//! Headings inside block quotes, list items, HTML blocks and code are skipped.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::anchor::AnchorMap;
use crate::parser::MARKDOWN_OPTIONS;
use crate::util::heading_level_to_num;

/// Scan a markdown body and assign anchor ids to its TOC-level headings.
#[must_use]
pub fn extract_headings(body: &str) -> AnchorMap {
    let mut map = AnchorMap::new();
    // Open block quotes and list items.
    let mut nesting = 0usize;
    let mut heading: Option<(u8, String)> = None;

    for event in Parser::new_ext(body, MARKDOWN_OPTIONS) {
        match event {
            Event::Start(Tag::BlockQuote(_) | Tag::List(_) | Tag::Item) => nesting += 1,
            Event::End(TagEnd::BlockQuote(_) | TagEnd::List(_) | TagEnd::Item) => {
                nesting = nesting.saturating_sub(1);
            }
            Event::Start(Tag::Heading { level, .. }) if nesting == 0 => {
                let level = heading_level_to_num(level);
                if matches!(level, 2 | 3) {
                    heading = Some((level, String::new()));
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = heading.take() {
                    map.track(text.trim(), level);
                }
            }
            event => {
                if let Some((_, text)) = &mut heading {
                    push_text(text, &event);
                }
            }
        }
    }

    map
}

/// Append the reader-visible text of an inline event.
fn push_text(text: &mut String, event: &Event<'_>) {
    match event {
        Event::Text(t) | Event::Code(t) | Event::InlineMath(t) | Event::DisplayMath(t) => {
            text.push_str(t);
        }
        Event::FootnoteReference(label) => {
            text.push_str("[^");
            text.push_str(label);
            text.push(']');
        }
        Event::SoftBreak | Event::HardBreak => text.push(' '),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::anchor::TocEntry;

    fn entry(title: &str, level: u8, id: &str) -> TocEntry {
        TocEntry {
            title: title.to_owned(),
            level,
            id: Arc::from(id),
        }
    }

    #[test]
    fn test_duplicate_headings() {
        let map = extract_headings("## Intro\n\n## Intro\n");

        assert_eq!(
            map.toc(),
            &[entry("Intro", 2, "intro"), entry("Intro", 2, "intro-2")]
        );
    }

    #[test]
    fn test_levels_filtered() {
        let body = "# Title\n\n## Section\n\n### Sub\n\n#### Deep\n";
        let map = extract_headings(body);

        assert_eq!(
            map.toc(),
            &[entry("Section", 2, "section"), entry("Sub", 3, "sub")]
        );
    }

    #[test]
    fn test_skips_fenced_code() {
        let body = "```sh\n## not a heading\n```\n\n~~~~\n### nope\n~~~\n~~~~\n## Real\n";
        let map = extract_headings(body);

        assert_eq!(map.toc(), &[entry("Real", 2, "real")]);
    }

    #[test]
    fn test_strips_closing_hashes() {
        let map = extract_headings("## Closing ##\n### C# ###\n## Tag#\n");

        assert_eq!(
            map.toc(),
            &[
                entry("Closing", 2, "closing"),
                entry("C#", 3, "c"),
                entry("Tag#", 2, "tag"),
            ]
        );
    }

    #[test]
    fn test_requires_space_after_hashes() {
        let map = extract_headings("##NoSpace\n    ## indented code\n");

        assert!(map.toc().is_empty());
    }

    #[test]
    fn test_inline_markdown_reduced_to_text() {
        let map = extract_headings("## Using `cargo` with *style*\n");

        assert_eq!(
            map.toc(),
            &[entry("Using cargo with style", 2, "using-cargo-with-style")]
        );
    }

    #[test]
    fn test_block_markers_kept_as_text() {
        let map = extract_headings("## 1. Intro\n## - Notes\n");

        assert_eq!(
            map.toc(),
            &[entry("1. Intro", 2, "1-intro"), entry("- Notes", 2, "notes")]
        );
    }

    #[test]
    fn test_skips_headings_in_html() {
        let body = "<!--\n## Draft notes\n-->\n\n<div>\n\n## Inside div\n\n</div>\n\n## Intro\n";
        let map = extract_headings(body);

        assert_eq!(
            map.toc(),
            &[entry("Inside div", 2, "inside-div"), entry("Intro", 2, "intro")]
        );
    }

    #[test]
    fn test_skips_nested_headings() {
        let map = extract_headings("> ## Quoted\n\n- ## Listed\n\n## Setup\n");

        assert_eq!(map.toc(), &[entry("Setup", 2, "setup")]);
    }

    #[test]
    fn test_setext_headings_tracked() {
        let map = extract_headings("Overview\n--------\n");

        assert_eq!(map.toc(), &[entry("Overview", 2, "overview")]);
    }

    #[test]
    fn test_crlf_lines() {
        let map = extract_headings("## One\r\n\r\n## Two\r\n");

        assert_eq!(
            map.toc(),
            &[entry("One", 2, "one"), entry("Two", 2, "two")]
        );
    }
}
