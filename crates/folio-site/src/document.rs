//! Rendered document assembly.

use chrono::{Locale, NaiveDate};
use folio_renderer::{Diagnostic, Node, RenderResult, TocEntry, plain_text};
use serde::Serialize;

use crate::date::format_date;
use crate::front_matter::{Fields, FrontMatter, serialize_fields};

/// Average reading speed used for [`RenderedDocument::reading_minutes`].
const WORDS_PER_MINUTE: usize = 200;

/// A fully rendered document.
///
/// Produced once per render and never mutated afterwards. Two renders of the
/// same document with the same overrides compare equal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub slug: String,
    pub title: String,
    /// ISO-8601 calendar date.
    pub date: String,
    /// Date in the configured locale, e.g. `January 15, 2024`.
    pub formatted_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoiler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta: Option<String>,
    /// Front matter keys without a typed accessor, in declaration order.
    #[serde(serialize_with = "serialize_fields")]
    pub extra: Fields,
    pub body: Vec<Node>,
    pub html: String,
    pub toc: Vec<TocEntry>,
    pub diagnostics: Vec<Diagnostic>,
    pub reading_minutes: u32,
}

impl RenderedDocument {
    pub(crate) fn assemble(
        slug: &str,
        front: FrontMatter,
        date: NaiveDate,
        locale: Locale,
        result: RenderResult,
    ) -> Self {
        let reading_minutes = reading_minutes(&result.nodes);
        Self {
            slug: slug.to_owned(),
            title: front.title,
            date: date.format("%Y-%m-%d").to_string(),
            formatted_date: format_date(date, locale),
            spoiler: front.spoiler,
            cta: front.cta,
            extra: front.extra,
            body: result.nodes,
            html: result.html,
            toc: result.toc,
            diagnostics: result.diagnostics,
            reading_minutes,
        }
    }
}

/// Index entry for a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub formatted_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoiler: Option<String>,
}

/// Estimated reading time, at least one minute.
fn reading_minutes(nodes: &[Node]) -> u32 {
    let words = plain_text(nodes).split_whitespace().count();
    u32::try_from(words / WORDS_PER_MINUTE)
        .unwrap_or(u32::MAX)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_minutes_minimum() {
        assert_eq!(reading_minutes(&[]), 1);
        assert_eq!(reading_minutes(&[Node::text("a few words")]), 1);
    }

    #[test]
    fn test_reading_minutes_counts_words() {
        let text = "word ".repeat(650);

        assert_eq!(
            reading_minutes(&[Node::Paragraph {
                children: vec![Node::text(text)],
            }]),
            3
        );
    }
}
