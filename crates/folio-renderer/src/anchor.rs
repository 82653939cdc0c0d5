//! Heading anchor generation.
//!
//! Anchors are derived once per document. The heading extractor fills an
//! [`AnchorMap`] from the raw body, and the parser then claims those ids for
//! the matching heading nodes, so the TOC and the body always agree.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::node::AnchorId;

/// Slug used when a heading has no alphanumeric characters.
const FALLBACK_SLUG: &str = "section";

/// Convert text to a URL fragment slug.
///
/// Lower-cases, collapses every run of non-alphanumeric characters into a
/// single dash and trims dashes from both ends. Unicode alphanumerics are kept.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !result.is_empty() {
                result.push('-');
            }
            pending_dash = false;
            result.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    result
}

/// Generator of unique anchor ids within one document.
#[derive(Debug, Default)]
pub struct AnchorGenerator {
    used: HashSet<AnchorId>,
    /// Next suffix to try per base slug.
    next_suffix: HashMap<String, usize>,
}

impl AnchorGenerator {
    /// Generate a unique id for heading text.
    ///
    /// The first occurrence of a slug is used as-is; later ones get `-2`, `-3`
    /// and so on. A suffixed candidate that is already taken is skipped.
    pub fn generate(&mut self, text: &str) -> AnchorId {
        let mut base = slugify(text);
        if base.is_empty() {
            FALLBACK_SLUG.clone_into(&mut base);
        }

        if !self.used.contains(base.as_str()) {
            return self.claim(&base);
        }

        let suffix = self.next_suffix.entry(base.clone()).or_insert(2);
        loop {
            let candidate = format!("{base}-{suffix}");
            *suffix += 1;
            if !self.used.contains(candidate.as_str()) {
                return self.claim(&candidate);
            }
        }
    }

    fn claim(&mut self, id: &str) -> AnchorId {
        let id: AnchorId = Arc::from(id);
        self.used.insert(Arc::clone(&id));
        id
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TocEntry {
    /// Heading text.
    pub title: String,
    /// Heading level (2 or 3).
    pub level: u8,
    /// Anchor ID for linking.
    pub id: AnchorId,
}

/// Anchor ids assigned to a document's headings.
///
/// Holds the TOC entries in document order plus the generator state, so ids
/// generated later for untracked headings never collide with TOC ids.
#[derive(Debug, Default)]
pub struct AnchorMap {
    entries: Vec<TocEntry>,
    generator: AnchorGenerator,
    /// Index of the next entry the parser may claim.
    cursor: usize,
}

impl AnchorMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a TOC-level heading and return its id.
    pub fn track(&mut self, title: &str, level: u8) -> AnchorId {
        let id = self.generator.generate(title);
        self.entries.push(TocEntry {
            title: title.to_owned(),
            level,
            id: Arc::clone(&id),
        });
        id
    }

    /// Claim the id of the next tracked heading with this title and level.
    ///
    /// Entries are consumed in document order; tracked entries skipped over
    /// belong to headings the parser never produced (e.g. inside raw HTML).
    pub fn claim(&mut self, title: &str, level: u8) -> Option<AnchorId> {
        let offset = self.entries[self.cursor..]
            .iter()
            .position(|entry| entry.level == level && entry.title == title)?;
        let index = self.cursor + offset;
        self.cursor = index + 1;
        Some(Arc::clone(&self.entries[index].id))
    }

    /// Generate a fresh id for a heading that is not part of the TOC.
    pub fn generate(&mut self, title: &str) -> AnchorId {
        self.generator.generate(title)
    }

    /// TOC entries in document order.
    #[must_use]
    pub fn toc(&self) -> &[TocEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "what-s-new");
        assert_eq!(slugify("  Spaces  "), "spaces");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("kebab-case"), "kebab-case");
        assert_eq!(slugify("snake_case"), "snake-case");
        assert_eq!(slugify("--Edge--"), "edge");
    }

    #[test]
    fn test_slugify_unicode() {
        assert_eq!(slugify("Über Straße"), "über-straße");
        assert_eq!(slugify("日本語 テキスト"), "日本語-テキスト");
    }

    #[test]
    fn test_generate_collisions() {
        let mut generator = AnchorGenerator::default();

        assert_eq!(&*generator.generate("Setup"), "setup");
        assert_eq!(&*generator.generate("Setup"), "setup-2");
        assert_eq!(&*generator.generate("Setup"), "setup-3");
    }

    #[test]
    fn test_generate_suffix_collides_with_existing_slug() {
        let mut generator = AnchorGenerator::default();

        assert_eq!(&*generator.generate("Setup 2"), "setup-2");
        assert_eq!(&*generator.generate("Setup"), "setup");
        assert_eq!(&*generator.generate("Setup"), "setup-3");
    }

    #[test]
    fn test_generate_empty_falls_back() {
        let mut generator = AnchorGenerator::default();

        assert_eq!(&*generator.generate("???"), "section");
        assert_eq!(&*generator.generate(""), "section-2");
    }

    #[test]
    fn test_claim_in_order() {
        let mut map = AnchorMap::new();
        let first = map.track("Intro", 2);
        let second = map.track("Intro", 2);

        assert_eq!(map.claim("Intro", 2), Some(first));
        assert_eq!(map.claim("Intro", 2), Some(second));
        assert_eq!(map.claim("Intro", 2), None);
    }

    #[test]
    fn test_claim_skips_orphans() {
        let mut map = AnchorMap::new();
        map.track("Hidden", 2);
        let usage = map.track("Usage", 3);

        assert_eq!(map.claim("Usage", 3), Some(usage));
        assert_eq!(map.claim("Hidden", 2), None);
    }

    #[test]
    fn test_generate_avoids_tracked_ids() {
        let mut map = AnchorMap::new();
        map.track("Setup", 2);

        assert_eq!(&*map.generate("Setup"), "setup-2");
    }

    #[test]
    fn test_toc_shares_ids() {
        let mut map = AnchorMap::new();
        let id = map.track("Intro", 2);

        assert!(Arc::ptr_eq(&id, &map.toc()[0].id));
    }
}
