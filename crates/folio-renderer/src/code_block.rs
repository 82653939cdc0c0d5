//! Fence info string parsing.

use std::collections::BTreeMap;

/// Flag word that marks a code block for live evaluation.
const LIVE_FLAG: &str = "live";

/// Parsed fence info string.
///
/// Format: `language [live] [key=value ...]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FenceInfo {
    /// Language identifier (e.g., "rust", "js"). `None` when absent.
    pub language: Option<String>,
    /// Whether the block is marked `live`.
    pub live: bool,
    /// Attributes parsed from `key=value` pairs.
    pub attrs: BTreeMap<String, String>,
}

/// Parse fence info string into language, live flag and attributes.
#[must_use]
pub fn parse_fence_info(info: &str) -> FenceInfo {
    let mut parts = info.split_whitespace();
    let language = parts.next().map(str::to_owned);

    let mut fence = FenceInfo {
        language,
        ..FenceInfo::default()
    };
    for part in parts {
        if let Some((key, value)) = part.split_once('=') {
            // Strip quotes if present
            let value = value.trim_matches('"').trim_matches('\'');
            fence.attrs.insert(key.to_owned(), value.to_owned());
        } else if part == LIVE_FLAG {
            fence.live = true;
        }
    }

    fence
}
