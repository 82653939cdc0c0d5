//! Per-document component resolution.

use std::borrow::Cow;

use folio_renderer::ComponentSet;

use crate::loader::Loader;

/// Resolve the component set for a document.
///
/// Overrides from the document's sidecar win over the defaults. A missing
/// sidecar means no overrides. Any other storage failure, including a load
/// that outlives the loader timeout, is logged and treated as no overrides.
pub(crate) fn resolve_components(loader: &Loader, slug: &str) -> Cow<'static, ComponentSet> {
    match loader.load_components(slug) {
        Ok(Some(overrides)) if !overrides.is_empty() => {
            tracing::debug!(slug, count = overrides.len(), "Loaded component overrides");
            Cow::Owned(ComponentSet::with_overrides(&overrides))
        }
        Ok(_) => Cow::Borrowed(ComponentSet::defaults()),
        Err(e) if e.is_not_found() => Cow::Borrowed(ComponentSet::defaults()),
        Err(e) => {
            tracing::warn!(slug, error = %e, "Ignoring component overrides");
            Cow::Borrowed(ComponentSet::defaults())
        }
    }
}
