//! The [`Blog`] façade: load, split, render and assemble documents.

use std::sync::Arc;
use std::time::Instant;

use chrono::Locale;
use folio_config::{Config, PipelineConfig};
use folio_renderer::{
    CommandEvaluator, Evaluator, MarkdownRenderer, Pipeline, Stage, TocEntry, extract_headings,
};
use folio_storage::{FsStorage, Storage};
use rayon::prelude::*;

use crate::components::resolve_components;
use crate::date::{format_date, parse_date};
use crate::document::{PostSummary, RenderedDocument};
use crate::error::RenderError;
use crate::front_matter::{FrontMatter, split_document};
use crate::loader::{DocumentSource, Loader};

/// Outcome of rendering one document as part of [`Blog::render_all`].
pub type RenderOutcome = (String, Result<RenderedDocument, RenderError>);

/// Entry point for rendering documents from storage.
///
/// `Blog` holds no per-render state and is `Send + Sync`; renders may run
/// concurrently and never affect each other.
pub struct Blog {
    storage: Arc<dyn Storage>,
    loader: Loader,
    pipeline: Pipeline,
    evaluator: Option<Arc<dyn Evaluator>>,
    locale: Locale,
}

impl Blog {
    /// Create a blog over the given storage.
    ///
    /// A [`CommandEvaluator`] is installed when evaluation is enabled in the
    /// pipeline configuration.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, config: &Config) -> Self {
        let docs = &config.docs_resolved;
        let evaluator: Option<Arc<dyn Evaluator>> = config.pipeline.evaluate.then(|| {
            Arc::new(CommandEvaluator::new(
                config.evaluate.commands.clone(),
                config.evaluate.timeout(),
                config.evaluate.max_output_bytes,
            )) as Arc<dyn Evaluator>
        });
        let locale = Locale::try_from(config.dates.locale.as_str()).unwrap_or_else(|_| {
            tracing::warn!(locale = %config.dates.locale, "Unknown locale, using en_US");
            Locale::en_US
        });

        Self {
            loader: Loader::new(Arc::clone(&storage), docs.load_timeout, docs.cache_enabled),
            storage,
            pipeline: pipeline_from_config(&config.pipeline),
            evaluator,
            locale,
        }
    }

    /// Create a blog reading from the configured source directory.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let storage = FsStorage::new(config.docs_resolved.source_dir.clone());
        Self::new(Arc::new(storage), config)
    }

    /// Replace the live code evaluator.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Enabled pipeline stages.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Render a document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] for document-level failures: unknown or invalid
    /// identifiers, load timeouts, malformed front matter and invalid dates.
    pub fn render(&self, slug: &str) -> Result<RenderedDocument, RenderError> {
        let start = Instant::now();
        let source = self.loader.load(slug)?;
        let (front, body) = split(&source)?;
        let date = parse_date(&front.date).ok_or_else(|| RenderError::InvalidDate {
            slug: slug.to_owned(),
            value: front.date.clone(),
        })?;

        let components = resolve_components(&self.loader, slug);
        let mut renderer = MarkdownRenderer::new(&self.pipeline).with_components(&components);
        if let Some(evaluator) = &self.evaluator {
            renderer = renderer.with_evaluator(evaluator.as_ref());
        }
        let result = renderer.render(body);

        tracing::debug!(
            slug,
            diagnostics = result.diagnostics.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Rendered document"
        );
        Ok(RenderedDocument::assemble(
            slug,
            front,
            date,
            self.locale,
            result,
        ))
    }

    /// Table of contents of a document, without running the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the document cannot be loaded or split.
    pub fn toc(&self, slug: &str) -> Result<Vec<TocEntry>, RenderError> {
        let source = self.loader.load(slug)?;
        let (_, body) = split(&source)?;
        Ok(extract_headings(body).toc().to_vec())
    }

    /// List documents, newest first.
    ///
    /// Documents whose front matter or date cannot be parsed are skipped with
    /// a warning.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Storage`] if storage cannot be scanned.
    pub fn list(&self) -> Result<Vec<PostSummary>, RenderError> {
        let mut posts: Vec<PostSummary> = self
            .storage
            .scan()?
            .into_iter()
            .filter_map(|doc| match self.summary(&doc.path) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::warn!(slug = %doc.path, error = %e, "Skipping document");
                    None
                }
            })
            .collect();
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        Ok(posts)
    }

    /// Render every document in parallel.
    ///
    /// Results are in storage scan order; one failure does not affect others.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Storage`] if storage cannot be scanned.
    pub fn render_all(&self) -> Result<Vec<RenderOutcome>, RenderError> {
        let documents = self.storage.scan()?;
        Ok(documents
            .par_iter()
            .map(|doc| (doc.path.clone(), self.render(&doc.path)))
            .collect())
    }

    fn summary(&self, slug: &str) -> Result<PostSummary, RenderError> {
        let source = self.loader.load(slug)?;
        let (front, _) = split(&source)?;
        let date = parse_date(&front.date).ok_or_else(|| RenderError::InvalidDate {
            slug: slug.to_owned(),
            value: front.date.clone(),
        })?;
        Ok(PostSummary {
            slug: slug.to_owned(),
            title: front.title,
            date: date.format("%Y-%m-%d").to_string(),
            formatted_date: format_date(date, self.locale),
            spoiler: front.spoiler,
        })
    }
}

fn split(source: &DocumentSource) -> Result<(FrontMatter, &str), RenderError> {
    split_document(&source.raw_text).map_err(|e| RenderError::MalformedFrontMatter {
        slug: source.identifier.clone(),
        source: e,
    })
}

/// Build the pipeline from the `[pipeline]` configuration table.
#[must_use]
pub fn pipeline_from_config(config: &PipelineConfig) -> Pipeline {
    let enabled = [
        (Stage::Typography, config.typography),
        (Stage::Math, config.math),
        (Stage::Highlight, config.highlight),
        (Stage::Evaluate, config.evaluate),
    ];
    Pipeline::new(
        enabled
            .into_iter()
            .filter_map(|(stage, on)| on.then_some(stage)),
    )
}
