//! `folio render` command implementation.

use clap::{Args, ValueEnum};
use folio_site::RenderedDocument;

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Output format for a rendered document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// The full document as JSON.
    #[default]
    Json,
    /// The body HTML only.
    Html,
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Document identifier.
    slug: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    format: Format,

    #[command(flatten)]
    site: SiteArgs,
}

impl RenderArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let blog = self.site.blog()?;

        let doc = blog.render(&self.slug)?;
        for diagnostic in &doc.diagnostics {
            output.warning(&format!("warning: {}", diagnostic.message));
        }

        output.stdout(&format_document(&doc, self.format)?)?;
        Ok(())
    }
}

fn format_document(doc: &RenderedDocument, format: Format) -> Result<String, CliError> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(doc)?,
        Format::Html => doc.html.clone(),
    })
}
