//! `folio toc` command implementation.

use std::fmt::Write;

use clap::Args;
use folio_site::TocEntry;

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    /// Document identifier.
    slug: String,

    /// Print the entries as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    site: SiteArgs,
}

impl TocArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let blog = self.site.blog()?;

        let toc = blog.toc(&self.slug)?;
        if toc.is_empty() {
            output.info(&format!("{} has no headings", self.slug));
            return Ok(());
        }

        let text = if self.json {
            serde_json::to_string_pretty(&toc)?
        } else {
            outline(&toc)
        };
        output.stdout(&text)?;
        Ok(())
    }
}

/// Indented outline, one entry per line: `title  #id`.
fn outline(toc: &[TocEntry]) -> String {
    let min_level = toc.iter().map(|e| e.level).min().unwrap_or(2);
    let mut out = String::new();
    for entry in toc {
        let indent = usize::from(entry.level - min_level) * 2;
        let _ = writeln!(out, "{:indent$}{}  #{}", "", entry.title, entry.id);
    }
    out
}
