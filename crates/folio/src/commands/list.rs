//! `folio list` command implementation.

use std::fmt::Write;

use clap::Args;
use folio_site::PostSummary;

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the list command.
#[derive(Args)]
pub(crate) struct ListArgs {
    /// Print the index as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    site: SiteArgs,
}

impl ListArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let blog = self.site.blog()?;

        let posts = blog.list()?;
        if posts.is_empty() {
            output.warning("No documents found");
            return Ok(());
        }

        let text = if self.json {
            serde_json::to_string_pretty(&posts)?
        } else {
            table(&posts)
        };
        output.stdout(&text)?;
        Ok(())
    }
}

/// One line per post: date, slug and title, slugs aligned.
fn table(posts: &[PostSummary]) -> String {
    let width = posts.iter().map(|p| p.slug.len()).max().unwrap_or(0);
    let mut out = String::new();
    for post in posts {
        let _ = writeln!(out, "{}  {:width$}  {}", post.date, post.slug, post.title);
    }
    out
}
