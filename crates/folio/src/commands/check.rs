//! `folio check` command implementation.
//!
//! Renders every document and reports document-level failures and node-level
//! diagnostics. Exits non-zero only when a document fails to render.

use clap::Args;
use folio_site::RenderOutcome;

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Treat node-level diagnostics as failures.
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    site: SiteArgs,
}

/// Totals over one check run.
#[derive(Debug, Default, PartialEq, Eq)]
struct Report {
    documents: usize,
    failed: usize,
    diagnostics: usize,
}

impl CheckArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let blog = self.site.blog()?;

        let outcomes = blog.render_all()?;
        let report = report(&outcomes, &output);

        output.info(&format!(
            "Checked {} documents: {} failed, {} diagnostics",
            report.documents, report.failed, report.diagnostics
        ));
        if report.failed > 0 {
            return Err(CliError::Validation(format!(
                "{} of {} documents failed to render",
                report.failed, report.documents
            )));
        }
        if self.strict && report.diagnostics > 0 {
            return Err(CliError::Validation(format!(
                "{} diagnostics in strict mode",
                report.diagnostics
            )));
        }
        output.success("All documents rendered");
        Ok(())
    }
}

fn report(outcomes: &[RenderOutcome], output: &Output) -> Report {
    let mut report = Report {
        documents: outcomes.len(),
        ..Report::default()
    };
    for (slug, outcome) in outcomes {
        match outcome {
            Ok(doc) if doc.diagnostics.is_empty() => {}
            Ok(doc) => {
                report.diagnostics += doc.diagnostics.len();
                output.warning(&format!("{slug}: {} diagnostics", doc.diagnostics.len()));
                for diagnostic in &doc.diagnostics {
                    output.detail(&diagnostic.message);
                }
            }
            Err(e) => {
                report.failed += 1;
                output.error(&format!("{slug}: {e}"));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use folio_config::Config;
    use folio_site::Blog;
    use folio_storage::MockStorage;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_report_counts_failures_and_diagnostics() {
        let storage = MockStorage::new()
            .with_file("ok", "Ok", "---\ntitle: Ok\ndate: 2024-01-01\n---\n## Fine\n")
            .with_file(
                "math",
                "Math",
                "---\ntitle: Math\ndate: 2024-01-02\n---\n$\\right)$ and <Nope />\n",
            )
            .with_file("undated", "Undated", "---\ntitle: Undated\n---\n");
        let blog = Blog::new(Arc::new(storage), &Config::default());

        let outcomes = blog.render_all().unwrap();

        assert_eq!(
            report(&outcomes, &Output::new()),
            Report {
                documents: 3,
                failed: 1,
                diagnostics: 2,
            }
        );
    }

    #[test]
    fn test_report_empty() {
        assert_eq!(report(&[], &Output::new()), Report::default());
    }
}
