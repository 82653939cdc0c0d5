//! CLI command implementations.

mod check;
mod list;
mod render;
mod toc;

use std::path::PathBuf;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_site::Blog;

use crate::error::CliError;

pub(crate) use check::CheckArgs;
pub(crate) use list::ListArgs;
pub(crate) use render::RenderArgs;
pub(crate) use toc::TocArgs;

/// Options shared by every command that reads documents.
#[derive(Args, Debug, Default)]
pub(crate) struct SiteArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Document source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Disable the document cache.
    #[arg(long)]
    no_cache: bool,

    /// Enable live code evaluation.
    #[arg(long)]
    evaluate: bool,

    /// Locale for formatted dates, e.g. `fr_FR` (overrides config).
    #[arg(long)]
    locale: Option<String>,
}

impl SiteArgs {
    fn settings(&self) -> CliSettings {
        CliSettings {
            source_dir: self.source_dir.clone(),
            cache_enabled: self.no_cache.then_some(false),
            evaluate_enabled: self.evaluate.then_some(true),
            locale: self.locale.clone(),
        }
    }

    /// Load configuration and open the blog it describes.
    pub(crate) fn blog(&self) -> Result<Blog, CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.settings()))?;
        tracing::info!(
            source_dir = %config.docs_resolved.source_dir.display(),
            config = ?config.config_path,
            "Loaded configuration"
        );
        Ok(Blog::from_config(&config))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_args_override_nothing() {
        let settings = SiteArgs::default().settings();

        assert_eq!(settings.source_dir, None);
        assert_eq!(settings.cache_enabled, None);
        assert_eq!(settings.evaluate_enabled, None);
        assert_eq!(settings.locale, None);
    }

    #[test]
    fn test_flags_map_to_settings() {
        let args = SiteArgs {
            source_dir: Some(PathBuf::from("posts")),
            no_cache: true,
            evaluate: true,
            locale: Some("de_DE".to_owned()),
            ..SiteArgs::default()
        };

        let settings = args.settings();

        assert_eq!(settings.source_dir, Some(PathBuf::from("posts")));
        assert_eq!(settings.cache_enabled, Some(false));
        assert_eq!(settings.evaluate_enabled, Some(true));
        assert_eq!(settings.locale.as_deref(), Some("de_DE"));
    }
}
