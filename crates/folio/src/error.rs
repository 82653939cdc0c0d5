//! CLI error types.

use folio_config::ConfigError;
use folio_site::RenderError;

/// CLI error.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Render(#[from] RenderError),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Validation(String),
}
