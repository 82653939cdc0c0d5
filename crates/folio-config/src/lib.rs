//! Configuration management for Folio.
//!
//! Parses `folio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `docs.source_dir`
//! - `evaluate.commands.*`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override document source directory.
    pub source_dir: Option<PathBuf>,
    /// Override document byte cache flag.
    pub cache_enabled: Option<bool>,
    /// Override the live evaluation stage flag.
    pub evaluate_enabled: Option<bool>,
    /// Override the date locale.
    pub locale: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document source configuration (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    /// Transform pipeline stage switches.
    pub pipeline: PipelineConfig,
    /// Live code evaluation configuration.
    pub evaluate: EvaluateConfig,
    /// Date formatting configuration.
    pub dates: DatesConfig,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw docs configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    source_dir: Option<String>,
    cache_enabled: Option<bool>,
    load_timeout_ms: Option<u64>,
}

/// Resolved document source configuration with absolute paths.
#[derive(Debug)]
pub struct DocsConfig {
    /// Root directory containing the documents.
    pub source_dir: PathBuf,
    /// Whether loaded document bytes are cached in-process.
    pub cache_enabled: bool,
    /// Upper bound for a single document or component load.
    pub load_timeout: Duration,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("posts"),
            cache_enabled: true,
            load_timeout: Duration::from_millis(DEFAULT_LOAD_TIMEOUT_MS),
        }
    }
}

const DEFAULT_LOAD_TIMEOUT_MS: u64 = 5000;

/// Transform pipeline stage switches.
///
/// Stage order is fixed; these flags only enable or skip a stage.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PipelineConfig {
    /// Straight quotes and dashes to typographic equivalents.
    pub typography: bool,
    /// TeX math to MathML.
    pub math: bool,
    /// Code block syntax highlighting.
    pub highlight: bool,
    /// Live evaluation of code blocks marked `live`.
    pub evaluate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            typography: true,
            math: true,
            highlight: true,
            evaluate: false,
        }
    }
}

/// Live code evaluation configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EvaluateConfig {
    /// Wall-clock limit for one evaluation, in milliseconds.
    pub timeout_ms: u64,
    /// Maximum captured output per evaluation, in bytes.
    pub max_output_bytes: usize,
    /// Interpreter command per fence language (e.g., `js = ["node", "-"]`).
    ///
    /// The source is written to the command's stdin.
    pub commands: BTreeMap<String, Vec<String>>,
}

impl EvaluateConfig {
    /// Evaluation timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            max_output_bytes: 64 * 1024,
            commands: BTreeMap::new(),
        }
    }
}

/// Date formatting configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatesConfig {
    /// POSIX locale name used for month names (e.g., `en_US`, `fr_FR`).
    pub locale: String,
}

impl Default for DatesConfig {
    fn default() -> Self {
        Self {
            locale: "en_US".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`docs.source_dir`").
        field: String,
        /// Error message (e.g., "${`POSTS_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `folio.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.docs_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.docs_resolved.cache_enabled = cache_enabled;
        }
        if let Some(evaluate) = settings.evaluate_enabled {
            self.pipeline.evaluate = evaluate;
        }
        if let Some(locale) = &settings.locale {
            self.dates.locale.clone_from(locale);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfigRaw::default(),
            pipeline: PipelineConfig::default(),
            evaluate: EvaluateConfig::default(),
            dates: DatesConfig::default(),
            docs_resolved: DocsConfig {
                source_dir: base.join("posts"),
                ..DocsConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.docs_resolved.load_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "docs.load_timeout_ms must be greater than 0".to_owned(),
            ));
        }
        self.validate_evaluate()?;
        require_non_empty(&self.dates.locale, "dates.locale")?;
        if chrono::Locale::try_from(self.dates.locale.as_str()).is_err() {
            return Err(ConfigError::Validation(format!(
                "dates.locale: unknown locale {:?}",
                self.dates.locale
            )));
        }
        Ok(())
    }

    /// Validate evaluation configuration.
    fn validate_evaluate(&self) -> Result<(), ConfigError> {
        if self.evaluate.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "evaluate.timeout_ms must be greater than 0".to_owned(),
            ));
        }
        if self.evaluate.max_output_bytes == 0 {
            return Err(ConfigError::Validation(
                "evaluate.max_output_bytes must be greater than 0".to_owned(),
            ));
        }
        for (language, command) in &self.evaluate.commands {
            let field = format!("evaluate.commands.{language}");
            match command.first() {
                Some(program) => require_non_empty(program, &field)?,
                None => return Err(ConfigError::Validation(format!("{field} cannot be empty"))),
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.docs.source_dir {
            self.docs.source_dir = Some(expand::expand_env(dir, "docs.source_dir")?);
        }

        for (language, command) in &mut self.evaluate.commands {
            let field = format!("evaluate.commands.{language}");
            for part in command.iter_mut() {
                *part = expand::expand_env(part, &field)?;
            }
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.docs_resolved = DocsConfig {
            source_dir: config_dir.join(self.docs.source_dir.as_deref().unwrap_or("posts")),
            cache_enabled: self.docs.cache_enabled.unwrap_or(true),
            load_timeout: Duration::from_millis(
                self.docs.load_timeout_ms.unwrap_or(DEFAULT_LOAD_TIMEOUT_MS),
            ),
        };
    }
}
