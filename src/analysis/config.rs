//! Layered settings
//!
//! `defaults/textchain.default.toml` is embedded into the binary. A user file
//! and command-line overrides are layered on top through [`Loader`] before
//! deserializing into [`Settings`].

use crate::analysis::error::ConfigurationError;
use crate::analysis::fetch::Repository;
use crate::analysis::output::OutputFormat;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../../defaults/textchain.default.toml");

const CONFIG_DIR_NAME: &str = ".textchain";
const CONFIG_FILE_NAME: &str = "textchain.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub fetch: FetchSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    pub local_repository: String,
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

impl FetchSettings {
    /// The local repository with a leading `~` expanded.
    pub fn local_repository_path(&self) -> PathBuf {
        expand_home(&self.local_repository)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    pub format: OutputFormat,
}

/// `~/.textchain/textchain.toml`, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Builds [`Settings`] from the embedded defaults and the layers added on
/// top. A later layer wins over an earlier one, so command-line values are
/// applied last.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        Loader {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    /// An explicitly named settings file; it must exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer_file(path.as_ref(), true)
    }

    /// A settings file that is skipped when absent.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer_file(path.as_ref(), false)
    }

    /// `explicit` when given, otherwise the per-user file if there is one.
    pub fn with_config(self, explicit: Option<&Path>) -> Self {
        match (explicit, user_config_path()) {
            (Some(path), _) => self.with_file(path),
            (None, Some(path)) => self.with_optional_file(path),
            (None, None) => self,
        }
    }

    pub fn local_repository(self, dir: &Path) -> Result<Self, ConfigurationError> {
        self.set("fetch.local_repository", dir.display().to_string())
    }

    pub fn output_format(self, format: OutputFormat) -> Result<Self, ConfigurationError> {
        let value = match format {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        };
        self.set("output.format", value)
    }

    pub fn build(self) -> Result<Settings, ConfigurationError> {
        Ok(self.builder.build()?.try_deserialize()?)
    }

    fn layer_file(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(source);
        self
    }

    fn set(mut self, key: &str, value: impl Into<ValueKind>) -> Result<Self, ConfigurationError> {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
