use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::template::TemplateChoice;

/// Name of the per-repository configuration file inside `.git/`.
pub const CONFIG_FILE_NAME: &str = "describe.toml";

/// What a single describe call should do.
///
/// `Default` renders with the default preset and skips the working tree scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeOptions {
    pub template: TemplateChoice,
    /// Scan the working tree for changes. Off by default since it touches every tracked file.
    pub dirty_check: bool,
}

impl DescribeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<tag>-<count>`, or `<count>` without a tag.
    pub fn with_package_template(mut self) -> Self {
        self.template = TemplateChoice::Package;
        self
    }

    /// `<tag>.<count>`, or `0.0.<count>` without a tag.
    pub fn with_semver_template(mut self) -> Self {
        self.template = TemplateChoice::Semver;
        self
    }

    pub fn with_template(mut self, text: impl Into<String>) -> Self {
        self.template = TemplateChoice::Custom(text.into());
        self
    }

    pub fn with_dirty_check(mut self) -> Self {
        self.dirty_check = true;
        self
    }
}

/// How the `describe` command prints its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Only the rendered version string.
    #[default]
    Text,
    Json,
    Yaml,
    Toml,
}

/// Diagnostic output settings, owned by the caller and passed explicitly.
///
/// Only errors are logged by default; `verbose` adds info messages and
/// `debug` adds debug messages with their source location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub verbose: bool,
    pub debug: bool,
}

impl LogConfig {
    pub fn level(&self) -> tracing::Level {
        if self.debug {
            tracing::Level::DEBUG
        } else if self.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::ERROR
        }
    }
}

/// Contents of `.git/describe.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub version: String,
    /// Preset name: `default`, `package` or `semver`.
    pub template: String,
    /// Takes precedence over `template` when set.
    pub custom_template: Option<String>,
    pub dirty_check: bool,
    pub output: OutputFormat,
    pub log: LogConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            template: "default".to_string(),
            custom_template: None,
            dirty_check: false,
            output: OutputFormat::Text,
            log: LogConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Converts the file settings into options for a describe call.
    pub fn describe_options(&self) -> Result<DescribeOptions> {
        let template = match &self.custom_template {
            Some(text) => TemplateChoice::Custom(text.clone()),
            None => TemplateChoice::preset(&self.template).with_context(|| {
                format!(
                    "Unknown template preset '{}' (expected default, package or semver)",
                    self.template
                )
            })?,
        };
        Ok(DescribeOptions {
            template,
            dirty_check: self.dirty_check,
        })
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<ProjectConfig>;
    fn save_config(&self, config: &ProjectConfig) -> Result<()>;
    fn get_config_path(&self) -> &Path;
}

/// Reads and writes the configuration file of one repository.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new_at<P: AsRef<Path>>(repo_root: P) -> Result<Self> {
        let repo_root = repo_root.as_ref();
        let git_dir = repo_root.join(".git");
        if !git_dir.is_dir() {
            anyhow::bail!("Not a Git repository: {}", repo_root.display());
        }

        Ok(Self {
            config_path: git_dir.join(CONFIG_FILE_NAME),
        })
    }

    /// Writes the default configuration unless a file already exists.
    /// Returns whether a file was written.
    pub fn initialize(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }

        self.save_config(&ProjectConfig::default())?;
        Ok(true)
    }
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<ProjectConfig> {
        if !self.config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    fn save_config(&self, config: &ProjectConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
