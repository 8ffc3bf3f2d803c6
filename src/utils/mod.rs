use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use std::path::Path;

use crate::builders::reporter::DescriptorReporter;
use crate::builders::template::TemplateChoice;
use crate::core::config::{
    ConfigManager, ConfigProvider, DescribeOptions, LogConfig, ProjectConfig,
};
use crate::core::engine::{Descriptor, describe};

/// Template and dirty-check choices given on the command line. Anything left
/// unset falls back to the repository's configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub template: Option<TemplateChoice>,
    pub dirty_check: bool,
}

/// Installs the stderr log subscriber for the binary.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(config.level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(config.debug)
        .with_line_number(config.debug)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("Could not set up logging: {e}"))
}

/// Loads `.git/describe.toml` when `path` is a repository with a `.git`
/// directory; otherwise the defaults apply.
pub fn load_project_config(path: &Path) -> Result<ProjectConfig> {
    match ConfigManager::new_at(path) {
        Ok(manager) => manager.load_config(),
        Err(_) => Ok(ProjectConfig::default()),
    }
}

/// Merges command line overrides over the file configuration. The file's
/// template setting is only consulted when no template override is given.
pub fn resolve_options(config: &ProjectConfig, overrides: &Overrides) -> Result<DescribeOptions> {
    let template = match &overrides.template {
        Some(template) => template.clone(),
        None => config.describe_options()?.template,
    };
    Ok(DescribeOptions {
        template,
        dirty_check: config.dirty_check || overrides.dirty_check,
    })
}

/// Runs a describe and formats the result with `reporter`.
pub fn describe_repository(
    path: &Path,
    options: &DescribeOptions,
    reporter: &dyn DescriptorReporter,
) -> Result<String> {
    let descriptor: Descriptor = describe(path, options)
        .with_context(|| format!("Failed to describe {}", path.display()))?;
    reporter.render_report(&descriptor)
}

pub fn initialize_repository(path: &Path) -> Result<()> {
    let config_manager = ConfigManager::new_at(path)?;
    if config_manager.initialize()? {
        println!(
            "{} Wrote {}",
            "✓".green().bold(),
            config_manager.get_config_path().display()
        );
    } else {
        println!(
            "{} {} already exists",
            "•".bright_blue(),
            config_manager.get_config_path().display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_file_settings() {
        let config = ProjectConfig {
            template: "package".to_string(),
            ..ProjectConfig::default()
        };
        let overrides = Overrides {
            template: Some(TemplateChoice::Semver),
            dirty_check: true,
        };
        let options = resolve_options(&config, &overrides).unwrap();
        assert_eq!(options, DescribeOptions::new().with_semver_template().with_dirty_check());
    }

    #[test]
    fn test_file_settings_apply_without_overrides() {
        let config = ProjectConfig {
            template: "package".to_string(),
            dirty_check: true,
            ..ProjectConfig::default()
        };
        let options = resolve_options(&config, &Overrides::default()).unwrap();
        assert_eq!(options, DescribeOptions::new().with_package_template().with_dirty_check());
    }

    #[test]
    fn test_override_wins_over_unknown_preset_in_file() {
        let config = ProjectConfig {
            template: "calver".to_string(),
            dirty_check: true,
            ..ProjectConfig::default()
        };
        let overrides = Overrides {
            template: Some(TemplateChoice::Semver),
            dirty_check: false,
        };
        let options = resolve_options(&config, &overrides).unwrap();
        assert_eq!(options, DescribeOptions::new().with_semver_template().with_dirty_check());

        let err = resolve_options(&config, &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("calver"), "got {err}");
    }

    #[test]
    fn test_missing_repository_uses_default_config() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_project_config(dir.path()).unwrap(), ProjectConfig::default());
    }
}
