use anyhow::{Context, Result};
use colored::Colorize;

use crate::core::config::OutputFormat;
use crate::core::engine::Descriptor;

/// Turns a descriptor into the text printed by the command line.
pub trait DescriptorReporter {
    fn render_report(&self, descriptor: &Descriptor) -> Result<String>;
}

/// Prints the rendered version, or the whole descriptor in a data format.
pub struct FormatReporter {
    format: OutputFormat,
}

impl FormatReporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl DescriptorReporter for FormatReporter {
    fn render_report(&self, descriptor: &Descriptor) -> Result<String> {
        let content = match self.format {
            OutputFormat::Text => descriptor.to_string(),
            OutputFormat::Json => {
                serde_json::to_string_pretty(descriptor).context("Failed to serialize to JSON")?
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(descriptor).context("Failed to serialize to YAML")?
            }
            OutputFormat::Toml => {
                toml::to_string_pretty(descriptor).context("Failed to serialize to TOML")?
            }
        };
        Ok(content)
    }
}

/// A colored, human-readable summary used by the `show` command.
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn format_tag(descriptor: &Descriptor) -> String {
        let marker = &descriptor.marker;
        if marker.is_found() {
            format!(
                "{} ({} commits since)",
                marker.name.bright_green().bold(),
                marker.distance
            )
        } else {
            format!(
                "{} ({} commits in history)",
                "none".bright_blue(),
                marker.distance
            )
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorReporter for ConsoleReporter {
    fn render_report(&self, descriptor: &Descriptor) -> Result<String> {
        let commit = &descriptor.commit;
        // 🟡: uncommitted changes, 🟢: clean or not checked.
        let state = if descriptor.dirty {
            format!("🟡 {}", "dirty".red().bold())
        } else {
            format!("🟢 {}", "clean".green())
        };

        let lines = [
            format!(
                "{} {}",
                "Version:".cyan().bold(),
                descriptor.to_string().bright_yellow().bold()
            ),
            format!("├─ Commit: {}", commit.hash),
            format!("├─ Author: {} <{}>", commit.author.name, commit.author.email),
            format!("├─ Date:   {}", commit.timestamp.to_rfc3339()),
            format!("├─ Tag:    {}", Self::format_tag(descriptor)),
            format!("└─ State:  {state}"),
        ];
        Ok(lines.join("\n"))
    }
}
