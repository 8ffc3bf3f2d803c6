//! Prints a version string for the current checkout, built from the
//! nearest tag, the number of commits since that tag, the commit id and,
//! on request, whether the working tree has uncommitted changes.
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use git_descriptor::builders::reporter::{ConsoleReporter, DescriptorReporter, FormatReporter};
use git_descriptor::core::config::{LogConfig, OutputFormat};
use git_descriptor::utils::{self, Overrides};
use git_descriptor::TemplateChoice;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-descriptor")]
#[command(about = "Describe the HEAD of a git repository as a version string")]
struct Cli {
    /// Log progress messages
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log debug messages with their source location
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DescribeArgs {
    /// Path of the repository
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Render as <tag>-<count>
    #[arg(long, conflicts_with_all = ["semver", "template"])]
    package: bool,

    /// Render as <tag>.<count>
    #[arg(long, conflicts_with = "template")]
    semver: bool,

    /// Render with a custom template, e.g. '{{.Tag.Name}}+{{.Commit.ShortHash}}'
    #[arg(short, long)]
    template: Option<String>,

    /// Append -dirty when the working tree has uncommitted changes
    #[arg(long)]
    dirty: bool,
}

impl DescribeArgs {
    fn overrides(&self) -> Overrides {
        let template = if self.package {
            Some(TemplateChoice::Package)
        } else if self.semver {
            Some(TemplateChoice::Semver)
        } else {
            self.template.clone().map(TemplateChoice::Custom)
        };
        Overrides {
            template,
            dirty_check: self.dirty,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the version string
    Describe {
        #[command(flatten)]
        args: DescribeArgs,

        /// Print the full descriptor in this format instead
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },
    /// Show every fact behind the version string
    Show {
        #[command(flatten)]
        args: DescribeArgs,
    },
    /// Write a default .git/describe.toml for this repository
    Init {
        /// Path of the repository
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => {
            utils::init_logging(&LogConfig {
                verbose: cli.verbose,
                debug: cli.debug,
            })?;
            utils::initialize_repository(&path)
        }
        Commands::Describe { args, output } => {
            let config = utils::load_project_config(&args.path)?;
            utils::init_logging(&LogConfig {
                verbose: cli.verbose || config.log.verbose,
                debug: cli.debug || config.log.debug,
            })?;
            let options = utils::resolve_options(&config, &args.overrides())?;
            let reporter = FormatReporter::new(output.unwrap_or(config.output));
            println!("{}", utils::describe_repository(&args.path, &options, &reporter)?);
            Ok(())
        }
        Commands::Show { args } => {
            let config = utils::load_project_config(&args.path)?;
            utils::init_logging(&LogConfig {
                verbose: cli.verbose || config.log.verbose,
                debug: cli.debug || config.log.debug,
            })?;
            let options = utils::resolve_options(&config, &args.overrides())?;
            let reporter: &dyn DescriptorReporter = &ConsoleReporter::new();
            println!("{}", utils::describe_repository(&args.path, &options, reporter)?);
            Ok(())
        }
    }
}
