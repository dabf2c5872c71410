use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quire::build::build_site;
use quire::config::Config;
use quire::logging::init_logging;

/// Builds a static blog from Markdown posts and templates.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Project root holding `content/`, `templates/` and the static assets
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Rebuilds the output directory from scratch (the default)
    Build,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let config = Config::from_env(&cli.root).context("loading configuration")?;
            let summary = build_site(&config).context("building site")?;
            log::info!(
                "built {} post(s), {} published, into `{}`",
                summary.posts,
                summary.published,
                summary.output_directory.display()
            );
            Ok(())
        }
    }
}
