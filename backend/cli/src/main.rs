mod config;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use bootforge_config::{io, Version, MAX_VERSION};

use config::Config;
use terminal_output::{format_report, supports_color};

#[derive(Parser)]
#[command(name = "bootforge")]
#[command(about = "Bootforge — provisioning config validator and translator")]
#[command(version)]
struct Cli {
    /// Log filter, overriding BOOTFORGE_LOG and RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory for rolling JSON logs
    #[arg(long, global = true, env = "BOOTFORGE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, translate and validate a config, printing every diagnostic
    Validate {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Print a config translated to the current version
    Translate {
        file: PathBuf,
        /// Single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Render the configuration reference
    Docs {
        /// Config version to document
        #[arg(long, default_value_t = MAX_VERSION)]
        version: Version,
        /// Write the reference here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Fail if the reference at --output (or BOOTFORGE_DOCS_PATH) is stale
        #[arg(long)]
        check: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            terminal_output::note_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if cli.log_dir.is_some() {
        config.log_dir = cli.log_dir;
    }

    bootforge_logging::init_logger(
        cli.log_level.as_deref(),
        &config.log_level,
        config.log_dir.as_ref(),
    )?;

    match cli.command {
        Commands::Validate { file, format } => {
            let prepared = io::load_and_prepare(&file).await?;
            match format {
                Format::Text => print!("{}", format_report(&prepared.report, supports_color())),
                Format::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&prepared.report.entries)
                        .context("Failed to serialize report")?
                ),
            }
            Ok(exit_code(prepared.report.is_fatal()))
        }
        Commands::Translate { file, compact } => {
            let prepared = io::load_and_prepare(&file).await?;
            if prepared.report.is_fatal() {
                eprint!("{}", format_report(&prepared.report, supports_color()));
                return Ok(ExitCode::FAILURE);
            }
            let json = if compact {
                serde_json::to_string(&prepared.config)
            } else {
                serde_json::to_string_pretty(&prepared.config)
            }
            .context("Failed to serialize translated config")?;
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Docs {
            version,
            output,
            check,
        } => {
            if !version.is_supported() {
                anyhow::bail!("unsupported config version {version}");
            }
            if check {
                let path = output.unwrap_or(config.docs_path);
                io::verify_config_docs(&path, version).await?;
                info!(path = %path.display(), "Config docs up to date");
                terminal_output::note_success(&format!("{} is up to date", path.display()));
            } else if let Some(path) = output {
                io::write_config_docs(&path, version).await?;
            } else {
                print!("{}", bootforge_config::config_docs_markdown(version)?);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(fatal: bool) -> ExitCode {
    if fatal {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
