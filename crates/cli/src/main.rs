mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// BitML contract to ISPL compiler.
#[derive(Parser)]
#[command(name = "bitmc", version, about = "BitML contract to ISPL compiler")]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a job document (contract + formulae) to an ISPL model
    Compile {
        /// Path to the JSON job document
        job: PathBuf,
        /// TOML file with compile options
        #[arg(long)]
        options: Option<PathBuf>,
        /// Write the model to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Emit the model as JSON instead of ISPL text
        #[arg(long)]
        json: bool,
    },

    /// Validate a contract and check it is within the compilable subset
    Check {
        /// Path to the JSON contract
        contract: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match cli.command {
        Commands::Compile {
            job,
            options,
            output,
            json,
        } => {
            commands::compile::cmd_compile(commands::compile::CompileArgs {
                job: &job,
                options: options.as_deref(),
                output: output.as_deref(),
                json,
                quiet: cli.quiet,
            });
        }
        Commands::Check { contract } => {
            commands::check::cmd_check(&contract, cli.quiet);
        }
    }
}

/// Logs go to stderr; stdout carries only the emitted model.
fn init_tracing(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn report_error(msg: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", msg);
    }
}
