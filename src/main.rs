mod calc;
mod cmd;
mod data;
mod ui;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "steps", about = "daily walking distance ledger")]
struct Cli {
    /// Path to the data directory containing config.yaml (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config.yaml into the data directory
    Init,
    /// Total "DD.MM.YYYY DISTANCE" lines and print the table
    Tally {
        /// File to read instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let data_dir = resolve_data_dir(&cli.data_dir)?;
    log::debug!("data dir: {}", data_dir.display());
    data::persistence::set_data_dir(data_dir);

    match cli.command {
        None => cmd::root::run(),
        Some(Commands::Init) => cmd::init::run(),
        Some(Commands::Tally { input, json }) => cmd::tally::run(input.as_deref(), json),
    }
}

/// Makes `dir` absolute so later lookups do not depend on the working directory.
fn resolve_data_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}
