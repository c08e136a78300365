mod cli;
mod config;
mod effects;
mod host;
mod log_export;
mod persist;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let code = host::run(args)?;
    std::process::exit(code);
}
