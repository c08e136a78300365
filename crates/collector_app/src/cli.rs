use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "collector",
    version,
    about = "Run the keyword news collector and follow its progress"
)]
pub struct Cli {
    /// Configuration file (created with defaults when missing)
    #[arg(long, default_value = "collector.ron")]
    pub config: PathBuf,

    /// Keywords to collect; comma separated and/or repeated
    #[arg(long, short = 'k', required = true, num_args = 1..)]
    pub keywords: Vec<String>,

    /// Destination spreadsheet (defaults to the configured path)
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Save the session log into this directory on exit
    #[arg(long)]
    pub save_log: Option<PathBuf>,

    /// Write diagnostic logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Verbose diagnostics on the terminal
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
