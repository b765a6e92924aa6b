//! Command-line interface definitions using clap

use clap::Parser;

/// Shortener - collision-free short codes with buffered hit counters
#[derive(Parser, Debug)]
#[command(name = "shortener")]
#[command(version)]
#[command(about = "URL shortener service", long_about = None)]
pub struct Cli {
    /// Configuration file (default: config.toml if present)
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub generate_config: bool,
}
