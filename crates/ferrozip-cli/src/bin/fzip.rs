//! fzip - create zip archives, compatible with Info-ZIP `zip`

use anyhow::Result;
use clap::Parser;
use ferrozip_cli::{map_error_to_exit_code, setup_logging, LevelFlags};
use ferrozip_core::config::Config;
use ferrozip_core::{create_archive, Discard, StatusSink};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::{debug, error};

/// fzip - package files into a zip archive
#[derive(Parser)]
#[command(name = "fzip")]
#[command(author, version, about = "Create zip archives, compatible with standard zip", long_about = None)]
struct Cli {
    /// Archive file to create
    zipfile: PathBuf,

    /// Files and directories to add
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Travel the directory structure recursively
    #[arg(short = 'r', long = "recurse-paths")]
    recurse_paths: bool,

    /// Exclude files matching pattern (may be repeated)
    #[arg(short = 'x', long, value_name = "PATTERN")]
    exclude: Vec<String>,

    #[command(flatten)]
    level: LevelFlags,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    verbose: bool,

    /// Suppress status lines and all logging except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        error!("Error: {}", e);
        process::exit(map_error_to_exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    let mut options = config.pack_options();
    options.recursive |= cli.recurse_paths;
    if let Some(level) = cli.level.level() {
        options.level = level;
    }
    options.exclude.extend(cli.exclude);
    debug!("Pack options: {:?}", options);

    let mut stdout = io::stdout();
    let mut discard = Discard;
    let sink: &mut dyn StatusSink = if cli.quiet {
        &mut discard
    } else {
        &mut stdout
    };

    create_archive(&cli.zipfile, &cli.files, &options, sink)?;
    Ok(())
}
