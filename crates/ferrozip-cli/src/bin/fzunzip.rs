//! fzunzip - list and extract zip archives, compatible with Info-ZIP `unzip`

use anyhow::Result;
use clap::Parser;
use ferrozip_cli::{map_error_to_exit_code, render_listing, setup_logging};
use ferrozip_core::config::Config;
use ferrozip_core::{extract_archive, list_entries, Discard, StatusSink};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::{debug, error};

/// fzunzip - extract files from a zip archive
#[derive(Parser)]
#[command(name = "fzunzip")]
#[command(author, version, about = "Extract zip archives, compatible with standard unzip", long_about = None)]
struct Cli {
    /// Archive file to read
    zipfile: PathBuf,

    /// Only extract entries whose base name matches one of these patterns
    patterns: Vec<String>,

    /// List archive contents instead of extracting
    #[arg(short, long)]
    list: bool,

    /// Print the listing as JSON
    #[arg(long, requires = "list")]
    json: bool,

    /// Overwrite existing files
    #[arg(short, long)]
    overwrite: bool,

    /// Extract files into this directory
    #[arg(short = 'd', long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Junk (ignore) directory paths
    #[arg(short, long)]
    junk_paths: bool,

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
    if cli.list {
        return list(&cli);
    }

    let config = Config::load()?;

    let mut options = config.extract_options();
    options.overwrite |= cli.overwrite;
    options.junk_paths |= cli.junk_paths;
    options.patterns = cli.patterns;
    if let Some(directory) = cli.directory {
        options.output_dir = directory;
    }
    debug!("Extract options: {:?}", options);

    let mut stdout = io::stdout();
    let mut discard = Discard;
    let sink: &mut dyn StatusSink = if cli.quiet {
        &mut discard
    } else {
        &mut stdout
    };

    extract_archive(&cli.zipfile, &options, sink)?;
    Ok(())
}

fn list(cli: &Cli) -> Result<()> {
    let entries = list_entries(&cli.zipfile)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", render_listing(&entries));
    }

    Ok(())
}
