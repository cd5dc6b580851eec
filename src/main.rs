use attract_library::commands::*;
use attract_library::core::{error::Result, print_error};
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "attract-library")]
#[command(about = "Game library index and cache for attract-mode frontends")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Use this config file instead of the default one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan system folders and rebuild changed gamelists
    Build {
        /// Rebuild every system even if its folders are unchanged
        #[arg(long)]
        overwrite: bool,
        /// Only build these systems or groups (e.g. "NES,SNES" or "Handheld")
        #[arg(long, value_delimiter = ',')]
        systems: Vec<String>,
    },
    /// Pick titles the way attract mode does
    Pick {
        /// Number of titles to pick
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Search the GameIndex by title
    Search {
        /// Title to look for; a trailing extension (e.g. ".nes") filters by type
        query: String,
    },
    /// Show every cached list with its entry count
    Lists,
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Build { overwrite, systems } => execute_build(config, overwrite, systems),
        Commands::Pick { count } => execute_pick(config, count),
        Commands::Search { query } => execute_search(config, &query),
        Commands::Lists => execute_lists(config),
    }
}

fn main() {
    let cli = Cli::parse();

    // Configure logging based on --debug flag
    if cli.debug {
        env::set_var("RUST_LOG", "debug");
    } else if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    if let Err(e) = run(cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
