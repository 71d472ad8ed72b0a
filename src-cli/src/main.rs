//! PrivacyShield CLI
//!
//! Runs the address cleaner, the navigation watcher and the site data
//! cleaner outside a browser.

mod commands;
mod console;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shield_core::{Action, Config};

#[derive(Parser)]
#[command(name = "privacy-shield")]
#[command(about = "Strip tracking tokens from URLs and clear stored site data")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean addresses given as arguments, or one per stdin line
    Clean {
        urls: Vec<String>,

        /// Report removed parameters on stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Clean fragments given as arguments, or one per stdin line
    Fragment { fragments: Vec<String> },

    /// Watch an in-memory history driven by commands on stdin
    ///
    /// Commands: push <url>, replace <url>, back, forward, hash <fragment>,
    /// wait <ms>, show
    Watch {
        /// Initial address
        url: String,
    },

    /// Run a manual clear action against the site data store
    Clear {
        /// Any address on the site
        url: String,

        /// Site data database (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(short, long, default_value = "clear-all", value_parser = parse_action)]
        action: Action,

        /// Answer yes to every confirmation
        #[arg(short, long)]
        yes: bool,

        /// Print the per-operation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the page hardening initialization script
    InitScript,
}

fn parse_action(id: &str) -> Result<Action, String> {
    Action::from_id(id).ok_or_else(|| {
        let known: Vec<&str> = Action::ALL.iter().map(|a| a.id()).collect();
        format!("unknown action '{id}' (expected one of: {})", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shield_core::init_logging();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Clean { urls, verbose } => commands::clean::run(config, urls, verbose),
        Commands::Fragment { fragments } => commands::clean::run_fragments(config, fragments),
        Commands::Watch { url } => commands::watch::run(config, url).await,
        Commands::Clear {
            url,
            db,
            action,
            yes,
            json,
        } => {
            let db = db.unwrap_or_else(Config::database_path);
            commands::clear::run(config, url, db, action, yes, json).await
        }
        Commands::InitScript => {
            print!("{}", shield_core::init_script());
            Ok(())
        }
    }
}
