//! `hearth`: browse the event / community / location directory from a shell.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hearth_common::{load_config, Config, LogFormat};
use hearth_directory::{DirectoryReader, DirectorySnapshot, FileStore};

mod cmd;

#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "Query the local event directory")]
#[command(version)]
struct Cli {
    /// TOML config file; environment variables override its values
    #[arg(short, long, global = true, env = "HEARTH_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Category tree with event counts
    Taxonomy,

    /// Communities ranked by upcoming events
    Communities,

    /// Filter and list events
    Query(cmd::query::QueryArgs),

    /// Show one event with its references resolved
    Event { id: String },

    /// Show a location, its main community and guests
    Location { id: String },

    /// Show a community, its locations and upcoming events
    Community { id: String },

    /// Inspect or reset the saved filters
    #[command(subcommand)]
    Filters(cmd::filters::FiltersCommand),

    /// JSON Schema of the saved filter record
    Schema,
}

/// Everything a command needs: resolved config and output mode.
pub struct App {
    pub config: Config,
    pub json: bool,
}

impl App {
    pub fn state_store(&self) -> FileStore {
        FileStore::new(&self.config.state_path)
    }

    pub fn reader(&self) -> Result<DirectoryReader> {
        let snapshot = load_snapshot(&self.config.data_dir)?;
        Ok(DirectoryReader::new(snapshot).with_page_size(self.config.page_size))
    }
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_env_with_file(load_config(path)?)?,
        None => Config::from_env()?,
    };
    init_tracing(config.log_format)?;

    let app = App {
        config,
        json: cli.json,
    };

    match cli.command {
        Commands::Taxonomy => cmd::show::taxonomy(&app),
        Commands::Communities => cmd::show::communities(&app),
        Commands::Query(args) => cmd::query::run(&app, args),
        Commands::Event { id } => cmd::show::event(&app, &id),
        Commands::Location { id } => cmd::show::location(&app, &id),
        Commands::Community { id } => cmd::show::community(&app, &id),
        Commands::Filters(command) => cmd::filters::run(&app, command),
        Commands::Schema => {
            let schema = hearth_directory::filter_spec_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("hearth=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

fn load_snapshot(data_dir: &Path) -> Result<DirectorySnapshot> {
    let read = |name: &str| -> Result<String> {
        let path = data_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))
    };

    let events = read("events.json")?;
    let communities = read("communities.json")?;
    let locations = read("locations.json")?;

    info!(data_dir = %data_dir.display(), "Loading directory");
    DirectorySnapshot::from_json(&events, &communities, &locations)
        .with_context(|| format!("Invalid directory data in {}", data_dir.display()))
}
