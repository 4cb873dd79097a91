use imagelib_backend::command::{App, QueryField};
use imagelib_backend::config::AppConfig;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "imagelib", about = "Astrophotography image library and catalog tools")]
struct Cli {
    /// Configuration file (default: imagelib.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the catalog tables and load both catalogs
    Create { sac: PathBuf, iau: PathBuf },
    /// Drop the catalog tables, then create
    Recreate { sac: PathBuf, iau: PathBuf },
    /// Print some statistics about the catalog
    Stats,
    /// Search the catalog
    Query {
        #[arg(long, value_enum, default_value = "target")]
        field: QueryField,
        term: String,
    },
    /// Print the canonical name for a target
    Cname { name: String },
    /// List images matching a target query, newest first
    Search {
        query: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Add images from FITS header dumps
    Ingest {
        #[arg(required = true)]
        dumps: Vec<PathBuf>,
    },
    /// Print image library status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    let _logging_guard = imagelib_backend::logging::init_logging(
        &config.log_dir,
        "imagelib",
        &config.log_level,
    )?;

    tracing::debug!("Using database {}", config.database.display());
    let app = App::open(config)?;

    let output = match &cli.command {
        Command::Create { sac, iau } => app.create(sac, iau).await?,
        Command::Recreate { sac, iau } => app.recreate(sac, iau).await?,
        Command::Stats => app.stats()?,
        Command::Query { field, term } => app.query(*field, term)?,
        Command::Cname { name } => app.cname(name),
        Command::Search { query, limit } => app.search(query.as_deref(), *limit)?,
        Command::Ingest { dumps } => app.ingest(dumps).await?,
        Command::Status => app.status()?,
    };
    println!("{}", output);

    Ok(())
}
