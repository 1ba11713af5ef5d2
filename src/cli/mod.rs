//! Command-line interface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::{self, Settings};
use crate::geocode::{GeocodeCache, NominatimGeocoder};
use crate::lookup::LookupPipeline;
use crate::server;
use crate::sync::{BoundarySource, OpenStatesSource, SyncEngine, SyncReport};

#[derive(Parser)]
#[command(name = "civichub", about = "Civic data hub: district and official lookups", version)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database.
    Init,
    /// Start the API server.
    Serve {
        /// Host to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind.
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Sync districts and officials from upstream sources.
    Sync {
        /// Sync only this source; all registered sources by default.
        source: Option<String>,
    },
    /// Look up districts and officials for one address.
    Lookup {
        /// Address to resolve.
        address: String,
    },
    /// Show per-source sync status.
    Status,
}

/// Whether -v/--verbose was passed, checked before clap parses.
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Parse arguments and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = config::load_settings(cli.config.as_deref()).await;

    match cli.command {
        Commands::Init => cmd_init(&settings).await,
        Commands::Serve { host, port } => cmd_serve(&settings, &host, port).await,
        Commands::Sync { source } => cmd_sync(&settings, source.as_deref()).await,
        Commands::Lookup { address } => cmd_lookup(&settings, &address).await,
        Commands::Status => cmd_status(&settings).await,
    }
}

async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;

    let tables = ctx.list_tables().await?;
    println!("Initialized database at {}", settings.database_url());
    println!("Tables: {}", tables.join(", "));
    Ok(())
}

async fn cmd_serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    settings.create_db_context()?.init_schema().await?;

    println!("Starting civichub server at http://{}:{}", host, port);
    println!("  Press Ctrl+C to stop");
    server::serve(settings, host, port).await
}

fn build_engine(settings: &Settings) -> anyhow::Result<SyncEngine> {
    let mut engine = SyncEngine::new(settings.create_db_context()?);

    if let Some(ref url) = settings.boundaries_url {
        engine.add_district_source(Arc::new(BoundarySource::new(
            url,
            &settings.user_agent,
            settings.request_timeout(),
        )?));
    }
    if let Some(ref api_key) = settings.openstates_api_key {
        engine.add_official_source(Arc::new(OpenStatesSource::new(
            &settings.openstates_url,
            api_key,
            &settings.jurisdiction,
            &settings.state_fips,
            &settings.user_agent,
            settings.request_timeout(),
        )?));
    }

    if engine.source_names().is_empty() {
        anyhow::bail!(
            "no sources configured; set boundaries_url and/or OPENSTATES_API_KEY"
        );
    }
    Ok(engine)
}

fn print_report(report: &SyncReport) {
    println!(
        "Merged {} districts, {} officials",
        report.districts_merged, report.officials_merged
    );
    for rejection in &report.rejected {
        println!("  rejected: {}", rejection);
    }
    for (source, message) in &report.failed {
        eprintln!("  source {} failed: {}", source, message);
    }
}

async fn cmd_sync(settings: &Settings, source: Option<&str>) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    settings.create_db_context()?.init_schema().await?;
    let engine = build_engine(settings)?;

    let report = match source {
        Some(name) => engine.run_source(name).await?,
        None => engine.run_all().await?,
    };
    print_report(&report);

    if !report.failed.is_empty() {
        anyhow::bail!("{} source(s) failed", report.failed.len());
    }
    Ok(())
}

async fn cmd_lookup(settings: &Settings, address: &str) -> anyhow::Result<()> {
    let ctx = settings.create_db_context()?;
    let geocoder = Arc::new(NominatimGeocoder::new(
        &settings.geocoder_url,
        &settings.user_agent,
        settings.request_timeout(),
    )?);
    let cache = GeocodeCache::new(geocoder, ctx.cache());
    let pipeline = LookupPipeline::new(cache, ctx.districts(), ctx.officials());

    let response = pipeline.lookup(address).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let ctx = settings.create_db_context()?;
    let statuses = ctx.sync_status().get_all().await?;

    if statuses.is_empty() {
        println!("No sync runs recorded yet");
        return Ok(());
    }
    for status in statuses {
        let line = format!(
            "{:<16} {:<8} last sync {}",
            status.source_name,
            status.status.as_str(),
            status.last_sync.to_rfc3339()
        );
        match status.error_message {
            Some(message) => println!("{}  ({})", line, message),
            None => println!("{}", line),
        }
    }
    Ok(())
}
