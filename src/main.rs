//! Bindery - a catalog and page server for comic libraries.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bindery::{
    api::{self, ApiState},
    library::{Library, LibraryConfig},
    settings::Settings,
    worker::{self, WorkerConfig},
};

/// Catalog and page server for comic libraries.
#[derive(Parser)]
#[command(name = "bindery", about = "Catalog and page server for comic libraries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct LibraryArgs {
    /// Library root; one subdirectory per publication. Overrides config.json.
    #[arg(long, env = "BINDERY_LIBRARY_DIR")]
    library_dir: Option<PathBuf>,

    /// Data directory for the catalog store and config.json.
    #[arg(long, env = "BINDERY_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

impl LibraryArgs {
    /// Library configuration and the settings file it was resolved with.
    fn resolve(self) -> Result<(LibraryConfig, Settings)> {
        let data_dir = self
            .data_dir
            .unwrap_or_else(|| LibraryConfig::default().data_dir);
        let settings = Settings::load_or_init(&data_dir)
            .with_context(|| format!("Failed to load settings from {}", data_dir.display()))?;

        let library_dir = self
            .library_dir
            .unwrap_or_else(|| settings.library_dir(&data_dir));

        Ok((LibraryConfig::new(library_dir, data_dir), settings))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server.
    Serve {
        /// Address to bind the API server. Overrides config.json.
        #[arg(long, env = "BINDERY_BIND")]
        bind: Option<String>,

        #[command(flatten)]
        library: LibraryArgs,

        /// Seconds between periodic rescans; 0 disables them. Overrides
        /// config.json.
        #[arg(long, env = "BINDERY_RESCAN_INTERVAL")]
        rescan_interval_secs: Option<u64>,
    },

    /// Scan the library once and print what was found.
    Scan {
        #[command(flatten)]
        library: LibraryArgs,
    },

    /// Show server status.
    Status {
        /// Bindery API URL.
        #[arg(long, env = "BINDERY_API_URL", default_value = "http://localhost:6969")]
        api_url: String,
    },

    /// List publications known to a running server.
    List {
        /// Bindery API URL.
        #[arg(long, env = "BINDERY_API_URL", default_value = "http://localhost:6969")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bindery=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            library,
            rescan_interval_secs,
        } => {
            let (config, settings) = library.resolve()?;
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            let worker_config = WorkerConfig {
                rescan_interval: rescan_interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| settings.rescan_interval()),
            };
            run_server(&bind, config, worker_config).await?;
        }

        Commands::Scan { library } => {
            let (config, _) = library.resolve()?;
            scan_once(config)?;
        }

        Commands::Status { api_url } => {
            show_status(&api_url).await?;
        }

        Commands::List { api_url } => {
            list_publications(&api_url).await?;
        }
    }

    Ok(())
}

fn open_library(config: LibraryConfig) -> Result<Library> {
    config
        .ensure_dirs()
        .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;
    Ok(Library::open(config)?)
}

/// Run the API server.
async fn run_server(bind: &str, config: LibraryConfig, worker_config: WorkerConfig) -> Result<()> {
    tracing::info!("Starting Bindery server...");

    let library = open_library(config)?;
    let state = Arc::new(ApiState::new(library));

    // Nothing is served until the first scan succeeds
    let report = state.refresh().await.context("Initial library scan failed")?;
    tracing::info!(
        publications = report.entries.len(),
        created_publications = report.created_publications,
        created_installments = report.created_installments,
        "Initial scan complete"
    );

    let _worker_handle = worker::spawn_worker(state.clone(), worker_config);

    api::serve(state, bind).await?;

    Ok(())
}

/// Scan the library once without serving it.
fn scan_once(config: LibraryConfig) -> Result<()> {
    let mut library = open_library(config)?;
    let report = library.scan()?;

    if report.entries.is_empty() {
        println!("No publications found.");
        return Ok(());
    }

    println!("{:<6} {:<40}", "INDEX", "NAME");
    println!("{}", "-".repeat(46));

    for (ordinal, entry) in report.entries.iter().enumerate() {
        println!("{:<6} {:<40}", ordinal, entry.name);
    }

    println!();
    println!(
        "Created {} publications and {} installments.",
        report.created_publications, report.created_installments
    );

    Ok(())
}

/// Show server status via API.
async fn show_status(api_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/status", api_url);

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to get status: {}", response.status());
    }

    let status: serde_json::Value = response.json().await?;

    println!("Bindery Status");
    println!("==============");
    println!("Status:       {}", status["status"]);
    println!("Library:      {}", status["libraryDir"]);
    println!("Publications: {}", status["publications"]);
    println!("Last scan:    {}", status["lastScan"]);

    Ok(())
}

/// List publications via API.
async fn list_publications(api_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/publications", api_url);

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to list publications: {}", response.status());
    }

    let publications: Vec<serde_json::Value> = response.json().await?;

    if publications.is_empty() {
        println!("No publications found.");
        return Ok(());
    }

    println!("{:<6} {:<40} {:<12} {:<6}", "ID", "TITLE", "STATUS", "ITEMS");
    println!("{}", "-".repeat(66));

    for publication in publications {
        println!(
            "{:<6} {:<40} {:<12} {:<6}",
            publication["id"].as_u64().unwrap_or_default(),
            publication["title"].as_str().unwrap_or("?"),
            publication["status"].as_str().unwrap_or("?"),
            publication["installmentCount"].as_u64().unwrap_or_default()
        );
    }

    Ok(())
}
