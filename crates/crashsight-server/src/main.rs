mod export;
mod http;
mod metrics;
mod sample;
mod state;
mod static_ui;
mod tui;
mod view;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use crashsight_core::dashboard::{Dashboard, DashboardOptions, DEFAULT_AUTHOR};
use crashsight_core::dataset::Dataset;
use http::router;
use metrics_exporter_prometheus::PrometheusBuilder;
use state::{AppState, ServerConfig};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;
use tui::{run_tui, TuiApp};

#[derive(Parser)]
#[command(name = "crashsight")]
#[command(about = "Crash issue dashboard: filter crash groups by build, time and text, inspect events, close issues with notes")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct DataArgs {
    /// Dataset JSON file (bundled sample when omitted)
    #[arg(long)]
    data: Option<PathBuf>,
    /// Author recorded on notes
    #[arg(long, default_value = DEFAULT_AUTHOR)]
    author: String,
    /// Also drop issues with no event inside the selected time range
    #[arg(long)]
    enforce_time_range: bool,
    /// Directory for export bundles
    #[arg(long, default_value = "./exports")]
    export_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON API and web dashboard
    Serve {
        #[command(flatten)]
        data: DataArgs,
        /// HTTP server address
        #[arg(long, default_value = "127.0.0.1:8080")]
        http: String,
    },
    /// Run the terminal dashboard
    Tui {
        #[command(flatten)]
        data: DataArgs,
        /// Also serve HTTP on this address
        #[arg(long)]
        http: Option<String>,
        /// Write logs here instead of discarding them
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
}

impl DataArgs {
    fn config(&self, http: Option<String>) -> ServerConfig {
        ServerConfig {
            http,
            export_dir: self.export_dir.clone(),
            options: DashboardOptions {
                author: self.author.clone(),
                enforce_time_range: self.enforce_time_range,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let writer = match &cli.command {
        Commands::Tui { log_file: Some(path), .. } => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        Commands::Tui { log_file: None, .. } => BoxMakeWriter::new(std::io::sink),
        Commands::Serve { .. } => BoxMakeWriter::new(std::io::stdout),
    };
    init_tracing(writer, cli.log_json, matches!(cli.command, Commands::Serve { .. }));

    match cli.command {
        Commands::Serve { data, http } => {
            let config = data.config(Some(http));
            let state = build_state(data.data.as_deref(), &config)?;
            serve(state, &config).await?;
        }
        Commands::Tui { data, http, .. } => {
            let config = data.config(http);
            let state = build_state(data.data.as_deref(), &config)?;
            if config.http.is_some() {
                let server_state = state.clone();
                let server_config = config.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve(server_state, &server_config).await {
                        error!("HTTP server stopped: {:#}", e);
                    }
                });
            }
            run_tui(TuiApp::new(), state).await?;
        }
    }

    Ok(())
}

fn init_tracing(writer: BoxMakeWriter, json: bool, ansi: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(ansi);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_dataset(path: Option<&std::path::Path>) -> anyhow::Result<Dataset> {
    match path {
        Some(path) => Dataset::load(path)
            .with_context(|| format!("Failed to load dataset {}", path.display())),
        None => {
            info!("No --data given, using the bundled sample dataset");
            sample::sample_dataset().context("Bundled sample dataset is invalid")
        }
    }
}

fn build_state(path: Option<&std::path::Path>, config: &ServerConfig) -> anyhow::Result<AppState> {
    let dataset = load_dataset(path)?;
    info!(
        "Loaded {} issues across {} versions",
        dataset.issues.len(),
        dataset.versions.len()
    );
    let dashboard = Dashboard::new(dataset, config.options.clone());

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus metrics recorder")?;
    Ok(AppState::new(dashboard, config.export_dir.clone()).with_metrics(handle))
}

async fn serve(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let Some(addr) = config.http.as_deref() else {
        return Ok(());
    };
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on http://{}", addr);
    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")?;
    Ok(())
}
