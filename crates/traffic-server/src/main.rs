mod browser_map;
mod error;
mod http;
mod metrics;
mod state;
mod static_ui;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crate::http::router;
use crate::metrics::init_metrics;
use crate::state::AppState;
use std::path::PathBuf;
use tracing::info;
use traffic_core::{ContainerSize, LatLng, MapConfig, DEFAULT_CENTER, DEFAULT_ZOOM, FOCUS_ZOOM};

#[derive(Parser)]
#[command(name = "traffic-tracker")]
#[command(about = "Record traffic incidents in Tunisia and show them on a map")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tracker page and its session API
    Serve {
        /// HTTP server address
        #[arg(long, default_value = "127.0.0.1:8080")]
        http: String,
        /// Map provider API key
        #[arg(long)]
        map_api_key: Option<String>,
        /// Initial map center latitude
        #[arg(long, default_value_t = DEFAULT_CENTER.lat)]
        center_lat: f64,
        /// Initial map center longitude
        #[arg(long, default_value_t = DEFAULT_CENTER.lng)]
        center_lng: f64,
        /// Initial map zoom
        #[arg(long, default_value_t = DEFAULT_ZOOM)]
        zoom: u8,
        /// Zoom applied when centering on a new incident
        #[arg(long, default_value_t = FOCUS_ZOOM)]
        focus_zoom: u8,
        /// Largest accepted image upload, in bytes
        #[arg(long, default_value = "10485760")]
        max_image_bytes: usize,
    },
    /// Encode an image file as a data URI
    Encode {
        /// Image file to encode; without one nothing is encoded
        #[arg(long)]
        input: Option<PathBuf>,
        /// Print only the MIME type and URI length
        #[arg(long)]
        summary: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Serve {
            http,
            map_api_key,
            center_lat,
            center_lng,
            zoom,
            focus_zoom,
            max_image_bytes,
        } => {
            let config = MapConfig {
                center: LatLng::new(center_lat, center_lng),
                default_zoom: zoom,
                focus_zoom,
                api_key: map_api_key,
                container: ContainerSize::default(),
            };
            serve(http, config, max_image_bytes).await?;
        }
        Commands::Encode { input, summary } => {
            encode(input, summary).await?;
        }
    }

    Ok(())
}

async fn serve(http_addr: String, config: MapConfig, max_image_bytes: usize) -> anyhow::Result<()> {
    info!("Starting traffic tracker");
    if config.api_key.is_none() {
        info!("No map API key configured, the map will stay on its loading placeholder");
    }

    let metrics_handle = init_metrics()?;
    let state = AppState::new(config, max_image_bytes, Some(metrics_handle));

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {}", http_addr))?;
    info!("HTTP server listening on http://{}", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Traffic tracker stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn encode(input: Option<PathBuf>, summary: bool) -> anyhow::Result<()> {
    let selection: Vec<PathBuf> = input.into_iter().collect();
    let uri = match traffic_core::ingest_selection(&selection).await {
        Some(result) => result.context("Image ingestion failed")?,
        None => {
            info!("No image selected, nothing to encode");
            return Ok(());
        }
    };

    if summary {
        println!("{} ({} chars)", uri.mime(), uri.as_str().len());
    } else {
        println!("{}", uri);
    }
    Ok(())
}
