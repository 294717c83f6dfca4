//! QR code service entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qr_api::api::{create_router, AppState};
use qr_api::config::Config;
use qr_api::metrics;
use qr_api::qr::{self, OutputFormat, QrParams};
use qr_api::utils::shutdown_signal;

/// QR code image service.
#[derive(Parser, Debug)]
#[command(name = "qr-api")]
#[command(about = "HTTP service that renders QR codes as PNG or SVG")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Render one QR image to a file, using the same pipeline as the server.
    Render {
        /// Text or URL to encode.
        #[arg(long)]
        data: String,

        /// Output file.
        #[arg(short, long)]
        out: PathBuf,

        /// Edge in pixels (PNG only, clamped to 2000).
        #[arg(long, default_value = "300")]
        size: String,

        /// Foreground color (name or hex).
        #[arg(long, default_value = qr::params::DEFAULT_FG)]
        fg: String,

        /// Background color (name or hex).
        #[arg(long, default_value = qr::params::DEFAULT_BG)]
        bg: String,

        /// Output format: png or svg.
        #[arg(long, default_value = "png")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("qr_api=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Render {
            data,
            out,
            size,
            fg,
            bg,
            format,
        }) => cmd_render(data, out, size, fg, bg, format),
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        None => cmd_serve(args.port).await,
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("QR API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Bind Address: {}", config.bind_addr());
    println!("  Log Level: {}", config.rust_log);
    println!("  Error Status Policy: {}", config.error_status_policy);
    println!("  Developed By: {}", config.developed_by);
    println!("  Documentation: {}", config.documentation_url);
    println!("  Support: {}", config.support_url);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Render one image offline.
fn cmd_render(
    data: String,
    out: PathBuf,
    size: String,
    fg: String,
    bg: String,
    format: String,
) -> anyhow::Result<()> {
    if data.is_empty() {
        return Err(qr_api::QrError::MissingData.into());
    }

    let params = QrParams {
        data,
        size: qr::params::parse_size(&size)?,
        fg,
        bg,
        format: OutputFormat::from_param(&format),
    };

    let image = qr::generate(&params)?;
    std::fs::write(&out, &image.bytes)?;

    info!(
        "Wrote {} bytes of {} to {}",
        image.bytes.len(),
        image.content_type(),
        out.display()
    );
    Ok(())
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Error status policy: {}", config.error_status_policy);

    let mut app_state = AppState::new(config.clone())?;

    // Initialize metrics
    match metrics::install_prometheus() {
        Ok(handle) => {
            metrics::init_metrics();
            app_state = app_state.with_prometheus(handle);
        }
        Err(e) => warn!("Prometheus recorder unavailable, /metrics disabled: {}", e),
    }

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
