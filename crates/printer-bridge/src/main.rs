use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infrastructure::BridgeConfig;
use printer_bridge::cli::Args;
use printer_bridge::{bootstrap, commands};

async fn run() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,printer_bridge=debug,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Loading configuration from {}...", args.config_dir);
    let mut config = BridgeConfig::load(&args.config_dir)?;
    if let Some(address) = args.address.clone() {
        config.printer.default_address = Some(address);
    }

    let running = bootstrap::start(&config, args.dry_run).await;
    let gateway = running.gateway.clone();

    // Errors are held until the actor has shut down
    let outcome = commands::execute(args.command, &gateway, &config).await;

    if let Some(probe) = &running.probe {
        let wire: Vec<String> = probe.wire().iter().map(|b| format!("{:02X}", b)).collect();
        info!(bytes = %wire.join(" "), "🧪 Dry run output");
    }

    // Link is closed before the actor exits
    gateway.shutdown();
    if let Err(e) = running.handle.await {
        warn!(error = %e, "Printer actor ended abnormally");
    }

    outcome
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
