use anyhow::Result;
use application::PrinterGateway;
use infrastructure::BridgeConfig;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::cli::{Command, read_payload};

/// Run one CLI command against a started gateway.
pub async fn execute(command: Command, gateway: &PrinterGateway, config: &BridgeConfig) -> Result<()> {
    match command {
        Command::Devices => {
            let devices = gateway.list_paired_devices().await?;
            if devices.is_empty() {
                println!("No paired devices");
            }
            for device in devices {
                println!("{}\t{}", device.address, device.name);
            }
        }
        Command::Connect { address } => {
            gateway.connect(address.clone()).await?;
            println!("Connected to {}", address);
        }
        Command::Print { file, hex } => {
            let bytes = read_payload(file.as_ref(), hex.as_deref()).await?;
            let len = bytes.len();
            gateway.send_bytes(bytes).await?;
            println!("Sent {} bytes", len);
        }
        Command::Kick { pin } => {
            match pin {
                Some(pin) => {
                    let kick = pin.kick(config.printer.drawer.kick());
                    gateway.open_cash_drawer_with(kick).await?
                }
                None => gateway.open_cash_drawer().await?,
            }
            println!("Drawer opened");
        }
        Command::Status => {
            match gateway.last_known_address().await? {
                Some(address) => println!("Printer: {}", address),
                None => println!("Printer: none"),
            }
            println!("State: {}", gateway.state());
        }
        Command::Forget => {
            gateway.forget().await?;
            println!("Printer forgotten");
        }
        Command::Watch => {
            let mut status = gateway.connection_status();
            // Bring the remembered printer up; failures show in the log
            match gateway.ensure_connected().await {
                Ok(true) => {}
                Ok(false) => warn!("Printer not reachable yet"),
                Err(e) => warn!(error = %e, "Initial connection failed"),
            }
            println!("State: {}", gateway.state());

            loop {
                tokio::select! {
                    signal = tokio::signal::ctrl_c() => {
                        match signal {
                            Ok(()) => info!("🛑 Shutting down..."),
                            Err(err) => warn!(error = %err, "Unable to listen for shutdown signal"),
                        }
                        break;
                    }
                    Some(connected) = status.next() => {
                        println!("{}", if connected { "connected" } else { "disconnected" });
                    }
                }
            }
        }
    }
    Ok(())
}
