use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use domain::{DrawerKick, DrawerPin, PeripheralAddress};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bluetooth receipt printer and cash drawer bridge", long_about = None)]
pub struct Args {
    /// Path to config directory
    #[arg(long, default_value = "config")]
    pub config_dir: String,

    /// Override the configured default printer address
    #[arg(long)]
    pub address: Option<PeripheralAddress>,

    /// Use an in-memory transport instead of Bluetooth
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List bonded Bluetooth devices
    Devices,
    /// Connect to a printer and remember it
    Connect { address: PeripheralAddress },
    /// Send a pre-formatted ESC/POS buffer
    Print {
        /// File with raw bytes, `-` for stdin
        #[arg(conflicts_with = "hex")]
        file: Option<PathBuf>,
        /// Bytes as hex, e.g. "1B 40 0A"
        #[arg(long)]
        hex: Option<String>,
    },
    /// Open the cash drawer
    Kick {
        #[arg(long, value_enum)]
        pin: Option<PinArg>,
    },
    /// Show the remembered printer and link state
    Status,
    /// Disconnect and forget the remembered printer
    Forget,
    /// Stream connection status changes until Ctrl-C
    Watch,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinArg {
    #[value(name = "2")]
    Pin2,
    #[value(name = "5")]
    Pin5,
}

impl PinArg {
    pub fn kick(self, base: DrawerKick) -> DrawerKick {
        let pin = match self {
            Self::Pin2 => DrawerPin::Pin2,
            Self::Pin5 => DrawerPin::Pin5,
        };
        DrawerKick { pin, ..base }
    }
}

/// Parse whitespace separated hex bytes, with or without `0x` prefixes.
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in input.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let byte = u8::from_str_radix(digits, 16)
            .with_context(|| format!("Invalid hex byte: {:?}", token))?;
        bytes.push(byte);
    }
    if bytes.is_empty() {
        bail!("No bytes given");
    }
    Ok(bytes)
}

/// Payload for `print`: hex string, file, or stdin.
pub async fn read_payload(file: Option<&PathBuf>, hex: Option<&str>) -> Result<Vec<u8>> {
    if let Some(hex) = hex {
        return parse_hex(hex);
    }

    let bytes = match file {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))?,
        _ => {
            use tokio::io::AsyncReadExt;
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    if bytes.is_empty() {
        bail!("Nothing to print");
    }
    Ok(bytes)
}
