//! # Thermal Bridge
//!
//! Interactive command listener for a Boson thermal sensor.
//!
//! Reads line commands from stdin, maps them onto the typed camera API,
//! and prints the results. One listener drives one sensor address; the
//! half-duplex command pipeline is serialized by construction.

use std::path::Path;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use thermal_bridge::camera::ThermalCamera;
use thermal_bridge::config::Config;
use thermal_bridge::fslp::protocol::{FfcMode, Palette, PART_NUMBER_LEN};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

const HELP: &str = "\
Commands:
  f                 trigger shutter (flat-field correction)
  sn                read serial number
  pn                read part number
  w | b             set palette: white hot / black hot
  fa | fm           set FFC mode: auto / manual
  mode              read FFC mode
  c                 read palette
  geti <body>       read integer register (hex command body)
  gets <body> [len] read string register
  seti <body> <val> write integer register (hex value)
  help              show this help";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Thermal Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)?,
        None => Config::default(),
    };

    let mut camera = ThermalCamera::open(&config)?;
    info!("sensor bus ready at address 0x{:02X}", config.bus.address);

    println!("{}", HELP);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        let input = line.trim();
                        if !input.is_empty() {
                            handle_command(&mut camera, input).await;
                        }
                    }
                    None => {
                        info!("stdin closed, shutting down");
                        break;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    Ok(())
}

/// Map one input line onto a camera operation and print the outcome
async fn handle_command(
    camera: &mut ThermalCamera<thermal_bridge::bus::channel::SerialChannel>,
    input: &str,
) {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let verb = tokens[0].to_ascii_lowercase();

    let outcome = match (verb.as_str(), &tokens[1..]) {
        ("f", []) => camera.trigger_shutter().await.map(|_| "Shutter triggered".to_string()),
        ("sn", []) => camera
            .get_serial_number()
            .await
            .map(|sn| format!("Serial number: {}", sn)),
        ("pn", []) => camera
            .get_part_number()
            .await
            .map(|pn| format!("Part number: {}", pn)),
        ("w", []) => camera
            .set_palette(Palette::WhiteHot)
            .await
            .map(|_| "Palette set to white hot".to_string()),
        ("b", []) => camera
            .set_palette(Palette::BlackHot)
            .await
            .map(|_| "Palette set to black hot".to_string()),
        ("fa", []) => camera
            .set_ffc_mode(FfcMode::Auto)
            .await
            .map(|_| "FFC mode set to auto".to_string()),
        ("fm", []) => camera
            .set_ffc_mode(FfcMode::Manual)
            .await
            .map(|_| "FFC mode set to manual".to_string()),
        ("mode", []) => camera.get_ffc_mode().await.map(|mode| match mode {
            Some(mode) => format!("FFC mode: {}", mode),
            None => "FFC mode: unrecognized".to_string(),
        }),
        ("c", []) => camera.get_palette().await.map(|palette| match palette {
            Some(palette) => format!("Color mode: {}", palette),
            None => "Color mode: unrecognized".to_string(),
        }),
        ("geti", [body]) => camera
            .get_register_int(body)
            .await
            .map(|v| format!("{} (0x{:08X})", v, v)),
        ("gets", [body]) => camera.get_register_string(body, PART_NUMBER_LEN).await,
        ("gets", [body, len]) => match len.parse::<usize>() {
            Ok(len) => camera.get_register_string(body, len).await,
            Err(_) => {
                println!("Invalid length: {}", len);
                return;
            }
        },
        ("seti", [body, value]) => match parse_hex_u32(value) {
            Some(value) => camera
                .set_register_int(body, value)
                .await
                .map(|_| format!("Wrote 0x{:08X}", value)),
            None => {
                println!("Invalid value: {}", value);
                return;
            }
        },
        ("help", []) | ("?", []) => {
            println!("{}", HELP);
            return;
        }
        _ => {
            println!("Unsupported input: {}", input);
            return;
        }
    };

    match outcome {
        Ok(message) => println!("{}", message),
        Err(e) => warn!("command failed: {}", e),
    }
}

/// Parse a hexadecimal value with an optional `0x` prefix
fn parse_hex_u32(s: &str) -> Option<u32> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u32::from_str_radix(digits, 16).ok()
}
