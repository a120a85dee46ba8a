//! Keep a Current Time Service watch in sync with this host
//!
//! Two loops share one adapter. The scan loop makes sure a watch is
//! selected, asking on stdin when the remembered one is out of range,
//! and syncs a newly picked watch straight away. The sync loop writes the
//! host time to the remembered watch every `sync_interval` seconds.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use cts_sync::central::Central;
use cts_sync::config::DEFAULT_CONFIG_PATH;
use cts_sync::discovery::{find_by_address, menu, parse_selection};
use cts_sync::{KnownDevice, SyncConfig, SyncError};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "cts-sync")]
#[command(about = "Keep a Current Time Service watch in sync with this host")]
struct Args {
    /// JSON config file, created with defaults if missing
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Select a watch if needed, sync it once and exit
    #[arg(long)]
    once: bool,
}

struct Shared {
    central: Central,
    config: Mutex<SyncConfig>,
    config_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = SyncConfig::load_or_create(&args.config)?;
    let shared = Arc::new(Shared {
        central: Central::new().await?,
        config: Mutex::new(config),
        config_path: args.config,
    });

    if args.once {
        if let Some(device) = select_device(&shared).await? {
            shared.central.calibrate(&device).await?;
        }
        return Ok(());
    }

    tokio::join!(scan_loop(shared.clone()), sync_loop(shared.clone()));
    Ok(())
}

/// Remembered watch if it is in range, otherwise the user's pick
///
/// Returns `None` when nothing was chosen. A new pick is saved to the
/// config file.
async fn select_device(shared: &Shared) -> Result<Option<KnownDevice>, SyncError> {
    let found = shared.central.scan().await?;
    let remembered = shared.config.lock().await.last_device.clone();

    if let Some(last) = remembered {
        if let Some(device) = find_by_address(&found, &last.address) {
            info!("Remembered watch {} is in range", device.address);
            return Ok(Some(last));
        }
        warn!("Remembered watch {} not found", last.address);
    }

    if found.is_empty() {
        warn!("No devices found");
        return Ok(None);
    }

    let Some(index) = prompt(&found).await? else {
        warn!("No valid selection");
        return Ok(None);
    };
    let device = found[index].clone();

    let mut config = shared.config.lock().await;
    config.last_device = Some(device.clone());
    config.save(&shared.config_path)?;
    info!("Selected {} ({})", device.name, device.address);
    Ok(Some(device))
}

async fn prompt(found: &[KnownDevice]) -> Result<Option<usize>, SyncError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(menu(found).as_bytes()).await?;
    stdout.write_all(b"Select a device: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(parse_selection(&line, found.len()))
}

async fn scan_loop(shared: Arc<Shared>) {
    loop {
        let before = shared.config.lock().await.last_device.clone();
        match select_device(&shared).await {
            Ok(Some(device)) if before.as_ref() != Some(&device) => {
                if let Err(e) = shared.central.calibrate(&device).await {
                    error!("Sync with new watch failed: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => error!("Scan failed: {}", e),
        }
        let period = shared.config.lock().await.scan_period();
        sleep(period).await;
    }
}

async fn sync_loop(shared: Arc<Shared>) {
    loop {
        let target = shared.config.lock().await.last_device.clone();
        match target {
            Some(device) => match shared.central.calibrate(&device).await {
                Ok(drift) => info!("Synced {}, drift was {} s", device.address, drift),
                Err(e) => error!("Sync with {} failed: {}", device.address, e),
            },
            None => info!("No watch selected yet"),
        }
        let period = shared.config.lock().await.sync_period();
        sleep(period).await;
    }
}
