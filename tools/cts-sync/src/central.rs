//! BlueZ central: scan, connect, write the time, read it back

use std::time::Duration;

use bluer::gatt::remote::Characteristic;
use bluer::{Adapter, AdapterEvent, Address, Device, Session, Uuid};
use chrono::Local;
use cts_core::codec::uuid;
use futures::{pin_mut, StreamExt};
use log::{debug, info, warn};
use tokio::time::sleep;

use crate::config::KnownDevice;
use crate::error::SyncError;
use crate::host_time;

/// How long one scan listens for advertisements
pub const SCAN_WINDOW: Duration = Duration::from_secs(10);

/// Pause between the write and the read-back
const READBACK_DELAY: Duration = Duration::from_secs(1);

/// Seconds to wait for GATT service resolution
const RESOLVE_ATTEMPTS: u32 = 30;

pub struct Central {
    _session: Session,
    adapter: Adapter,
}

impl Central {
    /// Open the default adapter and power it on
    pub async fn new() -> Result<Self, SyncError> {
        let session = Session::new().await?;
        let adapter = session.default_adapter().await?;
        adapter.set_powered(true).await?;
        debug!("Using adapter {}", adapter.name());
        Ok(Self {
            _session: session,
            adapter,
        })
    }

    /// Devices heard during one [`SCAN_WINDOW`]
    pub async fn scan(&self) -> Result<Vec<KnownDevice>, SyncError> {
        info!("Scanning for {} s", SCAN_WINDOW.as_secs());
        let events = self.adapter.discover_devices().await?;
        pin_mut!(events);
        let window = sleep(SCAN_WINDOW);
        pin_mut!(window);

        let mut found: Vec<KnownDevice> = Vec::new();
        loop {
            tokio::select! {
                _ = &mut window => break,
                event = events.next() => match event {
                    Some(AdapterEvent::DeviceAdded(addr)) => {
                        let address = addr.to_string();
                        if found.iter().any(|d| d.address == address) {
                            continue;
                        }
                        let name = match self.adapter.device(addr) {
                            Ok(device) => device.name().await.ok().flatten().unwrap_or_default(),
                            Err(_) => String::new(),
                        };
                        debug!("Found {} ({})", name, address);
                        found.push(KnownDevice { name, address });
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }
        info!("Scan found {} devices", found.len());
        Ok(found)
    }

    /// Write the host time to `target`, read it back and return the drift
    /// in seconds. The connection is dropped afterwards either way.
    pub async fn calibrate(&self, target: &KnownDevice) -> Result<i64, SyncError> {
        let address: Address = target
            .address
            .parse()
            .map_err(|_| SyncError::InvalidAddress(target.address.clone()))?;
        let device = self.adapter.device(address)?;

        info!("Connecting to {} ({})", target.name, target.address);
        if !device.is_connected().await? {
            device.connect().await?;
        }

        let result = write_and_verify(&device).await;
        if let Err(e) = device.disconnect().await {
            warn!("Disconnect from {} failed: {}", target.address, e);
        }
        result
    }
}

async fn write_and_verify(device: &Device) -> Result<i64, SyncError> {
    let characteristic = current_time_characteristic(device).await?;

    let payload = host_time::current_time_payload(&Local::now().naive_local())?;
    debug!("Writing Current Time {:02X?}", payload);
    characteristic.write(&payload).await?;

    sleep(READBACK_DELAY).await;
    let record = characteristic.read().await?;
    let drift = host_time::drift_seconds(&record, &Local::now().naive_local())?;
    info!("Watch reads {}, drift {} s", host_time::from_record(&record)?, drift);
    Ok(drift)
}

async fn current_time_characteristic(device: &Device) -> Result<Characteristic, SyncError> {
    let mut attempts = 0;
    while !device.is_services_resolved().await? {
        attempts += 1;
        if attempts >= RESOLVE_ATTEMPTS {
            warn!("GATT services still unresolved, searching anyway");
            break;
        }
        sleep(Duration::from_secs(1)).await;
    }

    let wanted = Uuid::from_bytes(uuid::to_uuid128(uuid::CURRENT_TIME));
    for service in device.services().await? {
        for characteristic in service.characteristics().await? {
            if characteristic.uuid().await? == wanted {
                return Ok(characteristic);
            }
        }
    }
    Err(SyncError::CharacteristicNotFound)
}
