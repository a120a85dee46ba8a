#![deny(unsafe_code)]
#![deny(warnings)]

//! SoftDevice-backed [`BlePeripheral`]
//!
//! The SoftDevice runs its own async tasks: advertising, the connection
//! and the GATT server event loop. They reach the cooperative dispatch
//! loop in two directions:
//!
//! - stack to service: connection, disconnection and Current Time writes
//!   are queued on [`EVENTS`] and drained by `poll_event`
//! - service to stack: advertising start and stop requests go through a
//!   `Signal` watched by [`run`]; characteristic writes go straight to the
//!   SoftDevice attribute table
//!
//! Restarting advertising after a disconnect is the service's decision.
//! [`run`] never re-advertises on its own.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use cts_core::codec::uuid;
use cts_core::AdvertisingConfig;
use defmt::{debug, error, info, warn, Format};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use hal_abstractions::{BlePeripheral, LinkEvent, PeerAddress, WritePayload, MAX_WRITE_LEN};
use nrf_softdevice::ble::gatt_server::{self, SetValueError};
use nrf_softdevice::ble::{peripheral, Connection};
use nrf_softdevice::raw::{ble_gap_conn_params_t, BLE_GAP_ADV_FLAGS_LE_ONLY_GENERAL_DISC_MODE};
use nrf_softdevice::Softdevice;

use crate::gatt::{CurrentTimeServiceEvent, Server, ServerEvent};

/// Pending notifications, enough for a connect plus a burst of writes
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// Stack-to-service notifications
pub static EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, EVENT_QUEUE_DEPTH> = Channel::new();

/// Latest advertising request: `true` to (re)start, `false` to stop
static ADVERTISE: Signal<CriticalSectionRawMutex, bool> = Signal::new();
static ADVERTISING_REQUESTED: AtomicBool = AtomicBool::new(false);
static ADVERTISING_FAILED: AtomicBool = AtomicBool::new(false);

/// Central subscribed to Current Time notifications
static NOTIFY_ENABLED: AtomicBool = AtomicBool::new(false);

/// Live connection, if any
static CONNECTION: Mutex<CriticalSectionRawMutex, RefCell<Option<Connection>>> =
    Mutex::new(RefCell::new(None));

/// Errors surfaced to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum BleError {
    /// No characteristic with this UUID in the GATT table
    UnknownCharacteristic(u16),
    /// Value does not fit the characteristic
    InvalidLength { uuid: u16, len: usize },
    /// The SoftDevice refused the new value
    SetValue(SetValueError),
    /// Advertising requested while a central is connected
    Connected,
}

impl From<SetValueError> for BleError {
    fn from(e: SetValueError) -> Self {
        BleError::SetValue(e)
    }
}

/// Returns `true` once after the advertising task gave up
pub fn take_advertising_failure() -> bool {
    ADVERTISING_FAILED.swap(false, Ordering::Relaxed)
}

pub struct SoftdevicePeripheral {
    server: &'static Server,
}

impl SoftdevicePeripheral {
    pub fn new(server: &'static Server) -> Self {
        Self { server }
    }

    fn notify_current_time(&self, value: &heapless::Vec<u8, 16>) {
        if !NOTIFY_ENABLED.load(Ordering::Relaxed) {
            return;
        }
        let conn = CONNECTION.lock(|c| c.borrow().clone());
        if let Some(conn) = conn {
            if let Err(e) = self.server.cts.current_time_notify(&conn, value) {
                debug!("Current Time notify failed: {:?}", e);
            }
        }
    }
}

impl BlePeripheral for SoftdevicePeripheral {
    type Error = BleError;

    fn poll_event(&mut self) -> Option<LinkEvent> {
        EVENTS.try_receive().ok()
    }

    fn write_characteristic(&mut self, uuid: u16, value: &[u8]) -> Result<(), BleError> {
        let invalid = BleError::InvalidLength {
            uuid,
            len: value.len(),
        };
        match uuid {
            uuid::CURRENT_TIME => {
                let value = heapless::Vec::<u8, 16>::from_slice(value).map_err(|_| invalid)?;
                self.server.cts.current_time_set(&value)?;
                self.notify_current_time(&value);
            }
            uuid::LOCAL_TIME_INFO => {
                let value: [u8; 2] = value.try_into().map_err(|_| invalid)?;
                self.server.cts.local_time_info_set(&value)?;
            }
            uuid::REFERENCE_TIME_INFO => {
                let value: [u8; 4] = value.try_into().map_err(|_| invalid)?;
                self.server.cts.reference_time_info_set(&value)?;
            }
            other => return Err(BleError::UnknownCharacteristic(other)),
        }
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), BleError> {
        ADVERTISING_REQUESTED.store(false, Ordering::Relaxed);
        ADVERTISE.signal(false);
        Ok(())
    }

    fn start_advertising(&mut self) -> Result<(), BleError> {
        if CONNECTION.lock(|c| c.borrow().is_some()) {
            return Err(BleError::Connected);
        }
        ADVERTISING_FAILED.store(false, Ordering::Relaxed);
        ADVERTISING_REQUESTED.store(true, Ordering::Relaxed);
        ADVERTISE.signal(true);
        Ok(())
    }
}

/// Flags, the Current Time Service UUID and the complete local name
fn advertising_data(name: &str) -> heapless::Vec<u8, 31> {
    let [svc_lo, svc_hi] = uuid::CURRENT_TIME_SERVICE.to_le_bytes();
    let mut data = heapless::Vec::new();
    let _ = data.extend_from_slice(&[
        0x02, 0x01, BLE_GAP_ADV_FLAGS_LE_ONLY_GENERAL_DISC_MODE as u8,
        0x03, 0x03, svc_lo, svc_hi, // Complete list of 16-bit Service UUIDs
    ]);
    // 24 bytes remain, more than any device name holds
    let _ = data.extend_from_slice(&[1 + name.len() as u8, 0x09]);
    let _ = data.extend_from_slice(name.as_bytes());
    data
}

/// Advertise on request, then serve one connection at a time
pub async fn run(
    sd: &'static Softdevice,
    server: &'static Server,
    adv: AdvertisingConfig,
    device_name: &'static str,
) -> ! {
    let adv_data = advertising_data(device_name);

    loop {
        if !ADVERTISING_REQUESTED.load(Ordering::Relaxed) {
            ADVERTISE.wait().await;
            continue;
        }

        let config = peripheral::Config {
            interval: adv.interval,
            ..Default::default()
        };
        let advertisement = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &adv_data,
            scan_data: &[],
        };

        // A new request cancels the running advertisement; the loop then
        // re-reads ADVERTISING_REQUESTED to decide between stop and restart
        let conn = match select(
            peripheral::advertise_connectable(sd, advertisement, &config),
            ADVERTISE.wait(),
        )
        .await
        {
            Either::First(Ok(conn)) => conn,
            Either::First(Err(e)) => {
                error!("Advertising failed: {:?}", e);
                ADVERTISING_REQUESTED.store(false, Ordering::Relaxed);
                ADVERTISING_FAILED.store(true, Ordering::Relaxed);
                continue;
            }
            Either::Second(_) => continue,
        };

        // The SoftDevice stops advertising when a central connects
        ADVERTISING_REQUESTED.store(false, Ordering::Relaxed);

        let peer = PeerAddress::new(conn.peer_address().bytes());
        info!("Central connected: {}", peer);

        let params = ble_gap_conn_params_t {
            min_conn_interval: adv.conn_interval_min,
            max_conn_interval: adv.conn_interval_max,
            slave_latency: adv.slave_latency,
            conn_sup_timeout: adv.supervision_timeout,
        };
        if let Err(e) = conn.set_conn_params(params) {
            warn!("set_conn_params error: {:?}", e);
        }

        CONNECTION.lock(|c| *c.borrow_mut() = Some(conn.clone()));
        EVENTS.send(LinkEvent::Connected(peer)).await;

        // Returns when the central disconnects
        let reason = gatt_server::run(&conn, server, |e| match e {
            ServerEvent::Cts(CurrentTimeServiceEvent::CurrentTimeWrite(value)) => {
                let mut payload = WritePayload::new();
                let len = value.len().min(MAX_WRITE_LEN);
                let _ = payload.extend_from_slice(&value[..len]);
                let event = LinkEvent::Written {
                    uuid: uuid::CURRENT_TIME,
                    payload,
                };
                if EVENTS.try_send(event).is_err() {
                    warn!("Link event queue full, Current Time write dropped");
                }
            }
            ServerEvent::Cts(CurrentTimeServiceEvent::CurrentTimeCccdWrite { notifications }) => {
                debug!("Current Time notifications: {}", notifications);
                NOTIFY_ENABLED.store(notifications, Ordering::Relaxed);
            }
        })
        .await;
        info!("Central disconnected: {:?}", reason);

        CONNECTION.lock(|c| *c.borrow_mut() = None);
        NOTIFY_ENABLED.store(false, Ordering::Relaxed);
        EVENTS.send(LinkEvent::Disconnected(peer)).await;
    }
}

