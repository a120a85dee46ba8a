//! GATT table for the Current Time Service (0x1805)

/// Current Time Service with its three characteristics
#[nrf_softdevice::gatt_service(uuid = "1805")]
pub struct CurrentTimeService {
    /// Exact Time 256 plus adjust reason, 10 bytes
    #[characteristic(uuid = "2a2b", read, write, notify)]
    pub current_time: heapless::Vec<u8, 16>,
    /// Time zone and DST offset
    #[characteristic(uuid = "2a0f", read)]
    pub local_time_info: [u8; 2],
    /// Time source, accuracy, days and hours since update
    #[characteristic(uuid = "2a14", read)]
    pub reference_time_info: [u8; 4],
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub cts: CurrentTimeService,
}
