//! SoftDevice S140 bring-up
//!
//! The SoftDevice reads its configuration through raw bindgen structs, and
//! the GAP device-name permission block has no safe constructor. That
//! single `unsafe` expression lives here so every other module keeps
//! `#![deny(unsafe_code)]`.
//!
//! Resources owned by the SoftDevice once enabled: RTC0, TIMER0, SWI1,
//! SWI2, SWI5, RADIO and interrupt priorities 0, 1 and 4. RTIC
//! dispatchers and the embassy time driver are placed accordingly.

// This module cannot use #![deny(unsafe_code)]: the GAP write permission
// is only obtainable through core::mem::zeroed.
#![allow(unsafe_code)]

use defmt::info;
use nrf_softdevice::{raw, Softdevice};

/// Enable the SoftDevice for a single peripheral link
///
/// `device_name` is handed to the SoftDevice by pointer (user memory
/// location), so it must live for the rest of the program. Centrals are
/// not permitted to rename the device.
pub fn enable(device_name: &'static str) -> &'static mut Softdevice {
    let config = nrf_softdevice::Config {
        // nRF52840-DK carries a 32.768 kHz crystal
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: device_name.as_ptr() as *mut u8,
            current_len: device_name.len() as u16,
            max_len: device_name.len() as u16,
            // All-zero security mode is "no access": the name is read-only
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_USER as u8,
            ),
        }),
        ..Default::default()
    };

    info!("Enabling SoftDevice as \"{}\"", device_name);
    Softdevice::enable(&config)
}
