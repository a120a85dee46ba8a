#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;

mod ble;
mod gatt;
mod softdevice;

// SWI3 and SWI4 are free; the SoftDevice claims SWI1, SWI2 and SWI5
#[app(device = embassy_nrf, peripherals = false, dispatchers = [SWI3_EGU3, SWI4_EGU4])]
mod app {
    use super::*;
    use cts_core::{AdvertisingConfig, CtsConfig, CtsService};
    use defmt::{error, info, warn};
    use embassy_nrf::gpio::{Level, Output, OutputDrive};
    use embassy_nrf::interrupt::Priority;
    use embassy_time::{Instant, Timer};
    use hal_abstractions::{PinIndicator, StatusIndicator};
    use nrf_softdevice::Softdevice;
    use static_cell::StaticCell;

    type Led = PinIndicator<Output<'static>>;
    type Service = CtsService<ble::SoftdevicePeripheral, Led>;

    /// 200 ms at the 64 MHz core clock
    const HALT_BLINK_CYCLES: u32 = 12_800_000;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        service: Service,
    }

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("Current Time Service watch starting...");

        // Priorities 0, 1 and 4 are reserved by the SoftDevice
        let mut config = embassy_nrf::config::Config::default();
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;
        let p = embassy_nrf::init(config);

        // nRF52840-DK LED1 (P0.13) is wired active low
        let led = Output::new(p.P0_13, Level::High, OutputDrive::Standard);
        let indicator = PinIndicator::active_low(led);

        // The SoftDevice keeps a pointer to the device name
        static CONFIG: StaticCell<CtsConfig> = StaticCell::new();
        let config: &'static CtsConfig = CONFIG.init(CtsConfig::default());
        let device_name = config.device_name.as_str();

        let sd = softdevice::enable(device_name);
        static SERVER: StaticCell<gatt::Server> = StaticCell::new();
        let server: &'static gatt::Server = match gatt::Server::new(sd) {
            Ok(server) => SERVER.init(server),
            Err(e) => {
                error!("GATT service registration failed: {:?}", e);
                halt_and_blink(indicator)
            }
        };
        let sd: &'static Softdevice = sd;
        info!("GATT server registered");

        let peripheral = ble::SoftdevicePeripheral::new(server);
        let service = CtsService::new(config.clone(), peripheral, indicator, now_ms());

        softdevice_task::spawn(sd).ok();
        ble_task::spawn(sd, server, device_name).ok();
        cts_task::spawn().ok();

        (Shared {}, Local { service })
    }

    /// Milliseconds since boot from the embassy time driver (RTC1)
    fn now_ms() -> u64 {
        Instant::now().as_millis()
    }

    /// Blink forever; the radio stack never came up
    fn halt_and_blink(mut indicator: Led) -> ! {
        loop {
            indicator.toggle();
            cortex_m::asm::delay(HALT_BLINK_CYCLES);
        }
    }

    /// SoftDevice event pump
    #[task(priority = 1)]
    async fn softdevice_task(_cx: softdevice_task::Context, sd: &'static Softdevice) -> ! {
        sd.run().await
    }

    /// Advertising, connection and GATT server events
    #[task(priority = 1)]
    async fn ble_task(
        _cx: ble_task::Context,
        sd: &'static Softdevice,
        server: &'static gatt::Server,
        device_name: &'static str,
    ) -> ! {
        ble::run(sd, server, AdvertisingConfig::default(), device_name).await
    }

    /// Cooperative dispatch: run every due service task, then sleep until
    /// the next one
    #[task(priority = 1, local = [service])]
    async fn cts_task(cx: cts_task::Context) -> ! {
        let service = cx.local.service;
        info!("Service task started");

        if let Err(e) = service.start(now_ms()) {
            warn!("Start incomplete: {}", e);
        }

        loop {
            let now = now_ms();
            service.run_once(now);

            if ble::take_advertising_failure() {
                if let Err(e) = service.restart_advertising() {
                    warn!("Advertising restart failed: {}", e);
                }
            }

            let next = service.next_due_ms().unwrap_or(now + 1);
            Timer::at(Instant::from_millis(next)).await;
        }
    }
}
