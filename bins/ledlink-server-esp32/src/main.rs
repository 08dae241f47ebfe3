//! ledlink firmware for ESP32.
//!
//! This binary requires the ESP32 Rust toolchain.
//! It will not compile with the standard Rust toolchain.
//!
//! Boot order: logger, output pins (all low), access point, HTTP server. Then
//! the control loop runs forever: reaping sweep and pin writes on every
//! iteration. Network callbacks reach the same controller from the httpd task.

use std::sync::Arc;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyOutputPin, OutputPin, Pins};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info};

use ledlink_core::DeviceConfig;
use ledlink_esp32::gpio::EspPins;
use ledlink_esp32::http::{start_http_server, EspController};
use ledlink_esp32::wifi::start_access_point;

fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();
    info!("ledlink booting");

    let config = DeviceConfig::default();
    config.validate()?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut pins = EspPins::from_map(&config.pins, output_pins(peripherals.pins))?;

    // A network failure is logged; the control loop keeps driving the pins.
    let _wifi = match start_access_point(peripherals.modem, sysloop, Some(nvs), &config.access_point)
    {
        Ok(wifi) => Some(wifi),
        Err(e) => {
            error!("Access point failed to start: {:?}", e);
            None
        }
    };

    let controller: Arc<EspController> = Arc::new(EspController::new(config.pins));

    let _server = match start_http_server(controller.clone(), &config) {
        Ok(server) => Some(server),
        Err(e) => {
            error!("HTTP server failed to start: {:?}", e);
            None
        }
    };

    info!("ledlink ready");

    let period_ms = u32::try_from(config.loop_interval_ms)
        .unwrap_or(u32::MAX)
        .max(1);
    loop {
        controller.tick(&mut pins);
        FreeRtos::delay_ms(period_ms);
    }
}

/// GPIOs usable as plain outputs, by number. Strapping and flash pins are left
/// out.
fn output_pins(pins: Pins) -> Vec<(u8, AnyOutputPin)> {
    vec![
        (2, pins.gpio2.downgrade_output()),
        (4, pins.gpio4.downgrade_output()),
        (5, pins.gpio5.downgrade_output()),
        (13, pins.gpio13.downgrade_output()),
        (14, pins.gpio14.downgrade_output()),
        (16, pins.gpio16.downgrade_output()),
        (17, pins.gpio17.downgrade_output()),
        (18, pins.gpio18.downgrade_output()),
        (19, pins.gpio19.downgrade_output()),
        (21, pins.gpio21.downgrade_output()),
        (22, pins.gpio22.downgrade_output()),
        (23, pins.gpio23.downgrade_output()),
        (25, pins.gpio25.downgrade_output()),
        (26, pins.gpio26.downgrade_output()),
        (27, pins.gpio27.downgrade_output()),
        (32, pins.gpio32.downgrade_output()),
        (33, pins.gpio33.downgrade_output()),
    ]
}
