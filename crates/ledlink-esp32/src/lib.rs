//! ESP32-specific components for ledlink.
//!
//! This crate provides the platform shell around the shared controller:
//! - Access point bring-up with a fixed address
//! - HTTP page and socket handlers on `EspHttpServer`
//! - `PinDriver` outputs for the three channels
//!
//! # Architecture
//!
//! Everything stateful lives in `ledlink_server::Controller`, which is the same
//! type the Linux build uses. This crate only translates esp-idf callbacks into
//! `SocketEvent`s and exposes the pins as an `OutputSink`.
//!
//! # Example
//!
//! ```ignore
//! use ledlink_esp32::{gpio::EspPins, http::start_http_server, wifi::start_access_point};
//!
//! let _wifi = start_access_point(peripherals.modem, sysloop, nvs, &config.access_point)?;
//! let _server = start_http_server(controller.clone(), &config)?;
//! loop {
//!     controller.tick(&mut pins);
//!     FreeRtos::delay_ms(10);
//! }
//! ```

pub mod gpio;
pub mod http;
pub mod wifi;
