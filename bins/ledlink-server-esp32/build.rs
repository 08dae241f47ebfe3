//! Build script for the ledlink ESP32 firmware.
//!
//! Exports the ESP-IDF environment the esp-idf-svc crate needs to find the
//! IDF toolchain.

fn main() {
    embuild::espidf::sysenv::output();
}
