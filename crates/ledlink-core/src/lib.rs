//! # ledlink-core
//!
//! Core ledlink data model and state store.
//!
//! This crate provides:
//! - The channel model (three switchable outputs, ids 1..=3)
//! - The in-memory device state store
//! - The mapping from channels to physical output pins
//! - Device configuration with compiled-in defaults
//!
//! This crate is intentionally runtime-agnostic and contains no async code,
//! making it usable on both Linux (tokio) and ESP32 (esp-idf) targets.

pub mod config;
pub mod gpio;
pub mod model;
pub mod store;

pub use config::{AccessPointConfig, ConfigError, DeviceConfig, PinMap};
pub use gpio::{apply_levels, select_outputs, OutputReport, OutputSink, PinUnavailable};
pub use model::{Channel, Snapshot};
pub use store::{ChannelStore, MemoryStore, StoreError};
