//! Device configuration.
//!
//! All values are compiled in; there is no configuration file and nothing is
//! persisted. The defaults reproduce the stock firmware:
//! - Access point `ESP32-Access-Point` / `12345678` on `192.168.1.1/24`
//! - HTTP on port 80, socket endpoint at `/ws`
//! - Channels 1, 2, 3 on GPIO 2, 4, 16
//!
//! Both the Linux and the ESP32 binaries validate the configuration once at
//! startup.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use thiserror::Error;

use crate::model::Channel;

/// Longest SSID accepted by the WiFi driver.
pub const MAX_SSID_LEN: usize = 32;

/// WPA2 passphrase bounds.
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 64;

/// Errors found while validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("SSID cannot be empty")]
    EmptySsid,

    #[error("SSID too long: {0} bytes (max {max})", max = MAX_SSID_LEN)]
    SsidTooLong(usize),

    #[error("Passphrase must be empty or {min}..={max} bytes, got {0}", min = MIN_PASSWORD_LEN, max = MAX_PASSWORD_LEN)]
    InvalidPassword(usize),

    #[error("Pin {pin} is bound to both {first} and {second}")]
    DuplicatePin { pin: u8, first: Channel, second: Channel },

    #[error("Invalid socket path: {0:?}")]
    InvalidSocketPath(String),

    #[error("Client queue holds {0} frames, a snapshot needs {min}", min = Channel::COUNT)]
    ClientQueueTooShort(usize),

    #[error("Control loop interval must be at least 1 ms")]
    ZeroLoopInterval,
}

/// Access point settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPointConfig {
    /// Advertised network name.
    pub ssid: String,

    /// WPA2 passphrase; empty for an open network.
    pub password: String,

    /// Address the device assigns itself.
    pub address: Ipv4Addr,

    pub gateway: Ipv4Addr,

    pub netmask: Ipv4Addr,
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        Self {
            ssid: "ESP32-Access-Point".to_string(),
            password: "12345678".to_string(),
            address: Ipv4Addr::new(192, 168, 1, 1),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
        }
    }
}

impl AccessPointConfig {
    /// Whether the access point runs without a passphrase.
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }

    /// Netmask as a prefix length (`255.255.255.0` -> 24).
    pub fn prefix_len(&self) -> u8 {
        u32::from(self.netmask).count_ones() as u8
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::EmptySsid);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong(self.ssid.len()));
        }
        let len = self.password.len();
        if !self.is_open() && !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
            return Err(ConfigError::InvalidPassword(len));
        }
        Ok(())
    }
}

/// Physical pin bound to each channel. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMap {
    pins: [u8; Channel::COUNT],
}

impl Default for PinMap {
    fn default() -> Self {
        Self { pins: [2, 4, 16] }
    }
}

impl PinMap {
    /// Bind channels 1, 2, 3 to the given pins.
    pub fn new(pins: [u8; Channel::COUNT]) -> Self {
        Self { pins }
    }

    pub fn pin(&self, channel: Channel) -> u8 {
        self.pins[channel.index()]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (i, first) in Channel::ALL.iter().enumerate() {
            for second in &Channel::ALL[i + 1..] {
                if self.pin(*first) == self.pin(*second) {
                    return Err(ConfigError::DuplicatePin {
                        pin: self.pin(*first),
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Complete device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    pub access_point: AccessPointConfig,

    pub pins: PinMap,

    /// HTTP server port (page and socket endpoint share it).
    pub http_port: u16,

    /// Path of the socket endpoint.
    pub ws_path: String,

    /// Outbound messages buffered per client before sends are skipped.
    /// Must hold at least one full snapshot.
    pub client_queue: usize,

    /// Period of the control loop (reaping sweep + output writes).
    pub loop_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            access_point: AccessPointConfig::default(),
            pins: PinMap::default(),
            http_port: 80,
            ws_path: "/ws".to_string(),
            client_queue: 32,
            loop_interval_ms: 10,
        }
    }
}

impl DeviceConfig {
    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.access_point.validate()?;
        self.pins.validate()?;

        if !self.ws_path.starts_with('/') || self.ws_path == "/" {
            return Err(ConfigError::InvalidSocketPath(self.ws_path.clone()));
        }
        if self.client_queue < Channel::COUNT {
            return Err(ConfigError::ClientQueueTooShort(self.client_queue));
        }
        if self.loop_interval_ms == 0 {
            return Err(ConfigError::ZeroLoopInterval);
        }
        Ok(())
    }
}
