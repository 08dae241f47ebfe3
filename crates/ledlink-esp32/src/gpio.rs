//! Channel outputs on ESP32 GPIO.

use esp_idf_svc::hal::gpio::{AnyOutputPin, Level, Output, PinDriver};
use esp_idf_svc::sys::{EspError, ESP_ERR_INVALID_ARG};

use ledlink_core::{select_outputs, Channel, OutputSink, PinMap};

type OutputDriver = PinDriver<'static, AnyOutputPin, Output>;

/// One output driver per channel, keyed by GPIO number.
pub struct EspPins {
    drivers: Vec<(u8, OutputDriver)>,
}

impl EspPins {
    /// Claim the pins bound by `map` from the board's `available` outputs and
    /// drive them low.
    pub fn from_map(map: &PinMap, available: Vec<(u8, AnyOutputPin)>) -> anyhow::Result<Self> {
        let mut drivers = Vec::with_capacity(Channel::COUNT);
        for (pin, output) in select_outputs(map, available)? {
            let mut driver = PinDriver::output(output)?;
            driver.set_low()?;
            drivers.push((pin, driver));
        }
        Ok(Self { drivers })
    }
}

impl OutputSink for EspPins {
    type Error = EspError;

    fn set_level(&mut self, _channel: Channel, pin: u8, level: bool) -> Result<(), Self::Error> {
        match self.drivers.iter_mut().find(|(bound, _)| *bound == pin) {
            Some((_, driver)) => driver.set_level(Level::from(level)),
            None => Err(EspError::from_infallible::<ESP_ERR_INVALID_ARG>()),
        }
    }
}
