mod driver;
mod numbering;

pub use driver::{PinDriver, RppalPin, SimulatedPin};
pub use numbering::to_bcm;

use crate::config::{Backend, GpioConfig};
use crate::error::GpioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

/// Owns the LED's output pin. The pin is released on `cleanup` or drop,
/// whichever comes first.
pub struct PinController {
    pin: u8,
    driver: Box<dyn PinDriver>,
    released: bool,
}

impl PinController {
    /// Resolve the configured pin, claim it through the configured backend and
    /// force it off.
    pub fn initialize(config: &GpioConfig) -> Result<Self, GpioError> {
        let bcm = to_bcm(config.pin, config.numbering)?;
        tracing::info!(
            "Initializing GPIO pin {} ({:?} {}) with {:?} backend",
            bcm,
            config.numbering,
            config.pin,
            config.backend
        );

        let driver: Box<dyn PinDriver> = match config.backend {
            Backend::Rppal => Box::new(RppalPin::claim(bcm)?),
            Backend::Simulated => Box::new(SimulatedPin::new(bcm)),
        };

        Self::with_driver(bcm, driver)
    }

    pub fn with_driver(pin: u8, driver: Box<dyn PinDriver>) -> Result<Self, GpioError> {
        let mut controller = Self {
            pin,
            driver,
            released: false,
        };
        controller.turn_off()?;
        Ok(controller)
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn turn_on(&mut self) -> Result<bool, GpioError> {
        self.set(Level::High)
    }

    pub fn turn_off(&mut self) -> Result<bool, GpioError> {
        self.set(Level::Low)
    }

    /// Read the level back from the hardware; `true` means on.
    pub fn status(&self) -> Result<bool, GpioError> {
        let level = self.driver.read()?;
        tracing::debug!("GPIO pin {} read state: {:?}", self.pin, level);
        Ok(level.is_high())
    }

    pub fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.driver.release();
        self.released = true;
        tracing::info!("GPIO pin {} released", self.pin);
    }

    fn set(&mut self, level: Level) -> Result<bool, GpioError> {
        tracing::debug!("Setting GPIO pin {} to {:?}", self.pin, level);
        self.driver.write(level).map_err(|e| {
            tracing::error!("Failed to write GPIO pin {}: {}", self.pin, e);
            e
        })?;
        Ok(true)
    }
}

impl Drop for PinController {
    fn drop(&mut self) {
        self.cleanup();
    }
}
