use rppal::gpio::{Gpio, OutputPin};

use super::Level;
use crate::error::GpioError;

/// A claimed output line. Implementations must make `release` idempotent and
/// fail reads/writes afterwards.
pub trait PinDriver: Send {
    fn write(&mut self, level: Level) -> Result<(), GpioError>;

    fn read(&self) -> Result<Level, GpioError>;

    fn release(&mut self);
}

/// Raspberry Pi GPIO through rppal.
pub struct RppalPin {
    bcm: u8,
    pin: Option<OutputPin>,
}

impl RppalPin {
    pub fn claim(bcm: u8) -> Result<Self, GpioError> {
        tracing::debug!("Claiming GPIO pin {} as output", bcm);
        let pin = Gpio::new()?.get(bcm)?.into_output();
        Ok(Self { bcm, pin: Some(pin) })
    }
}

impl PinDriver for RppalPin {
    fn write(&mut self, level: Level) -> Result<(), GpioError> {
        let pin = self.pin.as_mut().ok_or(GpioError::Released(self.bcm))?;
        match level {
            Level::High => pin.set_high(),
            Level::Low => pin.set_low(),
        }
        Ok(())
    }

    fn read(&self) -> Result<Level, GpioError> {
        let pin = self.pin.as_ref().ok_or(GpioError::Released(self.bcm))?;
        Ok(if pin.is_set_high() { Level::High } else { Level::Low })
    }

    fn release(&mut self) {
        // Dropping the OutputPin restores the line's previous mode.
        if self.pin.take().is_some() {
            tracing::debug!("Released GPIO pin {}", self.bcm);
        }
    }
}

/// In-memory line for hosts without GPIO hardware.
#[derive(Debug)]
pub struct SimulatedPin {
    bcm: u8,
    level: Level,
    released: bool,
}

impl SimulatedPin {
    pub fn new(bcm: u8) -> Self {
        Self {
            bcm,
            level: Level::Low,
            released: false,
        }
    }
}

impl PinDriver for SimulatedPin {
    fn write(&mut self, level: Level) -> Result<(), GpioError> {
        if self.released {
            return Err(GpioError::Released(self.bcm));
        }
        tracing::debug!("Simulated GPIO pin {} set to {:?}", self.bcm, level);
        self.level = level;
        Ok(())
    }

    fn read(&self) -> Result<Level, GpioError> {
        if self.released {
            return Err(GpioError::Released(self.bcm));
        }
        Ok(self.level)
    }

    fn release(&mut self) {
        self.released = true;
    }
}
