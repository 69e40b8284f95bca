//! Recording GPIO backend.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use rover_server::{Gpio, GpioError};

use crate::sim_env::SimEnv;

/// One pin level change, stamped with virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    /// Virtual time of the write.
    pub at: Duration,
    /// BCM pin.
    pub pin: u8,
    /// New level.
    pub high: bool,
}

/// Records every write against a [`SimEnv`] clock.
///
/// Clones share the log, so a test keeps one clone while the actuator owns
/// the other.
#[derive(Clone)]
pub struct SimGpio {
    env: SimEnv,
    log: Arc<Mutex<Vec<PinEvent>>>,
}

impl SimGpio {
    /// Record against `env`'s clock.
    pub fn new(env: SimEnv) -> Self {
        Self { env, log: Arc::default() }
    }

    /// Writes so far.
    pub fn events(&self) -> Vec<PinEvent> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Pins currently high, in ascending order.
    pub fn high_pins(&self) -> Vec<u8> {
        let mut high: Vec<u8> = Vec::new();
        for event in self.events() {
            high.retain(|pin| *pin != event.pin);
            if event.high {
                high.push(event.pin);
            }
        }
        high.sort_unstable();
        high
    }
}

impl Gpio for SimGpio {
    fn setup(&mut self, _pin: u8) -> Result<(), GpioError> {
        Ok(())
    }

    fn write(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        let at = self.env.elapsed();
        self.log.lock().unwrap_or_else(PoisonError::into_inner).push(PinEvent { at, pin, high });
        Ok(())
    }
}
