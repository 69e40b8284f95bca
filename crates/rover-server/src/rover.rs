//! Rover actuation.
//!
//! The arbiter dispatches motions into a [`RoverHandle`]; a single
//! [`Actuator`] task drains them one at a time, raising the motion's pins for
//! its duration and lowering them again. Two motions therefore never drive
//! the pins at once, even when the holder sends faster than the rover moves.
//!
//! ```text
//! Arbiter ──dispatch──► RoverHandle ──bounded queue──► Actuator ──► Gpio
//! ```
//!
//! When the queue is full the new motion is dropped with a warning rather
//! than piling up behind the one in progress.

use std::{future::Future, time::Duration};

use rover_core::Environment;
use rover_proto::Motion;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::gpio::{Gpio, GpioError};

/// Left track forward (BCM).
pub const LEFT_FORWARD: u8 = 17;
/// Left track backward (BCM).
pub const LEFT_BACK: u8 = 18;
/// Right track forward (BCM).
pub const RIGHT_FORWARD: u8 = 27;
/// Right track backward (BCM).
pub const RIGHT_BACK: u8 = 22;

/// Every motor pin, in setup order.
pub const MOTOR_PINS: [u8; 4] = [LEFT_FORWARD, LEFT_BACK, RIGHT_FORWARD, RIGHT_BACK];

/// Pins raised for `motion`.
///
/// Turns spin in place: one track forward, the other backward.
pub const fn pins_for(motion: Motion) -> [u8; 2] {
    match motion {
        Motion::Forward => [LEFT_FORWARD, RIGHT_FORWARD],
        Motion::Back => [LEFT_BACK, RIGHT_BACK],
        Motion::Left => [LEFT_BACK, RIGHT_FORWARD],
        Motion::Right => [LEFT_FORWARD, RIGHT_BACK],
    }
}

/// Actuation timing and queueing.
#[derive(Debug, Clone)]
pub struct ActuationConfig {
    /// How long a `left`/`right` keeps the pins high.
    pub turn: Duration,
    /// How long a `forward`/`back` keeps the pins high.
    pub drive: Duration,
    /// Motions that may wait behind the one in progress.
    pub queue_depth: usize,
}

impl Default for ActuationConfig {
    fn default() -> Self {
        Self { turn: Duration::from_millis(200), drive: Duration::from_millis(1000), queue_depth: 1 }
    }
}

impl ActuationConfig {
    /// How long `motion` keeps its pins high.
    pub fn duration(&self, motion: Motion) -> Duration {
        if motion.is_turn() { self.turn } else { self.drive }
    }
}

/// Why a motion was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActuationError {
    /// The queue is full.
    #[error("rover busy, dropped {motion}")]
    Busy {
        /// The dropped motion.
        motion: Motion,
    },
    /// The actuator task has stopped.
    #[error("rover offline, dropped {motion}")]
    Offline {
        /// The dropped motion.
        motion: Motion,
    },
}

/// The resource the arbiter owns: a sender into the actuation queue.
#[derive(Debug, Clone)]
pub struct RoverHandle {
    tx: mpsc::Sender<Motion>,
}

impl RoverHandle {
    /// Queue `motion` without waiting.
    ///
    /// # Errors
    ///
    /// [`ActuationError::Busy`] if the queue is full, [`ActuationError::Offline`]
    /// if the actuator has stopped.
    pub fn submit(&self, motion: Motion) -> Result<(), ActuationError> {
        self.tx.try_send(motion).map_err(|err| match err {
            TrySendError::Full(motion) => ActuationError::Busy { motion },
            TrySendError::Closed(motion) => ActuationError::Offline { motion },
        })
    }
}

/// Dispatcher handed to the arbiter.
pub type Drive = fn(&mut RoverHandle, Motion);

/// Queue `motion` on the rover, logging if it had to be dropped.
pub fn drive(rover: &mut RoverHandle, motion: Motion) {
    match rover.submit(motion) {
        Ok(()) => tracing::debug!(%motion, "motion queued"),
        Err(err) => tracing::warn!(error = %err, "motion not queued"),
    }
}

/// Task executing queued motions against the pins.
pub struct Actuator<E, G> {
    env: E,
    gpio: G,
    config: ActuationConfig,
    rx: mpsc::Receiver<Motion>,
}

impl<E: Environment, G: Gpio> Actuator<E, G> {
    /// Create the actuator and the handle feeding it.
    pub fn new(env: E, gpio: G, config: ActuationConfig) -> (RoverHandle, Self) {
        let (tx, rx) = mpsc::channel(config.queue_depth.max(1));
        (RoverHandle { tx }, Self { env, gpio, config, rx })
    }

    /// Claim every motor pin and drive it low.
    ///
    /// Every pin is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn setup(&mut self) -> Result<(), GpioError> {
        let mut first = None;
        for pin in MOTOR_PINS {
            let result = self.gpio.setup(pin).and_then(|()| self.gpio.write(pin, false));
            if let Err(err) = result {
                tracing::error!(error = %err, "pin setup failed");
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Execute motions until every [`RoverHandle`] is dropped, then leave the
    /// pins low.
    pub async fn run(self) -> G {
        self.run_until(std::future::pending()).await
    }

    /// Like [`Actuator::run`], but also stops once `shutdown` resolves.
    ///
    /// Shutdown is only observed between motions: a motion in progress
    /// always lowers its pins before the task returns.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> G {
        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            let motion = tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::debug!(pending = self.rx.len(), "actuator shutting down");
                    break;
                },
                motion = self.rx.recv() => motion,
            };
            let Some(motion) = motion else {
                tracing::debug!("actuation queue closed");
                break;
            };
            self.execute(motion).await;
        }
        self.gpio
    }

    async fn execute(&mut self, motion: Motion) {
        let pins = pins_for(motion);
        let duration = self.config.duration(motion);
        tracing::info!(%motion, ?duration, "actuating");

        let started = self.env.now();
        self.set(pins, true);
        self.env.sleep(duration).await;
        self.set(pins, false);
        tracing::trace!(%motion, elapsed = ?(self.env.now() - started), "actuation done");
    }

    fn set(&mut self, pins: [u8; 2], high: bool) {
        for pin in pins {
            if let Err(err) = self.gpio.write(pin, high) {
                tracing::error!(error = %err, "pin write failed");
            }
        }
    }
}
