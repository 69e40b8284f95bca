//! Rover control server.
//!
//! This crate provides the production server implementation using:
//! - axum for HTTP and WebSocket transport
//! - Tokio for async runtime
//! - sysfs GPIO for the motor pins
//!
//! ## Architecture
//!
//! ```text
//! rover-server
//!   ├─ SystemEnv          (production Environment impl)
//!   ├─ transport          (axum router, one task per socket)
//!   ├─ ServerDriver       (Sans-IO orchestrator)
//!   │    ├─ Arbiter       (who may drive)
//!   │    └─ ConnectionTable (participant -> outbox)
//!   └─ Actuator           (serialized pin timing)
//!        └─ Gpio          (sysfs or dry run)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assets;
mod connections;
mod driver;
mod error;
pub mod gpio;
pub mod rover;
mod system_env;
mod transport;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

pub use assets::Assets;
pub use connections::{ConnectionTable, Outbox, ParticipantId};
pub use driver::{ID_DRAWS, RoverArbiter, ServerDriver, ServerEvent};
pub use error::ServerError;
pub use gpio::{DryRunGpio, Gpio, GpioError, SysfsGpio};
pub use rover::{ActuationConfig, ActuationError, Actuator, RoverHandle};
pub use system_env::SystemEnv;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
pub use transport::{AppState, SharedDriver, router};

/// Where motor commands go.
#[derive(Debug, Clone)]
pub enum GpioBackend {
    /// Kernel sysfs interface rooted at the given path.
    Sysfs(PathBuf),
    /// Log pin changes only.
    DryRun,
}

impl Default for GpioBackend {
    fn default() -> Self {
        Self::Sysfs(PathBuf::from(gpio::SYSFS_ROOT))
    }
}

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// Directory holding the client files
    pub static_dir: Option<PathBuf>,
    /// Pin backend
    pub gpio: GpioBackend,
    /// Actuation timing and queueing
    pub actuation: ActuationConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            static_dir: None,
            gpio: GpioBackend::default(),
            actuation: ActuationConfig::default(),
        }
    }
}

/// Production rover server.
///
/// Wraps `ServerDriver` with the axum transport and a running actuator.
pub struct Server {
    listener: TcpListener,
    state: AppState,
    actuator: JoinHandle<Box<dyn Gpio>>,
    stop_actuator: oneshot::Sender<()>,
}

impl Server {
    /// Claim the motor pins, start the actuator and bind the listener.
    ///
    /// Pins that cannot be claimed are logged; the server still starts.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The actuation queue depth is zero
    /// - Binding to the address fails
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        if config.actuation.queue_depth == 0 {
            return Err(ServerError::Config("queue depth must be at least 1".to_string()));
        }
        let env = SystemEnv::new();

        let gpio: Box<dyn Gpio> = match config.gpio {
            GpioBackend::Sysfs(root) => Box::new(SysfsGpio::new(root)),
            GpioBackend::DryRun => Box::new(DryRunGpio),
        };
        let (rover, mut actuator) = Actuator::new(env.clone(), gpio, config.actuation);
        if let Err(err) = actuator.setup() {
            tracing::error!(error = %err, "GPIO setup failed, motions may not move the rover");
        }

        let listener = TcpListener::bind(&config.bind_address).await?;
        let (stop_actuator, stop) = oneshot::channel();
        let actuator = tokio::spawn(actuator.run_until(async move {
            // A dropped sender stops the actuator too.
            let _ = stop.await;
        }));

        let state = AppState {
            driver: Arc::new(tokio::sync::Mutex::new(ServerDriver::new(env, rover))),
            assets: Arc::new(Assets::new(config.static_dir)),
        };

        Ok(Self { listener, state, actuator, stop_actuator })
    }

    /// Serve HTTP and WebSocket connections.
    ///
    /// This method runs until the listener fails. The actuator then finishes
    /// the motion in progress, so no motor pin is left high.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self { listener, state, actuator, stop_actuator } = self;
        tracing::info!("Server starting on {}", listener.local_addr()?);

        let result = axum::serve(listener, router(state)).await;
        let _ = stop_actuator.send(());
        match actuator.await {
            Ok(_gpio) => tracing::info!("actuator stopped"),
            Err(err) => tracing::error!(error = %err, "actuator task failed"),
        }
        result.map_err(ServerError::from)
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// The shared driver, for inspection.
    pub fn driver(&self) -> SharedDriver {
        Arc::clone(&self.state.driver)
    }
}
