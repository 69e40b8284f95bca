//! GPIO output pins driving the motor controller.
//!
//! The rover's H-bridge is wired to four BCM pins. [`SysfsGpio`] drives them
//! through the kernel's `/sys/class/gpio` interface; [`DryRunGpio`] only logs
//! and lets the server run on a machine without the hardware.

use std::{
    fs, io,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use thiserror::Error;

/// Default sysfs GPIO root.
pub const SYSFS_ROOT: &str = "/sys/class/gpio";

/// Attempts at writing `direction` on a freshly exported pin.
///
/// The kernel creates `gpioN/` on export, but udev fixes its permissions a
/// moment later; until then the write fails with `EACCES` or `ENOENT`.
pub const DIRECTION_ATTEMPTS: u32 = 10;

/// Pause between `direction` attempts.
pub const DIRECTION_RETRY_DELAY: Duration = Duration::from_millis(20);

/// Errors raised by a GPIO backend.
#[derive(Debug, Error)]
pub enum GpioError {
    /// Writing one of the pin's control files failed.
    #[error("pin {pin}: cannot write {file}: {source}")]
    Io {
        /// BCM pin number.
        pin: u8,
        /// Control file name (`export`, `direction`, `value`).
        file: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Digital output pins.
pub trait Gpio: Send + 'static {
    /// Prepare `pin` as an output.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot claim the pin.
    fn setup(&mut self, pin: u8) -> Result<(), GpioError>;

    /// Drive `pin` high or low.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot set the level.
    fn write(&mut self, pin: u8, high: bool) -> Result<(), GpioError>;
}

impl<G: Gpio + ?Sized> Gpio for Box<G> {
    fn setup(&mut self, pin: u8) -> Result<(), GpioError> {
        (**self).setup(pin)
    }

    fn write(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        (**self).write(pin, high)
    }
}

/// Kernel sysfs GPIO interface.
///
/// Exports each pin on first use, sets it to output, then writes `0`/`1` to
/// its `value` file.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl SysfsGpio {
    /// Use the sysfs tree rooted at `root` (normally [`SYSFS_ROOT`]).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The sysfs root in use.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pin_dir(&self, pin: u8) -> PathBuf {
        self.root.join(format!("gpio{pin}"))
    }
}

fn write_control(path: &Path, contents: &str, pin: u8, file: &'static str) -> Result<(), GpioError> {
    fs::write(path, contents).map_err(|source| GpioError::Io { pin, file, source })
}

impl Gpio for SysfsGpio {
    fn setup(&mut self, pin: u8) -> Result<(), GpioError> {
        let dir = self.pin_dir(pin);
        let direction = dir.join("direction");
        if dir.exists() {
            return write_control(&direction, "out", pin, "direction");
        }

        write_control(&self.root.join("export"), &pin.to_string(), pin, "export")?;
        let mut attempt = 1;
        loop {
            match write_control(&direction, "out", pin, "direction") {
                Err(GpioError::Io { source, .. })
                    if attempt < DIRECTION_ATTEMPTS
                        && matches!(source.kind(), io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound) =>
                {
                    tracing::debug!(pin, attempt, error = %source, "pin not ready after export, retrying");
                    attempt += 1;
                    thread::sleep(DIRECTION_RETRY_DELAY);
                },
                result => return result,
            }
        }
    }

    fn write(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        let level = if high { "1" } else { "0" };
        write_control(&self.pin_dir(pin).join("value"), level, pin, "value")
    }
}

/// Backend that logs pin changes instead of touching hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunGpio;

impl Gpio for DryRunGpio {
    fn setup(&mut self, pin: u8) -> Result<(), GpioError> {
        tracing::debug!(pin, "dry-run setup");
        Ok(())
    }

    fn write(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        tracing::info!(pin, high, "dry-run write");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn setup_skips_export_for_exported_pin() {
        let root = tempfile::tempdir().unwrap();
        let mut gpio = SysfsGpio::new(root.path());
        fs::create_dir(root.path().join("gpio17")).unwrap();

        gpio.setup(17).unwrap();

        assert!(!root.path().join("export").exists());
        assert_eq!(read(&root.path().join("gpio17/direction")), "out");
    }

    #[test]
    fn setup_writes_export_when_pin_absent() {
        let root = tempfile::tempdir().unwrap();
        let mut gpio = SysfsGpio::new(root.path());

        // export succeeds but no kernel creates gpio18/, so direction fails
        let err = gpio.setup(18).unwrap_err();

        assert_eq!(read(&root.path().join("export")), "18");
        assert!(matches!(err, GpioError::Io { pin: 18, file: "direction", .. }));
    }

    #[test]
    fn direction_waits_for_exported_pin() {
        let root = tempfile::tempdir().unwrap();
        let mut gpio = SysfsGpio::new(root.path());

        // Stand in for the kernel creating gpio22/ shortly after export.
        let dir = root.path().join("gpio22");
        let kernel = thread::spawn(move || {
            thread::sleep(DIRECTION_RETRY_DELAY * 2);
            fs::create_dir(dir).unwrap();
        });
        let result = gpio.setup(22);
        kernel.join().unwrap();

        result.unwrap();
        assert_eq!(read(&root.path().join("gpio22/direction")), "out");
    }

    #[test]
    fn write_sets_value() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("gpio27")).unwrap();
        let mut gpio = SysfsGpio::new(root.path());

        gpio.write(27, true).unwrap();
        assert_eq!(read(&root.path().join("gpio27/value")), "1");

        gpio.write(27, false).unwrap();
        assert_eq!(read(&root.path().join("gpio27/value")), "0");
    }

    #[test]
    fn boxed_backend_forwards() {
        let mut gpio: Box<dyn Gpio> = Box::new(DryRunGpio);

        assert!(gpio.setup(22).is_ok());
        assert!(gpio.write(22, true).is_ok());
    }
}
