//! Haptic output devices.
//!
//! An [`Actuator`] takes one intensity byte per command. The session owns its
//! actuator outright and drives the full `open` / `set_intensity` / `close`
//! lifecycle; implementations never share a handle.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{Error, Result};

pub trait Actuator {
    /// Acquires the device.
    fn open(&mut self) -> Result<()>;

    /// Commands a new intensity, waiting at most `timeout`.
    fn set_intensity(&mut self, value: u8, timeout: Duration) -> Result<()>;

    /// Releases the device.
    fn close(&mut self) -> Result<()>;

    fn name(&self) -> String;
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn set_intensity(&mut self, value: u8, timeout: Duration) -> Result<()> {
        (**self).set_intensity(value, timeout)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> String {
        (**self).name()
    }
}

/// Writes each intensity as a single byte to a character device.
pub struct DeviceFileActuator {
    path: PathBuf,
    file: Option<File>,
}

impl DeviceFileActuator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    fn device_error(&self, source: std::io::Error) -> Error {
        Error::Device {
            path: self.path.clone(),
            source,
        }
    }
}

impl Actuator for DeviceFileActuator {
    fn open(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| self.device_error(e))?;
        self.file = Some(file);
        Ok(())
    }

    fn set_intensity(&mut self, value: u8, timeout: Duration) -> Result<()> {
        let result = match self.file.as_mut() {
            Some(file) => file.write_all(&[value]).and_then(|()| file.flush()),
            None => return Err(Error::DeviceClosed),
        };
        trace!("wrote speed {} to {:?} (timeout {:?})", value, self.path, timeout);
        result.map_err(|e| self.device_error(e))
    }

    fn close(&mut self) -> Result<()> {
        drop(self.file.take());
        Ok(())
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Logs intensities instead of driving hardware.
#[derive(Default)]
pub struct LogActuator {
    open: bool,
    last: Option<u8>,
}

impl LogActuator {
    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

impl Actuator for LogActuator {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn set_intensity(&mut self, value: u8, _timeout: Duration) -> Result<()> {
        if !self.open {
            return Err(Error::DeviceClosed);
        }
        debug!("speed -> {}", value);
        self.last = Some(value);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn name(&self) -> String {
        "dry run".to_string()
    }
}

/// Stand-in when no device is configured; never opens.
pub struct NoActuator;

impl Actuator for NoActuator {
    fn open(&mut self) -> Result<()> {
        Err(Error::DeviceClosed)
    }

    fn set_intensity(&mut self, _value: u8, _timeout: Duration) -> Result<()> {
        Err(Error::DeviceClosed)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> String {
        "none".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_file_receives_one_byte_per_command() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut actuator = DeviceFileActuator::new(file.path());

        actuator.open().unwrap();
        actuator.set_intensity(245, Duration::from_millis(10)).unwrap();
        actuator.set_intensity(0, Duration::from_millis(10)).unwrap();
        actuator.close().unwrap();

        assert_eq!(std::fs::read(file.path()).unwrap(), vec![245, 0]);
    }

    #[test]
    fn missing_device_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut actuator = DeviceFileActuator::new(dir.path().join("nope").join("dev"));
        assert!(matches!(actuator.open(), Err(Error::Device { .. })));
    }

    #[test]
    fn writes_before_open_are_rejected() {
        let mut actuator = DeviceFileActuator::new("/unused");
        assert!(matches!(
            actuator.set_intensity(1, Duration::ZERO),
            Err(Error::DeviceClosed)
        ));
        assert!(actuator.close().is_ok());
    }

    #[test]
    fn log_actuator_remembers_last_value() {
        let mut actuator = LogActuator::default();
        assert!(actuator.set_intensity(5, Duration::ZERO).is_err());
        actuator.open().unwrap();
        actuator.set_intensity(5, Duration::ZERO).unwrap();
        assert_eq!(actuator.last(), Some(5));
    }

    #[test]
    fn no_actuator_never_opens() {
        assert!(NoActuator.open().is_err());
    }
}
