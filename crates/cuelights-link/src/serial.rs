use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};

/// An open serial connection to the controller. Implements `Read + Write`.
///
/// A link is usually split with [`SerialLink::try_clone`] so that one handle
/// can be read by the listener while the other is written under a lock.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    path: PathBuf,
}

impl SerialLink {
    /// Open the device described by `config` (blocking).
    pub fn open(config: &LinkConfig) -> Result<Self> {
        let name = config.path.to_string_lossy();
        let port = serialport::new(name.as_ref(), config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| LinkError::Open {
                path: config.path.clone(),
                source,
            })?;

        info!(path = ?config.path, baud = config.baud_rate, "opened serial link");

        Ok(Self {
            port,
            path: config.path.clone(),
        })
    }

    /// Create a second handle onto the same port.
    pub fn try_clone(&self) -> Result<Self> {
        let port = self.port.try_clone().map_err(LinkError::Clone)?;
        debug!(path = ?self.path, "cloned serial link handle");
        Ok(Self {
            port,
            path: self.path.clone(),
        })
    }

    /// The device path this link was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("path", &self.path)
            .finish()
    }
}

/// A serial port visible on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: &'static str,
    pub product: Option<String>,
}

/// Enumerate serial ports, for picking the controller's device path.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(LinkError::Enumerate)?;
    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, product) = match port.port_type {
                SerialPortType::UsbPort(usb) => ("usb", usb.product),
                SerialPortType::PciPort => ("pci", None),
                SerialPortType::BluetoothPort => ("bluetooth", None),
                SerialPortType::Unknown => ("unknown", None),
            };
            PortInfo {
                name: port.port_name,
                kind,
                product,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_reports_path() {
        let cfg = LinkConfig::new("/dev/cuelights-does-not-exist");
        let err = SerialLink::open(&cfg).unwrap_err();
        match &err {
            LinkError::Open { path, .. } => {
                assert_eq!(path, Path::new("/dev/cuelights-does-not-exist"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("cuelights-does-not-exist"));
    }
}
