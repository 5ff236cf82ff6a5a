use std::path::PathBuf;
use std::time::Duration;

/// Baud rate the controller firmware listens on.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// How long a blocking read waits before handing control back to the caller.
///
/// The listener uses these wake-ups to observe its stop signal.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Where and how to open the serial link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub path: PathBuf,
    /// Line speed in baud.
    pub baud_rate: u32,
    /// Read timeout applied to the port.
    pub read_timeout: Duration,
}

impl LinkConfig {
    /// Configuration for `path` with the default baud rate and timeout.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the read timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_controller_defaults() {
        let cfg = LinkConfig::new("/dev/ttyACM0");
        assert_eq!(cfg.path, PathBuf::from("/dev/ttyACM0"));
        assert_eq!(cfg.baud_rate, 9600);
        assert_eq!(cfg.read_timeout, DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn builders_override_fields() {
        let cfg = LinkConfig::new("COM3")
            .with_baud_rate(115_200)
            .with_read_timeout(Duration::from_millis(5));
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.read_timeout, Duration::from_millis(5));
    }
}
