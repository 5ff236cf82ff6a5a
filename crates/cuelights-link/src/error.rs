use std::path::PathBuf;

/// Errors that can occur in serial link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The device could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: serialport::Error,
    },

    /// The open port could not be duplicated into a second handle.
    #[error("failed to clone link handle: {0}")]
    Clone(serialport::Error),

    /// Serial ports could not be enumerated.
    #[error("failed to list serial ports: {0}")]
    Enumerate(serialport::Error),
}

impl LinkError {
    /// The OS error kind behind this failure, when serialport reports one.
    ///
    /// Opening a tty without access to its group yields `PermissionDenied`;
    /// a missing device yields `NotFound`.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        let source = match self {
            LinkError::Open { source, .. } => source,
            LinkError::Clone(source) | LinkError::Enumerate(source) => source,
        };
        match source.kind() {
            serialport::ErrorKind::Io(kind) => Some(kind),
            serialport::ErrorKind::NoDevice => Some(std::io::ErrorKind::NotFound),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::*;

    fn open_error(kind: serialport::ErrorKind) -> LinkError {
        LinkError::Open {
            path: PathBuf::from("/dev/ttyACM0"),
            source: serialport::Error::new(kind, "open failed"),
        }
    }

    #[test]
    fn io_kind_reads_through_serialport_error() {
        assert_eq!(
            open_error(serialport::ErrorKind::Io(ErrorKind::PermissionDenied)).io_kind(),
            Some(ErrorKind::PermissionDenied)
        );
        assert_eq!(
            open_error(serialport::ErrorKind::NoDevice).io_kind(),
            Some(ErrorKind::NotFound)
        );
        assert_eq!(
            open_error(serialport::ErrorKind::InvalidInput).io_kind(),
            None
        );
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
