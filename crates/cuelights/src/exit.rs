use std::fmt;
use std::io;

use cuelights_engine::EngineError;
use cuelights_frame::FrameError;
use cuelights_link::LinkError;

pub const SUCCESS: i32 = 0;
pub const LINK_ERROR: i32 = 3;
pub const LINK_LOST: i32 = 4;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => LINK_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    let code = match err.io_kind() {
        Some(io::ErrorKind::PermissionDenied) => PERMISSION_DENIED,
        Some(io::ErrorKind::TimedOut) => TIMEOUT,
        _ => LINK_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(LINK_LOST, format!("{context}: {err}")),
        FrameError::TimedOut => CliError::new(TIMEOUT, format!("{context}: {err}")),
        FrameError::InvalidRegistry(_) => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn engine_error(context: &str, err: EngineError) -> CliError {
    match err {
        EngineError::Link(err) => link_error(context, err),
        EngineError::Frame(err) => frame_error(context, err),
        EngineError::Config(_)
        | EngineError::ChannelOutOfRange { .. }
        | EngineError::StatusOutOfRange { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        EngineError::LinkLost(_) => CliError::new(LINK_LOST, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
