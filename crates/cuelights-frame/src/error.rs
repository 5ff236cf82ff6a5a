/// Errors that can occur while reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link reached end-of-stream.
    #[error("link closed")]
    ConnectionClosed,

    /// The link did not accept or deliver bytes within its timeout.
    #[error("link timed out")]
    TimedOut,

    /// The status registry is unusable.
    #[error("invalid status registry: {0}")]
    InvalidRegistry(String),
}

impl FrameError {
    /// True for the errors that mean the link itself is gone.
    pub fn is_link_lost(&self) -> bool {
        matches!(self, FrameError::Io(_) | FrameError::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
