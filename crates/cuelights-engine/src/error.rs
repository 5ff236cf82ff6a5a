/// Errors that can occur in engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Link-level error (opening or cloning the device).
    #[error("link error: {0}")]
    Link(#[from] cuelights_link::LinkError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] cuelights_frame::FrameError),

    /// Invalid engine configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Channel index outside the configured range.
    #[error("channel {channel} out of range (0..{max})")]
    ChannelOutOfRange { channel: u8, max: u8 },

    /// Status code outside the registry.
    #[error("status {status} out of range (0..{max})")]
    StatusOutOfRange { status: u8, max: u8 },

    /// The link failed after it was opened.
    #[error("link lost: {0}")]
    LinkLost(String),

    /// `start()` was called without a bound consumer.
    #[error("no consumer bound")]
    NoConsumer,

    /// `start()` was called twice.
    #[error("engine already started")]
    AlreadyStarted,

    /// A background thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
