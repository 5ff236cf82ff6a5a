//! Drive cue light controllers over a serial link.
//!
//! cuelights keeps a set of cue light channels in step with a controller
//! device: operator commands go out as three-byte frames, and the device's
//! status reports come back as typed events for a single consumer.
//!
//! # Crate Structure
//!
//! - [`link`]: Serial device access
//! - [`frame`]: Status registry and the `^`-framed wire codec
//! - [`engine`]: Listener, locked writer and consumer dispatch (behind `engine` feature)

/// Re-export link types.
pub mod link {
    pub use cuelights_link::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cuelights_frame::*;
}

/// Re-export engine types (requires `engine` feature).
#[cfg(feature = "engine")]
pub mod engine {
    pub use cuelights_engine::*;
}
