//! Serial link abstraction for the cue light controller.
//!
//! Provides the byte-stream duplex connection to the controller device:
//! - [`LinkConfig`] names the device path, baud rate and read timeout
//! - [`SerialLink`] is an open connection that implements `Read + Write`
//!
//! This is the lowest layer of cuelights. Framing and the listener/writer
//! split are built on top of the [`SerialLink`] type provided here.

pub mod config;
pub mod error;
pub mod serial;

pub use config::{LinkConfig, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
pub use error::{LinkError, Result};
pub use serial::{available_ports, PortInfo, SerialLink};
