//! Status registry and frame codec for the cue light serial protocol.
//!
//! Every message on the wire starts with a `^` marker:
//! - `^` + channel digit + status digit sets or reports a channel's status
//! - `^E` + text + `\n` carries an error notification
//!
//! Inbound bytes are decoded by a resynchronizing state machine, so a
//! corrupted byte costs at most one frame and never wedges the link.

pub mod codec;
pub mod error;
pub mod reader;
pub mod status;
pub mod writer;

pub use codec::{
    encode_command, encode_error, Decoded, Decoder, DecoderState, Limits, Rejection,
    StatusUpdate, ESCAPE_MARKER, FRAME_SIZE, MAX_DEVICE_ERROR_LEN, START_MARKER, TERMINATOR,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use status::{Status, StatusRegistry, MAX_WIRE_VALUES};
pub use writer::FrameWriter;
