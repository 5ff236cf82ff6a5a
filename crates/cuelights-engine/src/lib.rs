//! Channel status protocol engine for cue light controllers.
//!
//! This is the "just works" layer. Open the device, bind one consumer, and
//! the engine keeps channel status reports flowing in while operator
//! commands flow out:
//! - a listener thread owns the read side and decodes frames
//! - a single dispatch thread delivers [`LinkEvent`]s in arrival order
//! - all writes go through one locked [`LinkWriter`]

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod listener;
pub mod writer;

pub use channel::{Channel, ChannelBoard};
pub use config::{EngineConfig, DEFAULT_NUM_CHANNELS};
pub use engine::CueEngine;
pub use error::{EngineError, Result};
pub use event::LinkEvent;
pub use listener::{LinkListener, ListenerExit};
pub use writer::LinkWriter;
