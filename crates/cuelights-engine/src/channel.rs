//! Last-known state of each channel.
//!
//! A [`ChannelBoard`] belongs to the consumer side. It changes only through
//! [`ChannelBoard::apply`], called from the single dispatch point, so the
//! listener thread never touches channel state directly.

use std::sync::Arc;

use cuelights_frame::{Status, StatusRegistry, StatusUpdate};

/// One physical cue light channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    index: u8,
    status: Status,
}

impl Channel {
    /// A channel in the registry's reset status.
    pub fn new(index: u8, registry: &StatusRegistry) -> Self {
        Self {
            index,
            status: registry.first().clone(),
        }
    }

    /// Zero-based index used on the wire.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// One-based number shown to operators.
    pub fn number(&self) -> u8 {
        self.index + 1
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

/// All configured channels, indexable by wire index.
#[derive(Debug, Clone)]
pub struct ChannelBoard {
    channels: Vec<Channel>,
    registry: Arc<StatusRegistry>,
}

impl ChannelBoard {
    pub fn new(num_channels: usize, registry: Arc<StatusRegistry>) -> Self {
        let channels = (0..num_channels)
            .map(|index| Channel::new(index as u8, &registry))
            .collect();
        Self { channels, registry }
    }

    /// Record a delivered status report.
    ///
    /// Returns the updated channel, or `None` if either value is unknown.
    pub fn apply(&mut self, update: StatusUpdate) -> Option<&Channel> {
        let status = self.registry.get(update.status)?.clone();
        let channel = self.channels.get_mut(usize::from(update.channel))?;
        channel.set_status(status);
        Some(channel)
    }

    pub fn get(&self, index: u8) -> Option<&Channel> {
        self.channels.get(usize::from(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }
}
