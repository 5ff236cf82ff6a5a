use std::sync::Arc;

use cuelights_frame::{Limits, StatusRegistry};

use crate::error::{EngineError, Result};

/// Channels on the stock controller.
pub const DEFAULT_NUM_CHANNELS: usize = 6;

/// Controls engine sizing and the status set.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of physical channels, `1..=10`.
    pub num_channels: usize,
    /// Statuses understood by the controller.
    pub registry: Arc<StatusRegistry>,
}

impl EngineConfig {
    /// Wire limits implied by this configuration.
    pub fn limits(&self) -> Result<Limits> {
        Limits::for_registry(self.num_channels, &self.registry)
            .map_err(|err| EngineError::Config(err.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_channels: DEFAULT_NUM_CHANNELS,
            registry: Arc::new(StatusRegistry::default()),
        }
    }
}
