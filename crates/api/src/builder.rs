//! Builder-related types.

use crate::*;
use std::sync::Arc;

/// The general peerset builder.
/// This contains both configuration and factory instances,
/// allowing construction of runtime module instances.
#[derive(Debug)]
pub struct Builder {
    /// The module configuration to be used when building modules.
    /// This can be loaded from disk or modified before freezing the builder.
    pub config: config::Config,

    /// The [peer_registry::PeerRegistryFactory] to be used for creating
    /// [peer_registry::PeerRegistry] instances.
    pub peer_registry: DynPeerRegistryFactory,

    /// The [task_queue::TaskQueueFactory] to be used for creating
    /// [task_queue::TaskQueue] instances.
    pub task_queue: DynTaskQueueFactory,
}

impl Builder {
    /// Construct a default config given the configured module factories.
    /// Note, this should be called before freezing the Builder instance
    /// in an Arc<>.
    pub fn set_default_config(&mut self) -> PsResult<()> {
        let Self {
            config,
            peer_registry,
            task_queue,
        } = self;

        peer_registry.default_config(config)?;
        task_queue.default_config(config)?;

        Ok(())
    }

    /// Validate the config against the configured module factories.
    pub fn validate_config(&self) -> PsResult<()> {
        let Self {
            config,
            peer_registry,
            task_queue,
        } = self;

        peer_registry.validate_config(config)?;
        task_queue.validate_config(config)?;

        Ok(())
    }

    /// Freeze the builder so module factories can construct instances
    /// from it.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}
