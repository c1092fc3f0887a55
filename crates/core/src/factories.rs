//! Factories for generating instances of peerset modules.

pub mod mem_peer_registry;
pub use mem_peer_registry::MemPeerRegistryFactory;

pub mod tokio_task_queue;
pub use tokio_task_queue::TokioTaskQueueFactory;
