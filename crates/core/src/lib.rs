#![deny(missing_docs)]
//! Peerset acquisition engine for content-addressed ledger data.
//!
//! The [acquire::Acquire] engine fetches a single content-addressed
//! object (a ledger header, a transaction-set) from a dynamic set of
//! remote peers, retrying and escalating effort over time until the
//! owner observes completion or the policy gives up.

use peerset_api::{builder::Builder, config::Config};

/// Construct a production-ready default builder.
///
/// - `peer_registry` - The default peer registry is
///   [factories::MemPeerRegistryFactory].
/// - `task_queue` - The default task queue is
///   [factories::TokioTaskQueueFactory].
pub fn default_builder() -> Builder {
    Builder {
        config: Config::default(),
        peer_registry: factories::MemPeerRegistryFactory::create(),
        task_queue: factories::TokioTaskQueueFactory::create(),
    }
}

pub mod acquire;
pub mod factories;
