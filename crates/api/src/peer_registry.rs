//! Peer-registry related types.
//!
//! Peer discovery and peer-list maintenance live outside this crate.
//! The registry is only the lookup surface the acquisition engine uses
//! to turn a short peer identifier into a live connection handle.

use crate::*;
#[cfg(any(test, feature = "mockall"))]
use mockall::automock;
use std::sync::Arc;

/// A live connection handle to a remote peer.
///
/// Sending is fail-fast: implementations must enqueue the message or
/// return an error, never await a peer acknowledgment.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait PeerConnection: 'static + Send + Sync + std::fmt::Debug {
    /// Queue an object request on this connection.
    fn send_request(&self, request: ObjectRequest) -> PsResult<()>;
}

/// Trait-object [PeerConnection].
pub type DynPeerConnection = Arc<dyn PeerConnection>;

/// Represents the ability to look up live peer connections by id.
///
/// Registration and removal are driven by the connection layer as peers
/// come and go. [PeerRegistry::resolve] returning `None` for a peer that
/// was reachable a moment ago is expected behavior, not an error.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait PeerRegistry: 'static + Send + Sync + std::fmt::Debug {
    /// Register a connection handle for a peer.
    fn register(&self, peer: PeerId, connection: DynPeerConnection);

    /// Remove a peer's connection handle. Safe if absent.
    fn unregister(&self, peer: &PeerId);

    /// Look up the live connection for a peer, if still connected.
    fn resolve(&self, peer: &PeerId) -> Option<DynPeerConnection>;
}

/// Trait-object [PeerRegistry].
pub type DynPeerRegistry = Arc<dyn PeerRegistry>;

/// A factory for constructing [PeerRegistry] instances.
pub trait PeerRegistryFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut config::Config) -> PsResult<()>;

    /// Validate configuration.
    fn validate_config(&self, config: &config::Config) -> PsResult<()>;

    /// Construct a peer registry instance.
    fn create(
        &self,
        builder: Arc<builder::Builder>,
    ) -> BoxFut<'static, PsResult<DynPeerRegistry>>;
}

/// Trait-object [PeerRegistryFactory].
pub type DynPeerRegistryFactory = Arc<dyn PeerRegistryFactory>;
