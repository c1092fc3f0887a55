//! A production-ready memory-based peer registry.

use peerset_api::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A production-ready memory-based peer registry factory.
///
/// This stores live connection handles in an in-memory hash map by
/// [PeerId]. The connection layer registers handles as peers connect
/// and unregisters them on disconnect; acquisition engines only resolve.
#[derive(Debug)]
pub struct MemPeerRegistryFactory {}

impl MemPeerRegistryFactory {
    /// Construct a new MemPeerRegistryFactory.
    pub fn create() -> DynPeerRegistryFactory {
        let out: DynPeerRegistryFactory = Arc::new(Self {});
        out
    }
}

impl PeerRegistryFactory for MemPeerRegistryFactory {
    fn default_config(&self, _config: &mut config::Config) -> PsResult<()> {
        Ok(())
    }

    fn validate_config(&self, _config: &config::Config) -> PsResult<()> {
        Ok(())
    }

    fn create(
        &self,
        _builder: Arc<builder::Builder>,
    ) -> BoxFut<'static, PsResult<DynPeerRegistry>> {
        Box::pin(async move {
            let out: DynPeerRegistry = Arc::new(MemPeerRegistry::default());
            Ok(out)
        })
    }
}

#[derive(Default)]
struct MemPeerRegistry(Mutex<HashMap<PeerId, DynPeerConnection>>);

impl std::fmt::Debug for MemPeerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemPeerRegistry").finish()
    }
}

impl PeerRegistry for MemPeerRegistry {
    fn register(&self, peer: PeerId, connection: DynPeerConnection) {
        // a reconnecting peer replaces its stale handle
        self.0.lock().unwrap().insert(peer, connection);
    }

    fn unregister(&self, peer: &PeerId) {
        self.0.lock().unwrap().remove(peer);
    }

    fn resolve(&self, peer: &PeerId) -> Option<DynPeerConnection> {
        self.0.lock().unwrap().get(peer).cloned()
    }
}
