//! Random id helpers.

use peerset_api::{id::Id, ObjectId, PeerId};
use rand::Rng;

/// Generate a random 32 byte [Id].
pub fn random_id() -> Id {
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    Id(bytes::Bytes::from(bytes.to_vec()))
}

/// Generate a random [ObjectId].
pub fn random_object_id() -> ObjectId {
    ObjectId(random_id())
}

/// Generate a random [PeerId].
pub fn random_peer_id() -> PeerId {
    PeerId(random_id())
}

/// Generate a list of random [PeerId]s.
pub fn create_peer_id_list(num_peers: u16) -> Vec<PeerId> {
    (0..num_peers).map(|_| random_peer_id()).collect()
}
