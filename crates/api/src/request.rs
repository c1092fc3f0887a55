//! The outbound acquisition request message.

use crate::*;

/// A request for a content-addressed object, sent to one or more peers
/// believed to hold it.
///
/// There is exactly one logical request message type per acquisition
/// kind. Wire encoding and connection-level I/O belong to the
/// [crate::PeerConnection] implementation, not to this crate.
#[derive(
    Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRequest {
    /// The content identifier being acquired.
    pub target: ObjectId,

    /// A hint to the remote peer for how often this request will be
    /// re-issued, in milliseconds.
    pub interval_hint_ms: u32,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_serde() {
        let req = ObjectRequest {
            target: bytes::Bytes::from_static(b"test-hash-1").into(),
            interval_hint_ms: 250,
        };
        let enc = serde_json::to_string(&req).unwrap();
        assert_eq!(
            "{\"target\":\"dGVzdC1oYXNoLTE\",\"intervalHintMs\":250}",
            enc,
        );
        let dec: ObjectRequest = serde_json::from_str(&enc).unwrap();
        assert_eq!(req, dec);
    }
}
