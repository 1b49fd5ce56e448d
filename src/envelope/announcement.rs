//! Cluster-membership announcement (§3), published periodically by each
//! proxy on `<connection>.announce.*`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub event_name: String,
    pub node: String,
    pub application: String,
}

impl Announcement {
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}
