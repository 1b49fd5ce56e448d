//! Response envelope (§3, §7).

use serde::{Deserialize, Serialize};

use super::entities::EntityData;
use crate::key::Key;

pub const NOT_FOUND_TEXT: &str = "Not found";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EntityData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<Key>>,
}

impl ResponseEnvelope {
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// `true` when the remote side reported the sentinel `"Not found"` text.
    pub fn is_not_found(&self) -> bool {
        self.error == NOT_FOUND_TEXT
    }

    /// `true` when `error` carries any non-empty text.
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_sentinel_is_recognized() {
        let resp = ResponseEnvelope {
            error: "Not found".to_string(),
            ..Default::default()
        };
        assert!(resp.is_not_found());
        assert!(resp.has_error());
    }

    #[test]
    fn empty_error_is_not_an_error() {
        let resp = ResponseEnvelope::default();
        assert!(!resp.has_error());
        assert!(!resp.is_not_found());
    }
}
