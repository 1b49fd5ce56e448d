//! Entity data shapes carried inside response/event envelopes (§3).
//!
//! None of these commit to validating their contents — they are thin,
//! forward-compatible mirrors of what the proxy side sends; unknown fields
//! are ignored on decode (`serde`'s default behaviour for structs without
//! `deny_unknown_fields`).

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn nanos_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let nanos = u64::deserialize(deserializer)?;
    Ok(Duration::from_nanos(nanos))
}

fn nanos_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let nanos = Option::<u64>::deserialize(deserializer)?;
    Ok(nanos.map(Duration::from_nanos))
}

fn serialize_nanos<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_nanos() as u64)
}

fn serialize_nanos_opt<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match duration {
        Some(d) => serializer.serialize_some(&(d.as_nanos() as u64)),
        None => serializer.serialize_none(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialplanInfo {
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub exten: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub app_data: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub caller: CallerInfo,
    #[serde(default)]
    pub connected: CallerInfo,
    #[serde(default)]
    pub account_code: String,
    #[serde(default)]
    pub dialplan: DialplanInfo,
    #[serde(default)]
    pub creation_time: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub channel_vars: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeData {
    pub id: String,
    #[serde(default)]
    pub technology: String,
    #[serde(default)]
    pub bridge_type: String,
    #[serde(default)]
    pub bridge_class: String,
    #[serde(default)]
    pub channel_ids: Vec<String>,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub video_mode: String,
    #[serde(default)]
    pub video_source_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackData {
    pub id: String,
    #[serde(default)]
    pub media_uri: String,
    #[serde(default)]
    pub target_uri: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveRecordingData {
    pub name: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub target_uri: String,
    #[serde(default)]
    pub cause: String,
    #[serde(
        default,
        deserialize_with = "nanos_duration",
        serialize_with = "serialize_nanos"
    )]
    pub duration: Duration,
    #[serde(
        default,
        deserialize_with = "nanos_duration_opt",
        serialize_with = "serialize_nanos_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub silence_duration: Option<Duration>,
    #[serde(
        default,
        deserialize_with = "nanos_duration_opt",
        serialize_with = "serialize_nanos_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub talking_duration: Option<Duration>,
}

impl Default for LiveRecordingData {
    fn default() -> Self {
        LiveRecordingData {
            name: String::new(),
            format: String::new(),
            state: String::new(),
            target_uri: String::new(),
            cause: String::new(),
            duration: Duration::ZERO,
            silence_duration: None,
            talking_duration: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecordingData {
    pub name: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub file: String,
}

/// Build/system/config/status blocks the proxy does not commit to a stable
/// schema for; decoded as open JSON objects rather than fixed structs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AsteriskInfo {
    #[serde(default)]
    pub build: serde_json::Value,
    #[serde(default)]
    pub system: serde_json::Value,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub status: serde_json::Value,
}

/// The nullable entity union carried in a [`super::response::ResponseEnvelope`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback: Option<PlaybackData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_recording: Option<LiveRecordingData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_recording: Option<StoredRecordingData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asterisk: Option<AsteriskInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
}
