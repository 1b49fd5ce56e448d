//! Request envelope (§3, §9).
//!
//! The on-wire union is tag-plus-optional-fields; this crate mirrors the
//! wire directly with a single struct carrying every payload as an
//! `Option`, rather than introducing a Rust-side sum type that would need a
//! custom `Serialize`/`Deserialize` impl to flatten back down to the same
//! shape. §9 explicitly sanctions either choice — this is the one that
//! costs nothing extra at the serde layer.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::key::Key;

fn nanos<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_nanos() as u64)
}

fn nanos_opt<S: serde::Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&(d.as_nanos() as u64)),
        None => s.serialize_none(),
    }
}

fn from_nanos<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    Ok(Duration::from_nanos(u64::deserialize(d)?))
}

/// Direction used by `ChannelMute`/`ChannelUnmute`. Default is *inbound*
/// when unspecified (§4.H).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    In,
    Out,
    Both,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigTuple {
    pub attribute: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_silence: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beep: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminate: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DtmfOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnoopOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whisper: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalMediaOptions {
    pub channel_id: String,
    pub app: String,
    pub external_host: String,
    pub encapsulation: String,
    pub transport: String,
    pub connection_type: String,
    pub format: String,
    pub direction: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelCreateRequest {
    pub endpoint: String,
    pub app: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginateRequest {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_args: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,
    #[serde(
        default,
        serialize_with = "nanos_opt",
        deserialize_with = "deserialize_timeout_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

fn deserialize_timeout_opt<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(d)?.map(Duration::from_nanos))
}

macro_rules! payload_struct {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $(pub $field: $ty,)*
        }
    };
}

payload_struct!(AsteriskVariableSet { value: String });
payload_struct!(AsteriskConfig { tuples: Vec<ConfigTuple> });
payload_struct!(AsteriskLoggingChannel { config: String });
payload_struct!(BridgeCreate { r#type: String, name: String });
payload_struct!(BridgeAddChannel { channel: String, absorb_dtmf: bool, mute: bool, role: String });
payload_struct!(BridgeRemoveChannel { channel: String });
payload_struct!(BridgeMoh { class: String });
payload_struct!(BridgePlay { playback_id: String, media_uri: String });
payload_struct!(BridgeVideoSource { channel: String });
payload_struct!(ChannelHangup { reason: String });
payload_struct!(ChannelMoh { music: String });
payload_struct!(ChannelContinue { context: String, extension: String, priority: i64 });
payload_struct!(ChannelVariable { name: String, value: String });
payload_struct!(DeviceStateUpdate { state: String });
payload_struct!(EndpointListByTech { tech: String });
payload_struct!(MailboxUpdate { new: i64, old: i64 });
payload_struct!(PlaybackControl { command: String });
payload_struct!(RecordingStoredCopy { destination: String });

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundList {
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RecordingOptions>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RecordingOptions>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelPlay {
    pub playback_id: String,
    pub media_uri: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelDial {
    pub caller: String,
    #[serde(serialize_with = "nanos", deserialize_with = "from_nanos")]
    pub timeout: Duration,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSendDtmf {
    pub dtmf: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<DtmfOptions>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnoop {
    pub snoop_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SnoopOptions>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelExternalMedia {
    pub options: ExternalMediaOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelCreate {
    pub channel_create_request: ChannelCreateRequest,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelOriginate {
    pub originate_request: OriginateRequest,
}

/// The wire envelope: `kind` selects which of the payload fields below is
/// populated. Every field round-trips through `skip_serializing_if`, so an
/// envelope with a single payload serializes to exactly the shape the proxy
/// side expects — no stray `null` siblings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asterisk_config: Option<AsteriskConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asterisk_logging_channel: Option<AsteriskLoggingChannel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asterisk_variable_set: Option<AsteriskVariableSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_add_channel: Option<BridgeAddChannel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_create: Option<BridgeCreate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_moh: Option<BridgeMoh>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_play: Option<BridgePlay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_record: Option<BridgeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_remove_channel: Option<BridgeRemoveChannel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_video_source: Option<BridgeVideoSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_create: Option<ChannelCreate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_continue: Option<ChannelContinue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_dial: Option<ChannelDial>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_hangup: Option<ChannelHangup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_moh: Option<ChannelMoh>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_mute: Option<ChannelMute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_originate: Option<ChannelOriginate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_play: Option<ChannelPlay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_record: Option<ChannelRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_send_dtmf: Option<ChannelSendDtmf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_snoop: Option<ChannelSnoop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_external_media: Option<ChannelExternalMedia>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_variable: Option<ChannelVariable>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_state_update: Option<DeviceStateUpdate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_list_by_tech: Option<EndpointListByTech>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailbox_update: Option<MailboxUpdate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_control: Option<PlaybackControl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_stored_copy: Option<RecordingStoredCopy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_list: Option<SoundList>,
}

impl RequestEnvelope {
    /// A bare envelope carrying only `kind` and `key` — the shape of most
    /// `command`/`get` requests (S5).
    pub fn bare(kind: impl Into<String>, key: Key) -> Self {
        RequestEnvelope {
            kind: kind.into(),
            key: Some(key),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyKind;

    #[test]
    fn bare_envelope_omits_every_payload_field() {
        let key = Key::new(KeyKind::Channel, "c1").with_app("myapp").with_node("nA");
        let env = RequestEnvelope::bare("ChannelAnswer", key);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["kind"], "ChannelAnswer");
        assert!(json.get("channel_hangup").is_none());
        assert!(json.get("bridge_create").is_none());
    }

    #[test]
    fn hangup_envelope_carries_reason() {
        let key = Key::new(KeyKind::Channel, "c1").with_app("myapp").with_node("nA");
        let mut env = RequestEnvelope::bare("ChannelHangup", key);
        env.channel_hangup = Some(ChannelHangup { reason: "normal".into() });
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["channel_hangup"]["reason"], "normal");
    }
}
