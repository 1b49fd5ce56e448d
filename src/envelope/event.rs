//! Event envelope (§3) and the named event-kind catalog (§3 of SPEC_FULL).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::entities::ChannelData;

/// The full named event-kind catalog. `Other` is the forward-compatibility
/// escape hatch: a proxy may ship new kinds independently of this crate, and
/// those must still decode rather than fail the whole envelope.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventType {
    ApplicationMoveFailed,
    ApplicationReplaced,
    BridgeAttendedTransfer,
    BridgeBlindTransfer,
    BridgeCreated,
    BridgeDestroyed,
    BridgeMerged,
    BridgeVideoSourceChanged,
    ChannelCallerId,
    ChannelConnectedLine,
    ChannelCreated,
    ChannelDestroyed,
    ChannelDialplan,
    ChannelDtmfReceived,
    ChannelEnteredBridge,
    ChannelHangupRequest,
    ChannelHold,
    ChannelLeftBridge,
    ChannelStateChange,
    ChannelTalkingFinished,
    ChannelTalkingStarted,
    ChannelUnhold,
    ChannelUserevent,
    ChannelVarset,
    ContactInfo,
    ContactStatusChange,
    DeviceStateChanged,
    Dial,
    EndpointStateChange,
    Message,
    MissingParams,
    Peer,
    PeerStatusChange,
    PlaybackContinuing,
    PlaybackFinished,
    PlaybackStarted,
    RecordingFailed,
    RecordingFinished,
    RecordingStarted,
    StasisEnd,
    StasisStart,
    TextMessageReceived,
    /// Any event kind not in the catalog above, preserved verbatim.
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::ApplicationMoveFailed => "ApplicationMoveFailed",
            EventType::ApplicationReplaced => "ApplicationReplaced",
            EventType::BridgeAttendedTransfer => "BridgeAttendedTransfer",
            EventType::BridgeBlindTransfer => "BridgeBlindTransfer",
            EventType::BridgeCreated => "BridgeCreated",
            EventType::BridgeDestroyed => "BridgeDestroyed",
            EventType::BridgeMerged => "BridgeMerged",
            EventType::BridgeVideoSourceChanged => "BridgeVideoSourceChanged",
            EventType::ChannelCallerId => "ChannelCallerId",
            EventType::ChannelConnectedLine => "ChannelConnectedLine",
            EventType::ChannelCreated => "ChannelCreated",
            EventType::ChannelDestroyed => "ChannelDestroyed",
            EventType::ChannelDialplan => "ChannelDialplan",
            EventType::ChannelDtmfReceived => "ChannelDtmfReceived",
            EventType::ChannelEnteredBridge => "ChannelEnteredBridge",
            EventType::ChannelHangupRequest => "ChannelHangupRequest",
            EventType::ChannelHold => "ChannelHold",
            EventType::ChannelLeftBridge => "ChannelLeftBridge",
            EventType::ChannelStateChange => "ChannelStateChange",
            EventType::ChannelTalkingFinished => "ChannelTalkingFinished",
            EventType::ChannelTalkingStarted => "ChannelTalkingStarted",
            EventType::ChannelUnhold => "ChannelUnhold",
            EventType::ChannelUserevent => "ChannelUserevent",
            EventType::ChannelVarset => "ChannelVarset",
            EventType::ContactInfo => "ContactInfo",
            EventType::ContactStatusChange => "ContactStatusChange",
            EventType::DeviceStateChanged => "DeviceStateChanged",
            EventType::Dial => "Dial",
            EventType::EndpointStateChange => "EndpointStateChange",
            EventType::Message => "Message",
            EventType::MissingParams => "MissingParams",
            EventType::Peer => "Peer",
            EventType::PeerStatusChange => "PeerStatusChange",
            EventType::PlaybackContinuing => "PlaybackContinuing",
            EventType::PlaybackFinished => "PlaybackFinished",
            EventType::PlaybackStarted => "PlaybackStarted",
            EventType::RecordingFailed => "RecordingFailed",
            EventType::RecordingFinished => "RecordingFinished",
            EventType::RecordingStarted => "RecordingStarted",
            EventType::StasisEnd => "StasisEnd",
            EventType::StasisStart => "StasisStart",
            EventType::TextMessageReceived => "TextMessageReceived",
            EventType::Other(s) => s.as_str(),
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "ApplicationMoveFailed" => EventType::ApplicationMoveFailed,
            "ApplicationReplaced" => EventType::ApplicationReplaced,
            "BridgeAttendedTransfer" => EventType::BridgeAttendedTransfer,
            "BridgeBlindTransfer" => EventType::BridgeBlindTransfer,
            "BridgeCreated" => EventType::BridgeCreated,
            "BridgeDestroyed" => EventType::BridgeDestroyed,
            "BridgeMerged" => EventType::BridgeMerged,
            "BridgeVideoSourceChanged" => EventType::BridgeVideoSourceChanged,
            "ChannelCallerId" => EventType::ChannelCallerId,
            "ChannelConnectedLine" => EventType::ChannelConnectedLine,
            "ChannelCreated" => EventType::ChannelCreated,
            "ChannelDestroyed" => EventType::ChannelDestroyed,
            "ChannelDialplan" => EventType::ChannelDialplan,
            "ChannelDtmfReceived" => EventType::ChannelDtmfReceived,
            "ChannelEnteredBridge" => EventType::ChannelEnteredBridge,
            "ChannelHangupRequest" => EventType::ChannelHangupRequest,
            "ChannelHold" => EventType::ChannelHold,
            "ChannelLeftBridge" => EventType::ChannelLeftBridge,
            "ChannelStateChange" => EventType::ChannelStateChange,
            "ChannelTalkingFinished" => EventType::ChannelTalkingFinished,
            "ChannelTalkingStarted" => EventType::ChannelTalkingStarted,
            "ChannelUnhold" => EventType::ChannelUnhold,
            "ChannelUserevent" => EventType::ChannelUserevent,
            "ChannelVarset" => EventType::ChannelVarset,
            "ContactInfo" => EventType::ContactInfo,
            "ContactStatusChange" => EventType::ContactStatusChange,
            "DeviceStateChanged" => EventType::DeviceStateChanged,
            "Dial" => EventType::Dial,
            "EndpointStateChange" => EventType::EndpointStateChange,
            "Message" => EventType::Message,
            "MissingParams" => EventType::MissingParams,
            "Peer" => EventType::Peer,
            "PeerStatusChange" => EventType::PeerStatusChange,
            "PlaybackContinuing" => EventType::PlaybackContinuing,
            "PlaybackFinished" => EventType::PlaybackFinished,
            "PlaybackStarted" => EventType::PlaybackStarted,
            "RecordingFailed" => EventType::RecordingFailed,
            "RecordingFinished" => EventType::RecordingFinished,
            "RecordingStarted" => EventType::RecordingStarted,
            "StasisEnd" => EventType::StasisEnd,
            "StasisStart" => EventType::StasisStart,
            "TextMessageReceived" => EventType::TextMessageReceived,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(EventType::from_str(&s))
    }
}

/// The wire shape of an event, as it arrives on a queue/dynamic subscription.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    event_type: EventType,
    #[serde(default)]
    node: String,
    #[serde(default)]
    application: String,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    cause: Option<String>,
    #[serde(default)]
    channel: Option<ChannelData>,
}

/// A decoded event, with a runtime-only `stop_propagation` flag layered on
/// top of the wire shape (§4.E). The flag is shared (`Arc`) so a listener
/// invoked on its own dispatcher task can set it and have the fan-out loop
/// observe the change before scheduling the next listener.
#[derive(Clone, Debug)]
pub struct StasisEvent {
    pub event_type: EventType,
    pub node: String,
    pub application: String,
    pub timestamp: String,
    pub args: Vec<String>,
    pub cause: Option<String>,
    pub channel: Option<ChannelData>,
    stop_propagation: Arc<AtomicBool>,
}

impl StasisEvent {
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let wire: WireEvent = serde_json::from_slice(payload)?;
        Ok(StasisEvent {
            event_type: wire.event_type,
            node: wire.node,
            application: wire.application,
            timestamp: wire.timestamp,
            args: wire.args,
            cause: wire.cause,
            channel: wire.channel,
            stop_propagation: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Mark that no further not-yet-scheduled listeners should run for this
    /// event. In-flight listeners are unaffected (§4.E, §9).
    pub fn stop_propagation(&self) {
        self.stop_propagation.store(true, Ordering::SeqCst);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stop_propagation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_type_decodes_as_other() {
        let payload = br#"{"type":"SomeFutureEvent","node":"nA","application":"myapp"}"#;
        let event = StasisEvent::decode(payload).unwrap();
        assert_eq!(event.event_type, EventType::Other("SomeFutureEvent".to_string()));
    }

    #[test]
    fn stasis_start_round_trips() {
        let payload = br#"{"type":"StasisStart","node":"nA","application":"myapp","args":["a","b"]}"#;
        let event = StasisEvent::decode(payload).unwrap();
        assert_eq!(event.event_type, EventType::StasisStart);
        assert_eq!(event.args, vec!["a".to_string(), "b".to_string()]);
        assert!(!event.is_propagation_stopped());
    }
}
