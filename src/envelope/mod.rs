//! Envelope types (component B): the JSON shapes that cross the bus.
//!
//! Unknown fields are ignored on decode throughout this module (`serde`'s
//! default for structs without `deny_unknown_fields`), matching the
//! forward-compatibility requirement in §6.

pub mod announcement;
pub mod entities;
pub mod event;
pub mod request;
pub mod response;

pub use announcement::Announcement;
pub use entities::{
    AsteriskInfo, BridgeData, CallerInfo, ChannelData, DialplanInfo, EntityData, LiveRecordingData,
    PlaybackData, StoredRecordingData,
};
pub use event::{EventType, StasisEvent};
pub use request::*;
pub use response::ResponseEnvelope;
