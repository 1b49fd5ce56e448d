//! Key & Subject model (component A).
//!
//! A [`Key`] is the cluster-wide address of a resource; a subject is the bus
//! topic that a request built against a key is sent to. Both are pure, total
//! functions of their inputs — no I/O, no fallibility.

use serde::{Deserialize, Serialize};

/// The resource kind a [`Key`] addresses.
///
/// Wire representation is the lowercase string used by the proxy side, kept
/// stable across releases since it appears inside JSON envelopes that other
/// processes decode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Application,
    Bridge,
    Channel,
    #[serde(rename = "devicestate")]
    DeviceState,
    Endpoint,
    #[serde(rename = "liverecording")]
    LiveRecording,
    Logging,
    Mailbox,
    Module,
    Playback,
    Sound,
    #[serde(rename = "storedrecording")]
    StoredRecording,
    Variable,
}

impl KeyKind {
    /// The wire string for this kind, matching [`KeyKind`]'s `serde` rename.
    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::Application => "application",
            KeyKind::Bridge => "bridge",
            KeyKind::Channel => "channel",
            KeyKind::DeviceState => "devicestate",
            KeyKind::Endpoint => "endpoint",
            KeyKind::LiveRecording => "liverecording",
            KeyKind::Logging => "logging",
            KeyKind::Mailbox => "mailbox",
            KeyKind::Module => "module",
            KeyKind::Playback => "playback",
            KeyKind::Sound => "sound",
            KeyKind::StoredRecording => "storedrecording",
            KeyKind::Variable => "variable",
        }
    }
}

/// The cluster-wide address of a resource.
///
/// A key is **coordinate-complete** when both `node` and `app` are set
/// ([`Key::is_coordinate_complete`]); only such keys may be used to issue
/// commands (§3 invariants).
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Key {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<KeyKind>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub app: Option<String>,
}

impl Key {
    /// Build a new key with no app/node coordinates set.
    pub fn new(kind: KeyKind, id: impl Into<String>) -> Self {
        Key {
            kind: Some(kind),
            id: Some(id.into()),
            node: None,
            app: None,
        }
    }

    /// Builder-style setter for `app`, mirroring `WithApp`.
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Builder-style setter for `node`, mirroring `WithNode`.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// A key bound only to an application and node, with no kind or id —
    /// the coordinate pair that every sibling key is derived from.
    pub fn node_key(app: impl Into<String>, node: impl Into<String>) -> Self {
        Key {
            kind: None,
            id: None,
            node: Some(node.into()),
            app: Some(app.into()),
        }
    }

    /// Derive a sibling key of `kind`/`id` that inherits this key's `app`
    /// and `node`. The source key is left untouched.
    pub fn derive(&self, kind: KeyKind, id: impl Into<String>) -> Self {
        let mut n = Key::node_key(
            self.app.clone().unwrap_or_default(),
            self.node.clone().unwrap_or_default(),
        );
        n.kind = Some(kind);
        n.id = Some(id.into());
        n
    }

    /// A key carries both `node` and `app`, and is therefore eligible to be
    /// used in a command request.
    pub fn is_coordinate_complete(&self) -> bool {
        self.node.as_deref().is_some_and(|n| !n.is_empty())
            && self.app.as_deref().is_some_and(|a| !a.is_empty())
    }

    pub fn kind(&self) -> Option<KeyKind> {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }
}

/// One of the five RPC verb classes a subject segment may carry, plus the
/// `announce` class used for cluster-membership broadcasts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SubjectClass {
    Command,
    Get,
    Data,
    Create,
    List,
    Announce,
}

impl SubjectClass {
    fn as_str(self) -> &'static str {
        match self {
            SubjectClass::Command => "command",
            SubjectClass::Get => "get",
            SubjectClass::Data => "data",
            SubjectClass::Create => "create",
            SubjectClass::List => "list",
            SubjectClass::Announce => "announce",
        }
    }
}

/// Build the RPC subject `<prefix>.<app>.<class>.<node>`.
///
/// An empty `app` collapses the subject to `<prefix>.` — this mirrors the
/// original wire behaviour rather than rejecting the empty-app case, since
/// coordinate-completeness is checked one layer up, in the RPC façade.
pub fn subject(prefix: &str, app: &str, class: SubjectClass, node: &str) -> String {
    if app.is_empty() {
        return format!("{prefix}.");
    }
    format!("{prefix}.{app}.{}.{node}", class.as_str())
}

/// Replace `.` with `#` for use inside a single bus subject segment. Channel
/// ids may contain `.`, which would otherwise be mistaken for a subject
/// separator; event payloads still carry the unescaped id (§9 design notes).
pub fn escape_subject_segment(raw: &str) -> String {
    raw.replace('.', "#")
}

/// The per-call dynamic subject `<prefix>.<app>.<node>.<escaped-channel-id>`.
pub fn call_subject(prefix: &str, app: &str, node: &str, channel_id: &str) -> String {
    format!("{prefix}.{app}.{node}.{}", escape_subject_segment(channel_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_synthesis_matches_s1() {
        assert_eq!(
            subject("ari", "myapp", SubjectClass::Command, "nodeA"),
            "ari.myapp.command.nodeA"
        );
        assert_eq!(subject("ari", "", SubjectClass::Command, "nodeA"), "ari.");
    }

    #[test]
    fn derive_preserves_app_and_node_without_mutating_source() {
        let source = Key::new(KeyKind::Channel, "c1")
            .with_app("myapp")
            .with_node("nA");
        let derived = source.derive(KeyKind::Playback, "p1");

        assert_eq!(derived.app(), Some("myapp"));
        assert_eq!(derived.node(), Some("nA"));
        assert_eq!(derived.kind(), Some(KeyKind::Playback));
        assert_eq!(derived.id(), Some("p1"));

        assert_eq!(source.kind(), Some(KeyKind::Channel));
        assert_eq!(source.id(), Some("c1"));
    }

    #[test]
    fn coordinate_completeness() {
        let complete = Key::new(KeyKind::Channel, "c1")
            .with_app("myapp")
            .with_node("nA");
        assert!(complete.is_coordinate_complete());

        let missing_app = Key::new(KeyKind::Channel, "c1").with_node("nA");
        assert!(!missing_app.is_coordinate_complete());
    }

    #[test]
    fn call_subject_escapes_dots() {
        assert_eq!(call_subject("ari", "myapp", "nA", "c42.7"), "ari.myapp.nA.c42#7");
    }
}
