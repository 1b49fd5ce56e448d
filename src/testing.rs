//! In-memory [`Bus`] used by this crate's own tests (§10) and available to
//! downstream integration tests that want to assert on bus traffic without
//! a real NATS server.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::bus::{Bus, MessageHandler, SubscriptionHandle};
use crate::error::{ClientError, Result};

/// One recorded call into the mock, for test assertions.
#[derive(Clone, Debug)]
pub enum Recorded {
    Publish { subject: String, payload: Vec<u8> },
    Request { subject: String, payload: Vec<u8> },
}

/// A scripted response for [`MockBus::request`], keyed by subject.
pub type ScriptedReply = Box<dyn Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync>;

struct Subscriber {
    pattern: String,
    handler: MessageHandler,
}

/// A [`Bus`] that records every call, lets a test script canned
/// request/reply answers, and delivers events to subscription handlers
/// matched against NATS-style subject patterns (`*` for one token, `>` for
/// the remainder) so wildcard subscriptions such as `<conn>.announce.*`
/// work the same way they would against a real bus.
pub struct MockBus {
    calls: Mutex<Vec<Recorded>>,
    scripts: DashMap<String, ScriptedReply>,
    subscribers: DashMap<u64, Subscriber>,
    next_id: AtomicU64,
    connected: std::sync::atomic::AtomicBool,
}

impl Default for MockBus {
    fn default() -> Self {
        MockBus::new()
    }
}

impl MockBus {
    pub fn new() -> Self {
        MockBus {
            calls: Mutex::new(Vec::new()),
            scripts: DashMap::new(),
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            connected: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Install a canned reply for every `request` made to `subject`.
    pub fn script_reply(
        &self,
        subject: impl Into<String>,
        reply: impl Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync + 'static,
    ) {
        self.scripts.insert(subject.into(), Box::new(reply));
    }

    /// Deliver `payload` to every handler whose subscription pattern
    /// matches `subject`.
    pub fn deliver(&self, subject: &str, payload: Vec<u8>) {
        for entry in self.subscribers.iter() {
            if subject_matches(&entry.pattern, subject) {
                (entry.handler)(payload.clone());
            }
        }
    }

    pub fn recorded_calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Recorded::Publish { .. }))
            .count()
    }

    pub fn request_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Recorded::Request { .. }))
            .count()
    }

    fn register(&self, pattern: &str, handler: MessageHandler) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(
            id,
            Subscriber {
                pattern: pattern.to_string(),
                handler,
            },
        );
        SubscriptionHandle(id)
    }
}

/// NATS-style subject matching: `*` matches exactly one dot-delimited
/// token, `>` matches one-or-more trailing tokens and must be the last
/// token in the pattern.
fn subject_matches(pattern: &str, subject: &str) -> bool {
    let pattern_tokens: Vec<&str> = pattern.split('.').collect();
    let subject_tokens: Vec<&str> = subject.split('.').collect();

    for (i, ptok) in pattern_tokens.iter().enumerate() {
        if *ptok == ">" {
            return i < subject_tokens.len();
        }
        match subject_tokens.get(i) {
            Some(stok) if *ptok == "*" || ptok == stok => continue,
            _ => return false,
        }
    }
    pattern_tokens.len() == subject_tokens.len()
}

#[async_trait]
impl Bus for MockBus {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        self.calls.lock().unwrap().push(Recorded::Publish {
            subject: subject.to_string(),
            payload,
        });
        Ok(())
    }

    async fn subscribe(&self, subject: &str, handler: MessageHandler) -> Result<SubscriptionHandle> {
        Ok(self.register(subject, handler))
    }

    async fn queue_subscribe(
        &self,
        subject: &str,
        _queue: &str,
        handler: MessageHandler,
    ) -> Result<SubscriptionHandle> {
        Ok(self.register(subject, handler))
    }

    async fn request(&self, subject: &str, payload: Vec<u8>, _timeout: Duration) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(Recorded::Request {
            subject: subject.to_string(),
            payload: payload.clone(),
        });
        match self.scripts.get(subject) {
            Some(script) => script(&payload),
            None => Err(ClientError::BusUnavailable {
                reason: format!("no scripted reply for subject {subject}"),
            }),
        }
    }

    async fn drain(&self, handle: SubscriptionHandle) -> Result<()> {
        self.subscribers.remove(&handle.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matching() {
        assert!(subject_matches("ari.announce.*", "ari.announce.nB"));
        assert!(!subject_matches("ari.announce.*", "ari.announce.nB.extra"));
        assert!(subject_matches("ari.myapp.*.*.stasisstart.>", "ari.myapp.nA.c1.stasisstart.foo"));
        assert!(subject_matches("ari.myapp.nA.c1.>", "ari.myapp.nA.c1.stasisstart"));
        assert!(!subject_matches("ari.myapp.nA.c1.>", "ari.myapp.nA.c1"));
    }
}
