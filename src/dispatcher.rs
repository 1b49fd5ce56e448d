//! Event dispatcher (component E): an in-process listener registry with a
//! bounded worker pool, so a slow or misbehaving listener never stalls the
//! bus-receive path that decoded the event in the first place.
//!
//! ## Design
//! - **Listener identity.** The original proxy removed listeners by
//!   `reflect.ValueOf(fn).Pointer()` — Go function values carry a stable
//!   pointer. Rust closures and trait objects don't, so `add_listener`
//!   returns a [`ListenerId`] token and `remove_listener` takes it back;
//!   the token *is* the identity, which is the idiomatic Rust shape for
//!   this pattern (property 7 in §8 is framed in terms of that token, not
//!   a raw function pointer).
//! - **Bounded concurrency, not a bounded queue.** Submission spawns one
//!   task per listener invocation, each gated by a [`tokio::sync::Semaphore`]
//!   permit sized at `dispatcher_pool_size`. Spawning never blocks — a
//!   listener simply waits for a permit on its own task — so the
//!   bus-receive path that calls [`EventDispatcher::dispatch`] never stalls
//!   (§9 open question: saturation blocks waiting tasks rather than
//!   dropping events or running inline).
//! - **`stop_propagation` is best-effort.** The dispatch loop checks the
//!   event's flag before *submitting* each remaining listener; invocations
//!   already spawned run to completion regardless (§4.E, §9).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::envelope::{EventType, StasisEvent};

/// Opaque token identifying a registered listener, returned by
/// [`EventDispatcher::add_listener`] and consumed by
/// [`EventDispatcher::remove_listener`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(u64);

type Callback = Arc<dyn Fn(StasisEvent) + Send + Sync>;

struct Listener {
    id: ListenerId,
    once: bool,
    callback: Callback,
}

struct Inner {
    listeners: DashMap<EventType, Vec<Listener>>,
    permits: Arc<Semaphore>,
    next_id: AtomicU64,
}

/// Cheaply-cloneable handle to the listener registry and its worker pool.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<Inner>,
}

impl EventDispatcher {
    /// `pool_size` bounds the number of listener invocations that may run
    /// concurrently (default 1000, §6).
    pub fn new(pool_size: usize) -> Self {
        EventDispatcher {
            inner: Arc::new(Inner {
                listeners: DashMap::new(),
                permits: Arc::new(Semaphore::new(pool_size.max(1))),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    fn add(&self, event_type: EventType, once: bool, callback: Callback) -> ListenerId {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .entry(event_type)
            .or_default()
            .push(Listener { id, once, callback });
        id
    }

    /// Register a listener for `event_type`; it fires on every matching
    /// [`Self::dispatch`] call until removed.
    pub fn add_listener(
        &self,
        event_type: EventType,
        callback: impl Fn(StasisEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.add(event_type, false, Arc::new(callback))
    }

    /// Register a listener that removes itself after its first invocation.
    pub fn add_listener_once(
        &self,
        event_type: EventType,
        callback: impl Fn(StasisEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.add(event_type, true, Arc::new(callback))
    }

    /// Remove the listener identified by `id`, if it is still registered.
    pub fn remove_listener(&self, event_type: &EventType, id: ListenerId) {
        if let Some(mut entry) = self.inner.listeners.get_mut(event_type) {
            entry.retain(|l| l.id != id);
        }
    }

    /// Remove every listener registered for `event_type`.
    pub fn remove_all(&self, event_type: &EventType) {
        self.inner.listeners.remove(event_type);
    }

    pub fn has_listeners(&self, event_type: &EventType) -> bool {
        self.inner
            .listeners
            .get(event_type)
            .is_some_and(|l| !l.is_empty())
    }

    /// Snapshot the listeners registered for `event.event_type` and submit
    /// each invocation to the worker pool. Every invocation re-checks the
    /// event's `stop_propagation` flag itself, right after acquiring its
    /// permit and before running its callback — submission happens
    /// synchronously, before any listener has actually run, so the flag can
    /// only be observed meaningfully once a task is about to execute.
    pub fn dispatch(&self, event: StasisEvent) {
        let snapshot: Vec<Listener> = match self.inner.listeners.get(&event.event_type) {
            Some(entry) => entry
                .iter()
                .map(|l| Listener {
                    id: l.id,
                    once: l.once,
                    callback: l.callback.clone(),
                })
                .collect(),
            None => return,
        };

        for listener in snapshot {
            let permits = self.inner.permits.clone();
            let event_for_listener = event.clone();
            let dispatcher = self.clone();
            let event_type = event.event_type.clone();
            tokio::spawn(async move {
                let permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!("dispatcher semaphore closed, dropping invocation");
                        return;
                    }
                };
                if event_for_listener.is_propagation_stopped() {
                    return;
                }
                (listener.callback)(event_for_listener);
                drop(permit);
                if listener.once {
                    dispatcher.remove_listener(&event_type, listener.id);
                }
            });
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        EventDispatcher::new(1000)
    }
}
