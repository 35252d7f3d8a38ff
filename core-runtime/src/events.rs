//! # Event Bus System
//!
//! A synchronous publish/subscribe hub owned by one player instance.
//!
//! ## Overview
//!
//! Components publish typed events; any number of observers (other components,
//! widget code, an error display) react to them. The bus is generic over the
//! event vocabulary: an event type implements [`BusEvent`] to expose the
//! discriminant handlers subscribe to.
//!
//! ```text
//! ┌──────────────┐   emit    ┌──────────┐   invoke (in order)   ┌──────────┐
//! │ Playlist     ├──────────>│          ├──────────────────────>│ handler  │
//! └──────────────┘           │ EventBus │                       └──────────┘
//! ┌──────────────┐   emit    │          │   broadcast mirror    ┌──────────┐
//! │ StateHandler ├──────────>│          ├──────────────────────>│ stream() │
//! └──────────────┘           └──────────┘                       └──────────┘
//! ```
//!
//! ## Dispatch semantics
//!
//! - [`EventBus::emit`] runs every handler registered for the event's kind on
//!   the caller's stack, in registration order, before returning.
//! - The registry lock is released before any handler runs, so handlers may
//!   emit, subscribe or unsubscribe re-entrantly.
//! - Registering the same `Arc` handler twice for one kind is a no-op.
//! - [`EventBus::once`] handlers are removed before their only invocation.
//!
//! ## Handler failures
//!
//! A panicking handler is always logged. What happens next is decided by the
//! bus's [`DispatchPolicy`]: `Isolate` keeps dispatching to the remaining
//! handlers, `Propagate` re-raises the panic out of `emit`.
//!
//! ## Async observers
//!
//! Every emitted event is also mirrored into a `tokio::sync::broadcast`
//! channel. [`EventBus::stream`] returns an [`EventStream`] for tasks that
//! prefer to await events instead of registering callbacks.
//!
//! ```rust
//! use core_runtime::events::{BusEvent, EventBus};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone)]
//! struct Tick(u32);
//!
//! impl BusEvent for Tick {
//!     type Kind = ();
//!     fn kind(&self) -> Self::Kind {}
//! }
//!
//! let bus = EventBus::<Tick>::new();
//! bus.on((), Arc::new(|tick: &Tick| println!("tick {}", tick.0)));
//! assert_eq!(bus.emit(&Tick(1)), 1);
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, trace};

pub use tokio::sync::broadcast::error::RecvError;

/// Default capacity of the async mirror channel.
///
/// Stream consumers that fall further behind than this receive
/// `RecvError::Lagged`.
pub const DEFAULT_STREAM_CAPACITY: usize = 64;

/// An event that can travel over an [`EventBus`].
pub trait BusEvent: Clone + fmt::Debug + Send + Sync + 'static {
    /// Discriminant handlers subscribe to.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// A registered callback. Identity is the `Arc` allocation.
pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Opaque identifier returned by [`EventBus::on`] and [`EventBus::once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// What `emit` does when a handler panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchPolicy {
    /// Log the panic and keep dispatching to later handlers.
    #[default]
    Isolate,
    /// Log the panic and re-raise it; later handlers do not run.
    Propagate,
}

struct Registration<E> {
    id: SubscriptionId,
    handler: Handler<E>,
    once: bool,
}

/// Synchronous, re-entrant event dispatcher.
pub struct EventBus<E: BusEvent> {
    registry: Mutex<HashMap<E::Kind, Vec<Registration<E>>>>,
    next_id: AtomicU64,
    policy: DispatchPolicy,
    mirror: broadcast::Sender<E>,
}

impl<E: BusEvent> EventBus<E> {
    /// Creates a bus with the default policy and stream capacity.
    pub fn new() -> Self {
        Self::with_settings(DispatchPolicy::default(), DEFAULT_STREAM_CAPACITY)
    }

    /// Creates a bus with an explicit dispatch policy.
    pub fn with_policy(policy: DispatchPolicy) -> Self {
        Self::with_settings(policy, DEFAULT_STREAM_CAPACITY)
    }

    /// Creates a bus with an explicit policy and mirror channel capacity.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_settings(policy: DispatchPolicy, stream_capacity: usize) -> Self {
        let (mirror, _) = broadcast::channel(stream_capacity.max(1));
        Self {
            registry: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            policy,
            mirror,
        }
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Registers `handler` for `kind`.
    ///
    /// Registering a handler that is already registered for `kind` returns the
    /// existing subscription instead of adding a duplicate.
    pub fn on(&self, kind: E::Kind, handler: Handler<E>) -> SubscriptionId {
        self.register(kind, handler, false)
    }

    /// Registers `handler` for a single invocation.
    pub fn once(&self, kind: E::Kind, handler: Handler<E>) -> SubscriptionId {
        self.register(kind, handler, true)
    }

    fn register(&self, kind: E::Kind, handler: Handler<E>, once: bool) -> SubscriptionId {
        let mut registry = self.registry.lock();
        let entries = registry.entry(kind).or_default();

        if let Some(existing) = entries
            .iter()
            .find(|entry| same_handler(&entry.handler, &handler))
        {
            return existing.id;
        }

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        entries.push(Registration { id, handler, once });
        trace!(?kind, id = id.0, once, "Handler registered");
        id
    }

    /// Removes `handler` from `kind`. Returns `true` if it was registered.
    pub fn off(&self, kind: E::Kind, handler: &Handler<E>) -> bool {
        let mut registry = self.registry.lock();
        let Some(entries) = registry.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| !same_handler(&entry.handler, handler));
        before != entries.len()
    }

    /// Removes the subscription with `id`, whatever its kind.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock();
        for entries in registry.values_mut() {
            if let Some(position) = entries.iter().position(|entry| entry.id == id) {
                entries.remove(position);
                return true;
            }
        }
        false
    }

    /// Number of handlers currently registered for `kind`.
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.registry.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.registry.lock().clear();
    }

    /// Dispatches `event` to the handlers registered for its kind.
    ///
    /// Returns the number of handlers that returned normally. Under
    /// [`DispatchPolicy::Propagate`] a handler panic unwinds out of this call.
    pub fn emit(&self, event: &E) -> usize {
        let kind = event.kind();

        let handlers: Vec<Handler<E>> = {
            let mut registry = self.registry.lock();
            match registry.get_mut(&kind) {
                Some(entries) => {
                    let snapshot = entries
                        .iter()
                        .map(|entry| Arc::clone(&entry.handler))
                        .collect();
                    entries.retain(|entry| !entry.once);
                    snapshot
                }
                None => Vec::new(),
            }
        };

        // No stream subscribers is the common case.
        let _ = self.mirror.send(event.clone());

        trace!(?kind, handlers = handlers.len(), "Dispatching event");

        let mut completed = 0;
        for handler in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => completed += 1,
                Err(payload) => {
                    error!(
                        ?kind,
                        panic = %panic_message(payload.as_ref()),
                        policy = ?self.policy,
                        "Event handler panicked"
                    );
                    if self.policy == DispatchPolicy::Propagate {
                        panic::resume_unwind(payload);
                    }
                }
            }
        }
        completed
    }

    /// Returns an async stream mirroring every event emitted from now on.
    pub fn stream(&self) -> EventStream<E> {
        EventStream::new(self.mirror.subscribe())
    }

    /// Number of live [`EventStream`]s.
    pub fn stream_count(&self) -> usize {
        self.mirror.receiver_count()
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        let handlers: usize = registry.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("policy", &self.policy)
            .field("handlers", &handlers)
            .field("stream_count", &self.mirror.receiver_count())
            .finish()
    }
}

// Compare allocation addresses only; vtable pointers for the same closure can
// differ between codegen units.
fn same_handler<E>(a: &Handler<E>, b: &Handler<E>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
pub struct EventStream<E: BusEvent> {
    receiver: broadcast::Receiver<E>,
    filter: Option<EventFilter<E>>,
}

impl<E: BusEvent> EventStream<E> {
    pub fn new(receiver: broadcast::Receiver<E>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &E) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the stream fell behind by `n` events,
    /// `RecvError::Closed` once the bus is dropped.
    pub async fn recv(&mut self) -> Result<E, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive. `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<Result<E, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl<E: BusEvent> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
