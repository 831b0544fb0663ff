//! Event fan-out to channel subscribers and callbacks.
//!
//! Two ways to listen:
//!
//! - [`EventHub::subscribe`] - a `broadcast::Receiver`, for async consumers
//! - [`EventHub::on_event`] - a synchronous callback, detached when the
//!   returned [`Subscription`] is dropped or unsubscribed
//!
//! Dispatch happens outside the monitor lock; handlers may query the
//! service freely.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::event::GeofenceEvent;

/// Default capacity of the broadcast channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Synchronous event callback.
pub type EventHandler = Arc<dyn Fn(&GeofenceEvent) + Send + Sync>;

/// Fan-out point for geofence events.
pub struct EventHub {
    tx: broadcast::Sender<GeofenceEvent>,
    handlers: Mutex<Vec<(u64, EventHandler)>>,
    next_id: AtomicU64,
}

impl EventHub {
    /// Create a hub whose channel buffers `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            handlers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to events as a channel.
    ///
    /// Slow receivers observe `RecvError::Lagged` rather than blocking the
    /// monitor.
    pub fn subscribe(&self) -> broadcast::Receiver<GeofenceEvent> {
        self.tx.subscribe()
    }

    /// Register a callback. It stays attached while the returned
    /// [`Subscription`] is alive.
    pub fn on_event(
        self: &Arc<Self>,
        handler: impl Fn(&GeofenceEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().push((id, Arc::new(handler)));
        Subscription {
            id,
            hub: Arc::downgrade(self),
        }
    }

    /// Number of attached callbacks.
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Deliver events to every channel subscriber and callback, in order.
    pub fn dispatch(&self, events: &[GeofenceEvent]) {
        if events.is_empty() {
            return;
        }

        // Snapshot so handlers can (un)subscribe while being called
        let handlers: Vec<EventHandler> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for event in events {
            // No receivers is not an error
            let _ = self.tx.send(event.clone());
            for handler in &handlers {
                handler(event);
            }
        }
    }

    fn detach(&self, id: u64) {
        self.handlers.lock().retain(|(handler_id, _)| *handler_id != id);
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

/// Handle keeping an event callback attached.
#[must_use = "the callback is detached as soon as the subscription is dropped"]
pub struct Subscription {
    id: u64,
    hub: Weak<EventHub>,
}

impl Subscription {
    /// Detach the callback now.
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.detach(self.id);
        }
    }
}
