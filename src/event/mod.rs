//! Event system for the accessory directory.
//!
//! The engine publishes everything the directory needs to know as
//! [`Event`]s on a broadcast channel: new gateways, new accessories,
//! readings, evictions and write traffic.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::types::{Accessory, AccessoryKey, Reading};

/// Event types that can be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A gateway answered discovery with its device list.
    GatewayDiscovered {
        sid: String,
        addr: SocketAddr,
        devices: usize,
    },
    /// An accessory was seen for the first time (or again after eviction).
    AccessoryAdded(Accessory),
    /// A decoded reading for an accessory.
    Reading(Reading),
    /// Accessories evicted by one sweep.
    AccessoriesRemoved(Vec<AccessoryKey>),
    /// A write command was sent.
    WriteSent {
        sid: String,
        channel: String,
        on: bool,
    },
    /// A gateway acknowledged some earlier write.
    WriteAck,
}

/// Coarse event classification used by [`EventFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GatewayDiscovered,
    AccessoryAdded,
    Reading,
    AccessoriesRemoved,
    WriteSent,
    WriteAck,
}

impl Event {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::GatewayDiscovered { .. } => EventKind::GatewayDiscovered,
            Self::AccessoryAdded(_) => EventKind::AccessoryAdded,
            Self::Reading(_) => EventKind::Reading,
            Self::AccessoriesRemoved(_) => EventKind::AccessoriesRemoved,
            Self::WriteSent { .. } => EventKind::WriteSent,
            Self::WriteAck => EventKind::WriteAck,
        }
    }

    /// Returns the accessory this event is about, if it names exactly one.
    #[must_use]
    pub const fn accessory_key(&self) -> Option<&AccessoryKey> {
        match self {
            Self::AccessoryAdded(accessory) => Some(&accessory.key),
            Self::Reading(reading) => Some(&reading.key),
            _ => None,
        }
    }
}

/// Subscription filter for specific event types.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Filter by event kinds.
    pub kinds: Option<Vec<EventKind>>,
    /// Filter for a specific accessory.
    pub accessory: Option<AccessoryKey>,
}

impl EventFilter {
    /// Creates a filter for specific event kinds.
    #[must_use]
    pub const fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            kinds: Some(kinds),
            accessory: None,
        }
    }

    /// Creates a filter for events about one accessory.
    #[must_use]
    pub const fn accessory(key: AccessoryKey) -> Self {
        Self {
            kinds: None,
            accessory: Some(key),
        }
    }

    /// Checks if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        // Check kind filter
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind()) {
                return false;
            }
        }

        // Check accessory filter
        if let Some(ref expected) = self.accessory {
            if event.accessory_key() != Some(expected) {
                return false;
            }
        }

        true
    }
}

/// A subscription to events.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
    filter: Option<EventFilter>,
}

impl Subscription {
    /// Receives the next matching event.
    ///
    /// Returns `None` once the dispatcher is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.as_ref().is_none_or(|f| f.matches(&event)) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("subscriber lagged, {skipped} events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next already-queued matching event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.as_ref().is_none_or(|f| f.matches(&event)) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}

struct EventDispatcherInner {
    sender: broadcast::Sender<Event>,
}

/// Dispatches events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<EventDispatcherInner>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(EventDispatcherInner { sender }),
        }
    }

    /// Dispatches an event to all subscribers.
    pub fn dispatch(&self, event: Event) {
        // no subscribers is fine
        let _ = self.inner.sender.send(event);
    }

    /// Subscribes to events with an optional filter.
    #[must_use]
    pub fn subscribe(&self, filter: Option<EventFilter>) -> Subscription {
        Subscription {
            receiver: self.inner.sender.subscribe(),
            filter,
        }
    }

    /// Waits for an event matching the filter with timeout.
    ///
    /// Returns `None` if the timeout expires or the channel is closed.
    pub async fn wait_for(
        &self,
        filter: EventFilter,
        timeout: std::time::Duration,
    ) -> Option<Event> {
        let mut subscription = self.subscribe(Some(filter));

        tokio::select! {
            biased;
            result = subscription.recv() => result,
            () = tokio::time::sleep(timeout) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReadingValue;

    fn reading(key: &str) -> Event {
        Event::Reading(Reading {
            key: AccessoryKey::from(key),
            value: ReadingValue::Motion(true),
            battery: None,
        })
    }

    #[tokio::test]
    async fn test_event_dispatch() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe(None);

        dispatcher.dispatch(Event::WriteAck);

        let event = tokio::time::timeout(std::time::Duration::from_millis(100), sub.recv())
            .await
            .unwrap();

        assert!(matches!(event, Some(Event::WriteAck)));
    }

    #[tokio::test]
    async fn test_filtered_subscription_skips_other_events() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe(Some(EventFilter::kinds(vec![EventKind::Reading])));

        dispatcher.dispatch(Event::WriteAck);
        dispatcher.dispatch(reading("Motm"));

        assert_eq!(sub.recv().await, Some(reading("Motm")));
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_event_filter() {
        let filter = EventFilter::kinds(vec![EventKind::WriteAck, EventKind::AccessoriesRemoved]);

        assert!(filter.matches(&Event::WriteAck));
        assert!(filter.matches(&Event::AccessoriesRemoved(Vec::new())));
        assert!(!filter.matches(&reading("Motm")));
    }

    #[test]
    fn test_accessory_filter() {
        let filter = EventFilter::accessory(AccessoryKey::from("Motm"));

        assert!(filter.matches(&reading("Motm")));
        assert!(!filter.matches(&reading("Mota")));
        assert!(!filter.matches(&Event::WriteAck));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_timeout() {
        let dispatcher = EventDispatcher::new(16);
        let result = dispatcher
            .wait_for(
                EventFilter::kinds(vec![EventKind::WriteAck]),
                std::time::Duration::from_secs(1),
            )
            .await;
        assert!(result.is_none());
    }
}
