use std::collections::HashMap;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::tracker::source::RawDeviceState;

/// The six kinds of events the tracker can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Pressed,
    Released,
    Move,
    MoveStopped,
    Connected,
    Disconnected,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Pressed,
        EventKind::Released,
        EventKind::Move,
        EventKind::MoveStopped,
        EventKind::Connected,
        EventKind::Disconnected,
    ];
}

/// Payload of a `Move`/`MoveStopped` event.
///
/// Triggers are one-dimensional, sticks always move as an x/y pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveValue {
    Trigger(f32),
    Stick { x: f32, y: f32 },
}

/// A discrete input event derived from two consecutive device snapshots.
///
/// `device` is the index into the active device list; `button` is a
/// standard-layout button index; `control` is a button index for trigger
/// motion or the even start index of an axis pair for stick motion.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Pressed { device: usize, button: usize },
    Released { device: usize, button: usize },
    Move { device: usize, control: usize, value: MoveValue },
    MoveStopped { device: usize, control: usize, value: MoveValue },
    Connected { device: usize, state: RawDeviceState },
    Disconnected { device: usize },
}

impl TrackerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TrackerEvent::Pressed { .. } => EventKind::Pressed,
            TrackerEvent::Released { .. } => EventKind::Released,
            TrackerEvent::Move { .. } => EventKind::Move,
            TrackerEvent::MoveStopped { .. } => EventKind::MoveStopped,
            TrackerEvent::Connected { .. } => EventKind::Connected,
            TrackerEvent::Disconnected { .. } => EventKind::Disconnected,
        }
    }
}

type EventHandler = Box<dyn FnMut(&TrackerEvent) + Send>;

/// Publish/subscribe surface for tracker events.
///
/// Handlers run synchronously inside the tick that produced the event, so
/// they must not block; anything long-running belongs behind
/// [`EventBus::subscribe_channel`].
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<EventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&TrackerEvent) + Send + 'static,
    {
        debug!("New subscriber for {:?} events", kind);
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Bridge one event kind into an mpsc channel for async consumers.
    ///
    /// Events are forwarded with `try_send`; a full channel drops the event
    /// rather than blocking the tick.
    pub fn subscribe_channel(
        &mut self,
        kind: EventKind,
        capacity: usize,
    ) -> mpsc::Receiver<TrackerEvent> {
        let (sender, receiver) = mpsc::channel(capacity);
        self.subscribe(kind, move |event| {
            if let Err(e) = sender.try_send(event.clone()) {
                warn!("Dropping {:?} event, subscriber channel full: {}", kind, e);
            }
        });
        receiver
    }

    /// Deliver an event to every handler registered for its kind.
    pub fn publish(&mut self, event: &TrackerEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                handler(event);
            }
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts = f.debug_struct("EventBus");
        for kind in EventKind::ALL {
            if let Some(handlers) = self.handlers.get(&kind) {
                counts.field(&format!("{:?}", kind), &handlers.len());
            }
        }
        counts.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn publish_reaches_only_matching_subscribers() {
        let mut bus = EventBus::new();
        let pressed: Arc<Mutex<Vec<TrackerEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let released: Arc<Mutex<Vec<TrackerEvent>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = pressed.clone();
        bus.subscribe(EventKind::Pressed, move |event| {
            sink.lock().unwrap().push(event.clone());
        });
        let sink = released.clone();
        bus.subscribe(EventKind::Released, move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        bus.publish(&TrackerEvent::Pressed {
            device: 0,
            button: 3,
        });

        assert_eq!(pressed.lock().unwrap().len(), 1);
        assert!(released.lock().unwrap().is_empty());
    }

    #[test]
    fn every_subscriber_of_a_kind_is_called() {
        let mut bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));

        for _ in 0..3 {
            let count = count.clone();
            bus.subscribe(EventKind::Disconnected, move |_| {
                *count.lock().unwrap() += 1;
            });
        }

        bus.publish(&TrackerEvent::Disconnected { device: 1 });
        assert_eq!(*count.lock().unwrap(), 3);
        assert_eq!(bus.subscriber_count(EventKind::Disconnected), 3);
    }

    #[tokio::test]
    async fn channel_subscription_forwards_events() {
        let mut bus = EventBus::new();
        let mut moves = bus.subscribe_channel(EventKind::Move, 8);

        bus.publish(&TrackerEvent::Move {
            device: 0,
            control: 0,
            value: MoveValue::Stick { x: 0.5, y: 0.0 },
        });

        let event = moves.recv().await.expect("event forwarded");
        assert_eq!(event.kind(), EventKind::Move);
    }
}
