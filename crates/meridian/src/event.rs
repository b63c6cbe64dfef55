//! Scene events and the listener bus.
//!
//! Every observable state change is announced as an [`Event`]. Listeners
//! subscribe per [`EventType`] and are called with the event and a shared
//! view of the [`Scene`] after the change has been applied. Because they
//! only ever receive shared references, listeners cannot edit the tree
//! while an event is being dispatched.
//!
//! A listener that returns an error does not stop the dispatch: the failure
//! is logged, counted in the returned [`Dispatch`], and the remaining
//! listeners still run.

use std::{collections::HashMap, fmt};

use log::{trace, warn};
use thiserror::Error;

use meridian_core::{geometry::Point, identifier::Id};

use crate::scene::Scene;

/// A state change in the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `child` was attached to `target`.
    ChildAdded { target: Id, child: Id },
    /// `child` was detached from `target`.
    ChildRemoved { target: Id, child: Id },
    VisibilityChanged { element: Id, visible: bool },
    NodeCollapseChanged { node: Id, collapsed: bool },
    /// The node received its first position.
    NodePositioned { node: Id },
    /// A layout run settled.
    GraphLayoutEnd { graph: Id },
    /// The pan offset or the scale changed.
    GraphPositionChanged { graph: Id },
    /// The host started or stopped dragging the canvas.
    GraphAreaDragging { graph: Id, is_dragging: bool },
    /// The host finished a rubber-band selection, in viewport coordinates.
    GraphAreaSelected {
        graph: Id,
        modifier: Option<String>,
        start: Point,
        end: Point,
    },
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::ChildAdded { .. } => EventType::ChildAdded,
            Event::ChildRemoved { .. } => EventType::ChildRemoved,
            Event::VisibilityChanged { .. } => EventType::VisibilityChanged,
            Event::NodeCollapseChanged { .. } => EventType::NodeCollapseChanged,
            Event::NodePositioned { .. } => EventType::NodePositioned,
            Event::GraphLayoutEnd { .. } => EventType::GraphLayoutEnd,
            Event::GraphPositionChanged { .. } => EventType::GraphPositionChanged,
            Event::GraphAreaDragging { .. } => EventType::GraphAreaDragging,
            Event::GraphAreaSelected { .. } => EventType::GraphAreaSelected,
        }
    }
}

/// Subscription key, one per [`Event`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    ChildAdded,
    ChildRemoved,
    VisibilityChanged,
    NodeCollapseChanged,
    NodePositioned,
    GraphLayoutEnd,
    GraphPositionChanged,
    GraphAreaDragging,
    GraphAreaSelected,
}

impl EventType {
    /// Returns the wire name of the event.
    pub fn name(self) -> &'static str {
        match self {
            EventType::ChildAdded => "element-add-child",
            EventType::ChildRemoved => "element-remove-child",
            EventType::VisibilityChanged => "element-visibility-change",
            EventType::NodeCollapseChanged => "node-collapse-change",
            EventType::NodePositioned => "node-positioned",
            EventType::GraphLayoutEnd => "graph-layout-end",
            EventType::GraphPositionChanged => "graph-position-change",
            EventType::GraphAreaDragging => "graph-area-dragging",
            EventType::GraphAreaSelected => "graph-area-selected",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error reported by a listener.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ListenerError(String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Handle returned by listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Outcome of delivering one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    delivered: usize,
    failed: usize,
}

impl Dispatch {
    /// Number of listeners that were called.
    pub fn delivered(self) -> usize {
        self.delivered
    }

    /// Number of listeners that returned an error.
    pub fn failed(self) -> usize {
        self.failed
    }

    pub fn is_clean(self) -> bool {
        self.failed == 0
    }
}

type Listener = Box<dyn FnMut(&Event, &Scene) -> Result<(), ListenerError>>;

/// Per-type listener registry.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventType, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. Listeners of one type run in registration order.
    pub fn add_listener<F>(&mut self, event_type: EventType, listener: F) -> ListenerId
    where
        F: FnMut(&Event, &Scene) -> Result<(), ListenerError> + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(event_type)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false when it was not registered for the type.
    pub fn remove_listener(&mut self, event_type: EventType, id: ListenerId) -> bool {
        let Some(listeners) = self.listeners.get_mut(&event_type) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.listeners.get(&event_type).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Delivers an event to every listener registered for its type.
    pub fn fire(&mut self, event: &Event, scene: &Scene) -> Dispatch {
        let event_type = event.event_type();
        let mut dispatch = Dispatch::default();
        let Some(listeners) = self.listeners.get_mut(&event_type) else {
            trace!(event = event_type.name(); "No listeners for event");
            return dispatch;
        };

        trace!(event = event_type.name(), listeners = listeners.len(); "Dispatching event");
        for (id, listener) in listeners.iter_mut() {
            dispatch.delivered += 1;
            if let Err(err) = listener(event, scene) {
                dispatch.failed += 1;
                warn!(event = event_type.name(), listener = id.0, err:%; "Event listener failed");
            }
        }
        dispatch
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(event_type, listeners)| (event_type.name(), listeners.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
