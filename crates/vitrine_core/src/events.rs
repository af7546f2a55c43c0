//! Event types and dispatch-level event data
//!
//! Events are identified by a `u32` event type so state machines can use
//! them directly as transition triggers. The [`Event`] struct is what
//! widgets receive while an event travels from its target up through the
//! ancestors and finally to window-level listeners.

use crate::dom::NodeId;

/// Event type identifier
pub type EventType = u32;

/// Well-known event types
pub mod event_types {
    use super::EventType;

    pub const POINTER_DOWN: EventType = 1;
    pub const POINTER_MOVE: EventType = 2;
    pub const POINTER_UP: EventType = 3;
    pub const POINTER_CANCEL: EventType = 4;

    pub const MOUSE_DOWN: EventType = 10;
    pub const MOUSE_UP: EventType = 11;
    pub const MOUSE_ENTER: EventType = 12;
    pub const MOUSE_LEAVE: EventType = 13;

    pub const TOUCH_START: EventType = 20;
    pub const TOUCH_MOVE: EventType = 21;
    pub const TOUCH_END: EventType = 22;
    pub const TOUCH_CANCEL: EventType = 23;

    pub const CLICK: EventType = 30;

    /// Value of a form control changed while interacting
    pub const INPUT: EventType = 40;
    /// Value of a form control was committed
    pub const CHANGE: EventType = 41;

    /// Image finished loading
    pub const LOAD: EventType = 50;

    /// DOM name of an event type, for logging
    pub fn name(event_type: EventType) -> &'static str {
        match event_type {
            POINTER_DOWN => "pointerdown",
            POINTER_MOVE => "pointermove",
            POINTER_UP => "pointerup",
            POINTER_CANCEL => "pointercancel",
            MOUSE_DOWN => "mousedown",
            MOUSE_UP => "mouseup",
            MOUSE_ENTER => "mouseenter",
            MOUSE_LEAVE => "mouseleave",
            TOUCH_START => "touchstart",
            TOUCH_MOVE => "touchmove",
            TOUCH_END => "touchend",
            TOUCH_CANCEL => "touchcancel",
            CLICK => "click",
            INPUT => "input",
            CHANGE => "change",
            LOAD => "load",
            _ => "unknown",
        }
    }

    /// Whether events of this type travel up through the ancestors
    pub fn bubbles(event_type: EventType) -> bool {
        !matches!(event_type, MOUSE_ENTER | MOUSE_LEAVE | LOAD)
    }
}

/// Event payload
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    /// No payload
    None,
    /// Pointer, mouse and touch events
    Pointer {
        /// X in viewport coordinates
        client_x: f32,
        /// Y in viewport coordinates
        client_y: f32,
        /// Pointer identifier (mouse and each touch differ)
        pointer_id: u64,
        /// DOM button index (0 = primary)
        button: u16,
    },
}

/// A dispatched event
#[derive(Clone, Debug)]
pub struct Event {
    /// Event type (see [`event_types`])
    pub event_type: EventType,
    /// Element the event was dispatched to
    pub target: NodeId,
    /// Payload
    pub data: EventData,
    /// Host time in milliseconds
    pub timestamp: u64,
    /// Set by `stop_propagation`; ancestors and window listeners are skipped
    pub propagation_stopped: bool,
}

impl Event {
    /// Create an event without payload
    pub fn new(event_type: EventType, target: NodeId) -> Self {
        Self {
            event_type,
            target,
            data: EventData::None,
            timestamp: 0,
            propagation_stopped: false,
        }
    }

    /// Create a pointer-like event at viewport position `(x, y)`
    pub fn pointer(event_type: EventType, target: NodeId, x: f32, y: f32, pointer_id: u64) -> Self {
        Self {
            data: EventData::Pointer {
                client_x: x,
                client_y: y,
                pointer_id,
                button: 0,
            },
            ..Self::new(event_type, target)
        }
    }

    /// Set the timestamp
    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Stop the event from reaching ancestors and window listeners
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn client_x(&self) -> Option<f32> {
        match self.data {
            EventData::Pointer { client_x, .. } => Some(client_x),
            EventData::None => None,
        }
    }

    pub fn pointer_id(&self) -> Option<u64> {
        match self.data {
            EventData::Pointer { pointer_id, .. } => Some(pointer_id),
            EventData::None => None,
        }
    }

    /// Event type name, for logging
    pub fn name(&self) -> &'static str {
        event_types::name(self.event_type)
    }
}
