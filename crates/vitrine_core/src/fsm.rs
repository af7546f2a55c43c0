//! Finite state machines for interaction states
//!
//! States and triggers are plain integers so widgets can declare them as
//! constants and feed [`event_types`](crate::events::event_types) straight
//! in as triggers.
//!
//! ```rust
//! use vitrine_core::events::event_types;
//! use vitrine_core::fsm::StateMachine;
//!
//! const IDLE: u32 = 0;
//! const PRESSED: u32 = 1;
//!
//! let mut fsm = StateMachine::builder(IDLE)
//!     .on(IDLE, event_types::POINTER_DOWN, PRESSED)
//!     .on(PRESSED, event_types::POINTER_UP, IDLE)
//!     .build();
//!
//! assert!(fsm.send(event_types::POINTER_DOWN));
//! assert_eq!(fsm.current_state(), PRESSED);
//! assert!(!fsm.send(event_types::POINTER_DOWN));
//! ```

use crate::events::EventType;

/// State identifier
pub type StateId = u32;

/// A single transition rule
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub event: EventType,
    pub to: StateId,
}

/// A table-driven state machine
#[derive(Clone, Debug)]
pub struct StateMachine {
    current: StateId,
    transitions: Vec<Transition>,
}

impl StateMachine {
    /// Start building a machine in `initial`
    pub fn builder(initial: StateId) -> StateMachineBuilder {
        StateMachineBuilder {
            initial,
            transitions: Vec::new(),
        }
    }

    /// Current state
    pub fn current_state(&self) -> StateId {
        self.current
    }

    /// Feed an event; returns whether a transition fired
    ///
    /// The first matching rule wins. Self-transitions count as fired.
    pub fn send(&mut self, event: EventType) -> bool {
        match self.find(event) {
            Some(to) => {
                tracing::trace!("fsm {} --{}--> {}", self.current, event, to);
                self.current = to;
                true
            }
            None => false,
        }
    }

    fn find(&self, event: EventType) -> Option<StateId> {
        self.transitions
            .iter()
            .find(|t| t.from == self.current && t.event == event)
            .map(|t| t.to)
    }
}

/// Builder for [`StateMachine`]
pub struct StateMachineBuilder {
    initial: StateId,
    transitions: Vec<Transition>,
}

impl StateMachineBuilder {
    /// Add a transition `from --event--> to`
    pub fn on(mut self, from: StateId, event: EventType, to: StateId) -> Self {
        self.transitions.push(Transition { from, event, to });
        self
    }

    pub fn build(self) -> StateMachine {
        StateMachine {
            current: self.initial,
            transitions: self.transitions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_types;

    const IDLE: StateId = 0;
    const DRAGGING: StateId = 1;

    fn drag_fsm() -> StateMachine {
        StateMachine::builder(IDLE)
            .on(IDLE, event_types::POINTER_DOWN, DRAGGING)
            .on(DRAGGING, event_types::POINTER_UP, IDLE)
            .on(DRAGGING, event_types::POINTER_CANCEL, IDLE)
            .build()
    }

    #[test]
    fn test_transitions() {
        let mut fsm = drag_fsm();
        assert!(!fsm.send(event_types::POINTER_UP));
        assert_eq!(fsm.current_state(), IDLE);

        assert!(fsm.send(event_types::POINTER_DOWN));
        assert_eq!(fsm.current_state(), DRAGGING);

        assert!(fsm.send(event_types::POINTER_CANCEL));
        assert_eq!(fsm.current_state(), IDLE);
    }
}
