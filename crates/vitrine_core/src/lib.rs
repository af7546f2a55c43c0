//! Vitrine Core
//!
//! This crate provides the foundational primitives the Vitrine widgets are
//! built on:
//!
//! - **Document Model**: an element arena with classes, attributes, measured
//!   layout boxes, image metadata and inline styles
//! - **Selectors**: a small CSS selector subset for widget discovery
//! - **Event Dispatch**: DOM-like events with bubbling and propagation control
//! - **State Machines**: table-driven FSMs for interaction states
//! - **Timers**: a deterministic timeout/interval queue driven by the host
//!
//! # Example
//!
//! ```rust
//! use vitrine_core::dom::Document;
//! use vitrine_core::geometry::Rect;
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let card = doc.create_element("div");
//! doc.add_class(card, "compare");
//! doc.append_child(root, card);
//! doc.set_rect(card, Rect::new(0.0, 0.0, 640.0, 360.0));
//!
//! let found = doc.query_selector(root, ".compare").unwrap();
//! assert_eq!(found, Some(card));
//! ```

pub mod dom;
pub mod events;
pub mod fsm;
pub mod geometry;
pub mod selector;
pub mod timer;

pub use dom::{
    aspect_ratio, ClipInset, DomError, Document, ImageInfo, Length, MediaState, Node, NodeId,
    ObjectFit, PointerEvents, Style,
};
pub use events::{event_types, Event, EventData, EventType};
pub use fsm::{StateId, StateMachine, StateMachineBuilder, Transition};
pub use geometry::{Point, Rect};
pub use selector::{Selector, SelectorError};
pub use timer::{TimerCallback, TimerHandle, TimerId, TimerQueue, MAX_CATCH_UP};
