//! Platform events

use crate::input::InputEvent;

/// Platform events
#[derive(Clone, Debug)]
pub enum Event {
    /// Window-related event
    Window(WindowEvent),
    /// Input event (mouse, touch)
    Input(InputEvent),
    /// Time passed on the host clock
    ///
    /// Hosts send this from their frame or timer callback so deferred
    /// widget work (autoplay, delayed resume) can run.
    Tick {
        /// Milliseconds elapsed since the previous tick
        elapsed_ms: u64,
    },
}

impl Event {
    /// Whether this is an input event
    pub fn is_input(&self) -> bool {
        matches!(self, Event::Input(_))
    }
}

/// Window events
#[derive(Clone, Debug, PartialEq)]
pub enum WindowEvent {
    /// Viewport was resized
    Resized {
        /// New width in CSS pixels
        width: f32,
        /// New height in CSS pixels
        height: f32,
    },
    /// Device orientation changed
    ///
    /// Carries the viewport size after rotation. Some hosts report this
    /// without a matching `Resized`, others send both.
    OrientationChanged {
        /// Width after rotation
        width: f32,
        /// Height after rotation
        height: f32,
    },
}

impl WindowEvent {
    /// Viewport size carried by the event
    pub fn size(&self) -> (f32, f32) {
        match self {
            WindowEvent::Resized { width, height }
            | WindowEvent::OrientationChanged { width, height } => (*width, *height),
        }
    }
}
