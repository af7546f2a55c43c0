//! Vitrine Platform Abstraction Layer
//!
//! This crate provides the host-agnostic types the widgets consume from
//! whatever embeds them: the viewport, raw pointer/mouse/touch input, and
//! window-level notifications.
//!
//! # Architecture
//!
//! Hosts translate their native events into [`Event`] values and feed them
//! to a `vitrine_widgets::Page`:
//!
//! - [`Event::Input`] - mouse and touch input in viewport coordinates
//! - [`Event::Window`] - viewport resize and orientation changes
//! - [`Event::Tick`] - elapsed time, used to advance deferred calls
//!
//! # Example
//!
//! ```
//! use vitrine_platform::*;
//!
//! let viewport = Viewport::try_new(1280.0, 800.0).unwrap();
//! assert_eq!(viewport.orientation(), Orientation::Landscape);
//!
//! let event = Event::Input(InputEvent::Mouse(MouseEvent::ButtonPressed {
//!     button: MouseButton::Left,
//!     x: 120.0,
//!     y: 40.0,
//! }));
//! assert!(event.is_input());
//! ```

mod error;
mod event;
mod input;
mod window;

// Re-export all public types
pub use error::{PlatformError, Result};
pub use event::{Event, WindowEvent};
pub use input::{InputEvent, MouseButton, MouseEvent, TouchEvent, MOUSE_POINTER_ID};
pub use window::{Orientation, Viewport};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{PlatformError, Result};
    pub use crate::event::{Event, WindowEvent};
    pub use crate::input::{InputEvent, MouseButton, MouseEvent, TouchEvent};
    pub use crate::window::{Orientation, Viewport};
}
