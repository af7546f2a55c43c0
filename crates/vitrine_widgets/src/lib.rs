//! Vitrine Widget Library
//!
//! Interactive page widgets running on the Vitrine document model.
//!
//! # Architecture
//!
//! The library is built around three widgets and one orchestrator:
//!
//! 1. **CompareWidget**: a before/after image comparison. The reveal
//!    percentage follows pointer drags and a linked range control; the
//!    container is sized to the image's aspect ratio under a viewport-based
//!    height cap.
//!
//! 2. **HeroSlider**: an autoplaying slide rotator with dots, arrows,
//!    swipe and hover pause. Its [`HeroControl`] is the
//!    [`AutoplayController`] compare widgets pause while in use.
//!
//! 3. **VideoCarousel**: cycles one video element through a list of
//!    sources.
//!
//! [`Page`] discovers the widgets in a document, routes platform input to
//! them with DOM-like bubbling, and forwards layout, viewport and timer
//! updates.
//!
//! # Example
//!
//! ```rust
//! use vitrine_core::dom::Document;
//! use vitrine_core::geometry::Rect;
//! use vitrine_platform::Viewport;
//! use vitrine_widgets::prelude::*;
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let container = doc.create_element("div");
//! doc.add_class(container, "compare");
//! doc.append_child(root, container);
//! for class in ["before", "after", "cmp-handle"] {
//!     let part = doc.create_element(if class == "cmp-handle" { "div" } else { "img" });
//!     doc.add_class(part, class);
//!     doc.append_child(container, part);
//! }
//! doc.set_rect(container, Rect::new(0.0, 0.0, 400.0, 300.0));
//!
//! let config = WidgetsConfig::from_toml_str("[compare]\nresume_delay_ms = 500\n").unwrap();
//! let mut page = Page::mount(doc, Viewport::default(), &config).unwrap();
//! assert_eq!(page.compares().len(), 1);
//! assert_eq!(page.set_reveal(container, 64.0), Some(64.0));
//! ```

pub mod autoplay;
pub mod compare;
pub mod config;
pub mod hero_slider;
pub mod page;
pub mod sizing;
pub mod video_carousel;

pub use autoplay::{AutoplayController, AutoplayLink};
pub use compare::{compare, CompareElements, CompareWidget, CompareWidgetBuilder};
pub use config::{
    CarouselSelectors, CompareConfig, CompareSelectors, ConfigError, HeroSelectors,
    HeroSliderConfig, VideoCarouselConfig, WidgetsConfig,
};
pub use hero_slider::{HeroControl, HeroSlider};
pub use page::Page;
pub use sizing::{BoundingSize, SizingPolicy};
pub use video_carousel::VideoCarousel;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::autoplay::AutoplayController;
    pub use crate::compare::{compare, CompareElements, CompareWidget};
    pub use crate::config::{ConfigError, WidgetsConfig};
    pub use crate::hero_slider::{HeroControl, HeroSlider};
    pub use crate::page::Page;
    pub use crate::video_carousel::VideoCarousel;
}
