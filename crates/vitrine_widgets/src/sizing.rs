//! Compare widget geometry
//!
//! Pure functions for the reveal percentage and the widget's bounding box.
//! The widget fits the available width at the image's aspect ratio unless
//! that would exceed a height cap derived from the viewport; past the cap
//! it shrinks horizontally and centers itself.

use vitrine_core::dom::{Document, Length, NodeId};
use vitrine_core::geometry::Rect;
use vitrine_platform::Viewport;

use crate::config::CompareConfig;

/// Clamp a reveal value into [0, 100]; NaN becomes 0
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Horizontal position of `client_x` inside `rect`, as a clamped percentage
///
/// `None` when the rectangle has no usable width.
pub fn reveal_percent(rect: Rect, client_x: f32) -> Option<f32> {
    if rect.width.is_nan() || rect.width <= 0.0 {
        return None;
    }
    Some(clamp_percent((client_x - rect.left()) / rect.width * 100.0))
}

/// Height cap parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizingPolicy {
    pub min_height: f32,
    pub narrow_breakpoint: f32,
    pub narrow_fraction: f32,
    pub wide_fraction: f32,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self::from_config(&CompareConfig::default())
    }
}

impl SizingPolicy {
    pub fn from_config(config: &CompareConfig) -> Self {
        Self {
            min_height: config.min_height_px,
            narrow_breakpoint: config.narrow_breakpoint_px,
            narrow_fraction: config.narrow_viewport_fraction,
            wide_fraction: config.wide_viewport_fraction,
        }
    }

    /// Share of the viewport height available on this viewport
    pub fn viewport_fraction(&self, viewport: &Viewport) -> f32 {
        if viewport.width < self.narrow_breakpoint {
            self.narrow_fraction
        } else {
            self.wide_fraction
        }
    }

    /// Height cap: `max(min_height, floor(viewport height * fraction))`
    pub fn max_height(&self, viewport: &Viewport) -> f32 {
        let cap = (viewport.height * self.viewport_fraction(viewport)).floor();
        self.min_height.max(cap)
    }
}

/// Inline size written to the container
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSize {
    /// `None` leaves the width to the stylesheet
    pub width: Option<f32>,
    pub height: f32,
    pub margin_left: Option<Length>,
    pub margin_right: Option<Length>,
}

impl BoundingSize {
    /// Whether the box is narrower than its container and centered
    pub fn is_centered(&self) -> bool {
        self.margin_left == Some(Length::Auto) && self.margin_right == Some(Length::Auto)
    }

    /// Write width, height and horizontal margins to `node`'s inline style
    pub fn apply(&self, doc: &mut Document, node: NodeId) {
        doc.update_style(node, |style| {
            style.width = self.width.map(Length::Px);
            style.height = Some(Length::Px(self.height));
            style.margin_left = self.margin_left;
            style.margin_right = self.margin_right;
        });
    }
}

/// Box for `available_width` at `ratio` (height / width), capped at
/// `max_height`
pub fn compute_bounding_size(available_width: f32, ratio: f32, max_height: f32) -> BoundingSize {
    let ideal = available_width * ratio;
    if ideal <= max_height {
        BoundingSize {
            width: None,
            height: ideal,
            margin_left: None,
            margin_right: None,
        }
    } else {
        BoundingSize {
            width: Some((max_height / ratio).floor()),
            height: max_height,
            margin_left: Some(Length::Auto),
            margin_right: Some(Length::Auto),
        }
    }
}

/// Nearest ancestor of `node` with a non-zero measured width
///
/// Falls back to the document root.
pub fn measured_ancestor(doc: &Document, node: NodeId) -> NodeId {
    doc.ancestors(node)
        .find(|a| doc.client_width(*a) > 0.0)
        .unwrap_or_else(|| doc.root())
}

/// Width the widget may occupy, never below 1
pub fn available_width(doc: &Document, node: NodeId) -> f32 {
    doc.client_width(measured_ancestor(doc, node)).max(1.0)
}
