//! Viewport description

use crate::error::{PlatformError, Result};

/// Size of the visible page area in CSS pixels
///
/// Equivalent to the browser's `innerWidth`/`innerHeight`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Viewport width
    pub width: f32,
    /// Viewport height
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    /// Create a viewport, rejecting negative or non-finite sizes
    pub fn try_new(width: f32, height: f32) -> Result<Self> {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(PlatformError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    /// Current orientation
    pub fn orientation(&self) -> Orientation {
        if self.height > self.width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// Screen orientation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Taller than wide
    Portrait,
    /// Wider than tall (or square)
    Landscape,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_rejects_invalid_sizes() {
        assert!(Viewport::try_new(-1.0, 100.0).is_err());
        assert!(Viewport::try_new(100.0, f32::NAN).is_err());
        assert!(Viewport::try_new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_orientation() {
        let portrait = Viewport::try_new(390.0, 844.0).unwrap();
        assert_eq!(portrait.orientation(), Orientation::Portrait);
        assert_eq!(Viewport::default().orientation(), Orientation::Landscape);
    }
}
