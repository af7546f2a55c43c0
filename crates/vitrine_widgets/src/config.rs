//! Widget configuration
//!
//! Every knob has a default matching the stock page markup, so an empty
//! TOML document is a valid configuration. The one exception is the video
//! list: markup carries no sources, so the host must supply
//! `carousel.sources` or the carousel stays inert.
//!
//! ```rust
//! use vitrine_widgets::config::WidgetsConfig;
//!
//! let config = WidgetsConfig::from_toml_str(
//!     r#"
//!     [compare]
//!     min_height_px = 320
//!     resume_delay_ms = 800
//!
//!     [hero]
//!     autoplay_ms = 6000
//!
//!     [carousel]
//!     sources = ["intro.mp4", "workshop.mp4", "results.mp4"]
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.carousel.sources.len(), 3);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vitrine_core::selector::{Selector, SelectorError};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML text could not be parsed
    #[error("failed to parse widget configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A selector field does not parse
    #[error("invalid selector in `{field}`: {source}")]
    Selector {
        /// Dotted field name, e.g. `compare.container_selector`
        field: &'static str,
        #[source]
        source: SelectorError,
    },

    /// A numeric field is out of range
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Configuration for all widgets on a page
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WidgetsConfig {
    pub compare: CompareConfig,
    pub hero: HeroSliderConfig,
    pub carousel: VideoCarouselConfig,
}

impl WidgetsConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: WidgetsConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check numeric ranges and that every selector parses
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compare.validate()?;
        self.hero.validate()?;
        self.carousel.validate()
    }
}

/// Before/after compare widget configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Selector for widget containers
    pub container_selector: String,
    /// Selector for the "before" image inside a container
    pub before_selector: String,
    /// Selector for the "after" image inside a container
    pub after_selector: String,
    /// Selector for the drag handle inside a container
    pub handle_selector: String,
    /// Selector for the instruction element holding the linked control
    pub instruction_selector: String,
    /// Selector for the linked range control inside the instruction element
    pub range_selector: String,
    /// Lower bound of the height cap in pixels
    pub min_height_px: f32,
    /// Viewports narrower than this use `narrow_viewport_fraction`
    pub narrow_breakpoint_px: f32,
    /// Share of the viewport height the widget may use on narrow viewports
    pub narrow_viewport_fraction: f32,
    /// Share of the viewport height the widget may use on wide viewports
    pub wide_viewport_fraction: f32,
    /// Delay before the hero slider resumes after an interaction ends
    pub resume_delay_ms: u64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            container_selector: ".compare".to_string(),
            before_selector: ".before".to_string(),
            after_selector: ".after".to_string(),
            handle_selector: ".cmp-handle".to_string(),
            instruction_selector: ".cmp-instruction".to_string(),
            range_selector: ".cmp-range".to_string(),
            min_height_px: 320.0,
            narrow_breakpoint_px: 820.0,
            narrow_viewport_fraction: 0.68,
            wide_viewport_fraction: 0.56,
            resume_delay_ms: 800,
        }
    }
}

impl CompareConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("compare.min_height_px", self.min_height_px)?;
        positive("compare.narrow_breakpoint_px", self.narrow_breakpoint_px)?;
        fraction(
            "compare.narrow_viewport_fraction",
            self.narrow_viewport_fraction,
        )?;
        fraction("compare.wide_viewport_fraction", self.wide_viewport_fraction)?;
        CompareSelectors::compile(self).map(|_| ())
    }
}

/// Compiled selectors of a [`CompareConfig`]
#[derive(Clone, Debug)]
pub struct CompareSelectors {
    pub container: Selector,
    pub before: Selector,
    pub after: Selector,
    pub handle: Selector,
    pub instruction: Selector,
    pub range: Selector,
}

impl CompareSelectors {
    pub fn compile(config: &CompareConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            container: selector("compare.container_selector", &config.container_selector)?,
            before: selector("compare.before_selector", &config.before_selector)?,
            after: selector("compare.after_selector", &config.after_selector)?,
            handle: selector("compare.handle_selector", &config.handle_selector)?,
            instruction: selector(
                "compare.instruction_selector",
                &config.instruction_selector,
            )?,
            range: selector("compare.range_selector", &config.range_selector)?,
        })
    }
}

/// Hero/services slider configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeroSliderConfig {
    pub root_selector: String,
    pub slide_selector: String,
    pub dots_selector: String,
    pub prev_selector: String,
    pub next_selector: String,
    /// Elements whose entrance animation restarts when their slide activates
    pub reveal_selector: String,
    /// Autoplay period
    pub autoplay_ms: u64,
    /// Minimum horizontal travel for a touch swipe
    pub swipe_threshold_px: f32,
    /// `aria-label` of generated dots; `{n}` is the 1-based slide number
    pub dot_label: String,
}

impl Default for HeroSliderConfig {
    fn default() -> Self {
        Self {
            root_selector: ".site-slider".to_string(),
            slide_selector: ".slide".to_string(),
            dots_selector: ".slider-dots".to_string(),
            prev_selector: ".slider-arrow.prev".to_string(),
            next_selector: ".slider-arrow.next".to_string(),
            reveal_selector: ".reveal".to_string(),
            autoplay_ms: 6000,
            swipe_threshold_px: 40.0,
            dot_label: "Go to slide {n}".to_string(),
        }
    }
}

impl HeroSliderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autoplay_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "hero.autoplay_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.swipe_threshold_px.is_nan() || self.swipe_threshold_px < 0.0 {
            return Err(ConfigError::Invalid {
                field: "hero.swipe_threshold_px",
                reason: format!("must be non-negative, got {}", self.swipe_threshold_px),
            });
        }
        HeroSelectors::compile(self).map(|_| ())
    }
}

/// Compiled selectors of a [`HeroSliderConfig`]
#[derive(Clone, Debug)]
pub struct HeroSelectors {
    pub root: Selector,
    pub slide: Selector,
    pub dots: Selector,
    pub prev: Selector,
    pub next: Selector,
    pub reveal: Selector,
}

impl HeroSelectors {
    pub fn compile(config: &HeroSliderConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            root: selector("hero.root_selector", &config.root_selector)?,
            slide: selector("hero.slide_selector", &config.slide_selector)?,
            dots: selector("hero.dots_selector", &config.dots_selector)?,
            prev: selector("hero.prev_selector", &config.prev_selector)?,
            next: selector("hero.next_selector", &config.next_selector)?,
            reveal: selector("hero.reveal_selector", &config.reveal_selector)?,
        })
    }
}

/// Video carousel configuration
///
/// `sources` defaults to empty; a carousel without sources is left inert.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VideoCarouselConfig {
    pub root_selector: String,
    pub video_selector: String,
    pub source_selector: String,
    pub prev_selector: String,
    pub next_selector: String,
    pub dot_selector: String,
    /// Video URLs, shown in order; must be supplied by the host
    pub sources: Vec<String>,
}

impl Default for VideoCarouselConfig {
    fn default() -> Self {
        Self {
            root_selector: "#videos".to_string(),
            video_selector: "#carouselVideo".to_string(),
            source_selector: "source".to_string(),
            prev_selector: ".carousel-control.prev".to_string(),
            next_selector: ".carousel-control.next".to_string(),
            dot_selector: ".carousel-indicators .dot".to_string(),
            sources: Vec::new(),
        }
    }
}

impl VideoCarouselConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        CarouselSelectors::compile(self).map(|_| ())
    }
}

/// Compiled selectors of a [`VideoCarouselConfig`]
#[derive(Clone, Debug)]
pub struct CarouselSelectors {
    pub root: Selector,
    pub video: Selector,
    pub source: Selector,
    pub prev: Selector,
    pub next: Selector,
    pub dot: Selector,
}

impl CarouselSelectors {
    pub fn compile(config: &VideoCarouselConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            root: selector("carousel.root_selector", &config.root_selector)?,
            video: selector("carousel.video_selector", &config.video_selector)?,
            source: selector("carousel.source_selector", &config.source_selector)?,
            prev: selector("carousel.prev_selector", &config.prev_selector)?,
            next: selector("carousel.next_selector", &config.next_selector)?,
            dot: selector("carousel.dot_selector", &config.dot_selector)?,
        })
    }
}

fn selector(field: &'static str, text: &str) -> Result<Selector, ConfigError> {
    Selector::parse(text).map_err(|source| ConfigError::Selector { field, source })
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

fn fraction(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be in (0, 1], got {}", value),
        })
    }
}
