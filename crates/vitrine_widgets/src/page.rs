//! Page: widget discovery and event routing
//!
//! Owns the document, the viewport, the timer queue and every widget found
//! in the document. Hosts feed it platform events; it turns them into
//! DOM-like events and routes them to widgets.
//!
//! # Architecture
//!
//! ```text
//! Platform input (mouse pressed, touch moved, ...)
//!     ↓
//! Page (hit testing, pointer capture, hover tracking, click synthesis)
//!     ↓
//! Event dispatch: target → ancestors (bubbling, stoppable) → window
//!     ↓
//! CompareWidget / HeroSlider / VideoCarousel handlers
//! ```
//!
//! Window and layout notifications bypass dispatch and go straight to the
//! compare widgets' sizing.

use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};
use vitrine_core::dom::{Document, ImageInfo, NodeId};
use vitrine_core::events::{event_types, Event, EventData, EventType};
use vitrine_core::geometry::{Point, Rect};
use vitrine_core::timer::TimerHandle;
use vitrine_platform::{
    Event as PlatformEvent, InputEvent, MouseButton, MouseEvent, PlatformError, TouchEvent,
    Viewport, WindowEvent, MOUSE_POINTER_ID,
};

use crate::compare::{compare, CompareElements, CompareWidget};
use crate::config::{
    CarouselSelectors, CompareSelectors, ConfigError, HeroSelectors, WidgetsConfig,
};
use crate::hero_slider::HeroSlider;
use crate::video_carousel::VideoCarousel;

/// Who handles events on a node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Listener {
    Compare(usize),
    Hero,
    Carousel,
}

/// A touch between start and end
#[derive(Clone, Copy, Debug)]
struct ActiveTouch {
    pointer_id: u64,
    /// Touch events keep going to the element the touch started on
    target: NodeId,
    moved: bool,
}

/// A document with its widgets mounted
pub struct Page {
    document: Document,
    viewport: Viewport,
    timers: TimerHandle,

    hero: Option<HeroSlider>,
    compares: Vec<CompareWidget>,
    carousel: Option<VideoCarousel>,
    listeners: FxHashMap<NodeId, SmallVec<[Listener; 2]>>,

    /// Path under the mouse, deepest first
    hovered: SmallVec<[NodeId; 16]>,
    /// Element where the mouse button went down (for click synthesis)
    pressed_target: Option<NodeId>,
    touches: SmallVec<[ActiveTouch; 2]>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("viewport", &self.viewport)
            .field("nodes", &self.document.len())
            .field("hero", &self.hero.is_some())
            .field("compares", &self.compares.len())
            .field("carousel", &self.carousel.is_some())
            .finish()
    }
}

impl Page {
    /// Discover and initialize every widget in `document`
    ///
    /// The hero slider is mounted first so its control can be handed to
    /// the compare widgets. Widgets with missing parts are skipped.
    pub fn mount(
        mut document: Document,
        viewport: Viewport,
        config: &WidgetsConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let compare_selectors = CompareSelectors::compile(&config.compare)?;
        let hero_selectors = HeroSelectors::compile(&config.hero)?;
        let carousel_selectors = CarouselSelectors::compile(&config.carousel)?;

        let timers = TimerHandle::new();
        let hero = HeroSlider::discover(&mut document, &hero_selectors, &config.hero, timers.clone());
        let controller = hero.as_ref().map(HeroSlider::controller);

        let containers = document.select_all(document.root(), &compare_selectors.container);
        let mut compares = Vec::with_capacity(containers.len());
        for container in containers {
            let Some(elements) = CompareElements::discover(&document, container, &compare_selectors)
            else {
                continue;
            };
            let widget = compare(elements)
                .config(&config.compare)
                .autoplay_opt(controller.clone(), timers.clone())
                .build(&mut document, &viewport);
            compares.push(widget);
        }

        let carousel = VideoCarousel::discover(&mut document, &carousel_selectors, &config.carousel);

        tracing::debug!(
            "page mounted: hero={} compares={} carousel={}",
            hero.is_some(),
            compares.len(),
            carousel.is_some()
        );

        let mut page = Self {
            document,
            viewport,
            timers,
            hero,
            compares,
            carousel,
            listeners: FxHashMap::default(),
            hovered: SmallVec::new(),
            pressed_target: None,
            touches: SmallVec::new(),
        };
        page.register_listeners();
        Ok(page)
    }

    fn register_listeners(&mut self) {
        let mut listeners: FxHashMap<NodeId, SmallVec<[Listener; 2]>> = FxHashMap::default();
        // Registration order is handler order on a shared node
        if let Some(hero) = &self.hero {
            for node in hero.listened_nodes() {
                listeners.entry(node).or_default().push(Listener::Hero);
            }
        }
        for (index, widget) in self.compares.iter().enumerate() {
            for node in widget.listened_nodes() {
                listeners.entry(node).or_default().push(Listener::Compare(index));
            }
        }
        if let Some(carousel) = &self.carousel {
            for node in carousel.listened_nodes() {
                listeners.entry(node).or_default().push(Listener::Carousel);
            }
        }
        self.listeners = listeners;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable document access for hosts building or patching markup
    ///
    /// Layout changes should go through [`set_layout`](Self::set_layout) so
    /// widgets are told about them.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn timers(&self) -> &TimerHandle {
        &self.timers
    }

    pub fn hero(&self) -> Option<&HeroSlider> {
        self.hero.as_ref()
    }

    pub fn compares(&self) -> &[CompareWidget] {
        &self.compares
    }

    /// The compare widget rooted at `container`
    pub fn compare(&self, container: NodeId) -> Option<&CompareWidget> {
        self.compares.iter().find(|w| w.container() == container)
    }

    /// Set a compare widget's reveal directly
    pub fn set_reveal(&mut self, container: NodeId, value: f32) -> Option<f32> {
        let widget = self.compares.iter_mut().find(|w| w.container() == container)?;
        Some(widget.set_reveal(&mut self.document, value))
    }

    pub fn carousel(&self) -> Option<&VideoCarousel> {
        self.carousel.as_ref()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Dispatch `event` to its target, its ancestors and then window-level
    /// listeners
    ///
    /// Non-bubbling events only reach the target. Returns the event after
    /// dispatch so callers can inspect `propagation_stopped`.
    pub fn dispatch(&mut self, mut event: Event) -> Event {
        let bubbles = event_types::bubbles(event.event_type);
        let path: SmallVec<[NodeId; 16]> = if bubbles {
            self.document.composed_path(event.target)
        } else {
            smallvec![event.target]
        };

        tracing::trace!("dispatch {} to {:?}", event.name(), event.target);

        for node in path {
            self.invoke(node, &mut event);
            if event.propagation_stopped {
                return event;
            }
        }

        if bubbles {
            for widget in &mut self.compares {
                widget.handle_window_event(&mut self.document, &event);
            }
        }
        event
    }

    fn invoke(&mut self, node: NodeId, event: &mut Event) {
        let Some(listeners) = self.listeners.get(&node).cloned() else {
            return;
        };
        // Every listener on a node runs even if one stops propagation
        for listener in listeners {
            match listener {
                Listener::Compare(index) => {
                    if let Some(widget) = self.compares.get_mut(index) {
                        widget.handle_event(&mut self.document, &self.viewport, node, event);
                    }
                }
                Listener::Hero => {
                    if let Some(hero) = &mut self.hero {
                        hero.handle_event(&mut self.document, node, event);
                    }
                }
                Listener::Carousel => {
                    if let Some(carousel) = &mut self.carousel {
                        carousel.handle_event(&mut self.document, node, event);
                    }
                }
            }
        }
    }

    fn pointer_event(
        &self,
        event_type: EventType,
        target: NodeId,
        x: f32,
        y: f32,
        pointer_id: u64,
        button: u16,
    ) -> Event {
        Event {
            data: EventData::Pointer {
                client_x: x,
                client_y: y,
                pointer_id,
                button,
            },
            ..Event::new(event_type, target).at(self.timers.now())
        }
    }

    /// Capturing element for `pointer_id`, else the element under the point
    fn pointer_target(&self, pointer_id: u64, x: f32, y: f32) -> NodeId {
        self.document
            .pointer_capture(pointer_id)
            .unwrap_or_else(|| self.document.hit_test(Point::new(x, y)))
    }

    /// Deepest element containing both `a` and `b`
    fn common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        self.document
            .composed_path(a)
            .into_iter()
            .find(|n| self.document.contains(*n, b))
            .unwrap_or_else(|| self.document.root())
    }

    // =========================================================================
    // Platform input
    // =========================================================================

    /// Route one platform event
    pub fn handle_platform_event(&mut self, event: &PlatformEvent) -> Result<(), PlatformError> {
        match event {
            PlatformEvent::Input(input) => self.handle_input(input),
            PlatformEvent::Window(WindowEvent::Resized { width, height }) => {
                self.resize_viewport(*width, *height)
            }
            PlatformEvent::Window(WindowEvent::OrientationChanged { width, height }) => {
                self.change_orientation(*width, *height)
            }
            PlatformEvent::Tick { elapsed_ms } => {
                self.advance(*elapsed_ms);
                Ok(())
            }
        }
    }

    /// Route mouse or touch input
    pub fn handle_input(&mut self, input: &InputEvent) -> Result<(), PlatformError> {
        if let Some((x, y)) = input.position() {
            if !x.is_finite() || !y.is_finite() {
                return Err(PlatformError::InvalidCoordinates { x, y });
            }
        }

        match input {
            InputEvent::Mouse(MouseEvent::Moved { x, y }) => self.on_mouse_move(*x, *y),
            InputEvent::Mouse(MouseEvent::ButtonPressed { button, x, y }) => {
                self.on_mouse_down(*x, *y, *button)
            }
            InputEvent::Mouse(MouseEvent::ButtonReleased { button, x, y }) => {
                self.on_mouse_up(*x, *y, *button)
            }
            InputEvent::Mouse(MouseEvent::Left) => self.on_mouse_leave(),
            InputEvent::Touch(touch) => self.on_touch(touch),
        }
        Ok(())
    }

    // =========================================================================
    // Mouse Events
    // =========================================================================

    /// Emits `mouseenter`/`mouseleave` for the hover change and a
    /// `pointermove`
    pub fn on_mouse_move(&mut self, x: f32, y: f32) {
        let hit = self.document.hit_test(Point::new(x, y));
        self.update_hover(Some(hit));
        let target = self.pointer_target(MOUSE_POINTER_ID, x, y);
        let event = self.pointer_event(event_types::POINTER_MOVE, target, x, y, MOUSE_POINTER_ID, 0);
        self.dispatch(event);
    }

    /// Emits `pointerdown` then `mousedown` at the element under the mouse
    pub fn on_mouse_down(&mut self, x: f32, y: f32, button: MouseButton) {
        let target = self.document.hit_test(Point::new(x, y));
        self.update_hover(Some(target));
        self.document.pointer_pressed(MOUSE_POINTER_ID);
        self.pressed_target = Some(target);

        let button = button.index();
        for ty in [event_types::POINTER_DOWN, event_types::MOUSE_DOWN] {
            let event = self.pointer_event(ty, target, x, y, MOUSE_POINTER_ID, button);
            self.dispatch(event);
        }
    }

    /// Emits `pointerup` (to the capturing element, if any), `mouseup`,
    /// then `click` at the common ancestor of press and release
    pub fn on_mouse_up(&mut self, x: f32, y: f32, button: MouseButton) {
        let button = button.index();
        let target = self.pointer_target(MOUSE_POINTER_ID, x, y);
        let event = self.pointer_event(event_types::POINTER_UP, target, x, y, MOUSE_POINTER_ID, button);
        self.dispatch(event);
        self.document.pointer_released(MOUSE_POINTER_ID);

        let hit = self.document.hit_test(Point::new(x, y));
        let event = self.pointer_event(event_types::MOUSE_UP, hit, x, y, MOUSE_POINTER_ID, button);
        self.dispatch(event);

        if let Some(pressed) = self.pressed_target.take() {
            if self.document.exists(pressed) {
                let target = self.common_ancestor(pressed, hit);
                let event = self.pointer_event(event_types::CLICK, target, x, y, MOUSE_POINTER_ID, button);
                self.dispatch(event);
            }
        }
    }

    /// Emits `mouseleave` for everything hovered
    pub fn on_mouse_leave(&mut self) {
        self.update_hover(None);
    }

    fn update_hover(&mut self, hit: Option<NodeId>) {
        let path = hit
            .map(|node| self.document.composed_path(node))
            .unwrap_or_default();

        let left: SmallVec<[NodeId; 16]> = self
            .hovered
            .iter()
            .copied()
            .filter(|n| !path.contains(n))
            .collect();
        let entered: SmallVec<[NodeId; 16]> = path
            .iter()
            .rev()
            .copied()
            .filter(|n| !self.hovered.contains(n))
            .collect();
        self.hovered = path;

        // Leaves deepest first, enters outermost first
        for node in left {
            if self.document.exists(node) {
                let event = Event::new(event_types::MOUSE_LEAVE, node).at(self.timers.now());
                self.dispatch(event);
            }
        }
        for node in entered {
            let event = Event::new(event_types::MOUSE_ENTER, node).at(self.timers.now());
            self.dispatch(event);
        }
    }

    // =========================================================================
    // Touch Events
    // =========================================================================

    fn on_touch(&mut self, touch: &TouchEvent) {
        let pointer_id = touch.pointer_id();
        match *touch {
            TouchEvent::Started { x, y, .. } => {
                let target = self.document.hit_test(Point::new(x, y));
                self.document.pointer_pressed(pointer_id);
                self.touches.retain(|t| t.pointer_id != pointer_id);
                self.touches.push(ActiveTouch {
                    pointer_id,
                    target,
                    moved: false,
                });
                for ty in [event_types::POINTER_DOWN, event_types::TOUCH_START] {
                    let event = self.pointer_event(ty, target, x, y, pointer_id, 0);
                    self.dispatch(event);
                }
            }
            TouchEvent::Moved { x, y, .. } => {
                let target = self.pointer_target(pointer_id, x, y);
                let event = self.pointer_event(event_types::POINTER_MOVE, target, x, y, pointer_id, 0);
                self.dispatch(event);

                let Some(touch) = self.touches.iter_mut().find(|t| t.pointer_id == pointer_id)
                else {
                    return;
                };
                touch.moved = true;
                let start = touch.target;
                let event = self.pointer_event(event_types::TOUCH_MOVE, start, x, y, pointer_id, 0);
                self.dispatch(event);
            }
            TouchEvent::Ended { x, y, .. } => {
                let target = self.pointer_target(pointer_id, x, y);
                let event = self.pointer_event(event_types::POINTER_UP, target, x, y, pointer_id, 0);
                self.dispatch(event);
                self.document.pointer_released(pointer_id);

                let Some(touch) = self.take_touch(pointer_id) else {
                    return;
                };
                if !self.document.exists(touch.target) {
                    return;
                }
                let event = self.pointer_event(event_types::TOUCH_END, touch.target, x, y, pointer_id, 0);
                self.dispatch(event);

                // A tap also clicks; a touch that moved does not
                if !touch.moved {
                    let hit = self.document.hit_test(Point::new(x, y));
                    let target = self.common_ancestor(touch.target, hit);
                    let event = self.pointer_event(event_types::CLICK, target, x, y, pointer_id, 0);
                    self.dispatch(event);
                }
            }
            TouchEvent::Cancelled { .. } => {
                let touch = self.take_touch(pointer_id);
                let target = self
                    .document
                    .pointer_capture(pointer_id)
                    .or(touch.map(|t| t.target))
                    .unwrap_or_else(|| self.document.root());
                let mut event = Event::new(event_types::POINTER_CANCEL, target).at(self.timers.now());
                event.data = EventData::Pointer {
                    client_x: 0.0,
                    client_y: 0.0,
                    pointer_id,
                    button: 0,
                };
                self.dispatch(event);
                self.document.pointer_released(pointer_id);

                if let Some(touch) = touch.filter(|t| self.document.exists(t.target)) {
                    let event = Event::new(event_types::TOUCH_CANCEL, touch.target).at(self.timers.now());
                    self.dispatch(event);
                }
            }
        }
    }

    fn take_touch(&mut self, pointer_id: u64) -> Option<ActiveTouch> {
        let index = self.touches.iter().position(|t| t.pointer_id == pointer_id)?;
        Some(self.touches.remove(index))
    }

    // =========================================================================
    // Layout, viewport, images, time
    // =========================================================================

    /// Record a new layout rectangle for `node`
    ///
    /// Compare widgets observing `node` are resized when its size changed.
    pub fn set_layout(&mut self, node: NodeId, rect: Rect) {
        let Some(previous) = self.document.set_rect(node, rect) else {
            return;
        };
        if previous.same_size(&rect) {
            return;
        }
        for widget in &mut self.compares {
            if widget.observed_nodes().contains(&node) {
                widget.resize(&mut self.document, &self.viewport);
            }
        }
    }

    /// The window was resized
    pub fn resize_viewport(&mut self, width: f32, height: f32) -> Result<(), PlatformError> {
        self.viewport = Viewport::try_new(width, height)?;
        tracing::debug!("viewport resized to {}x{}", width, height);
        self.resize_all();
        Ok(())
    }

    /// The device was rotated
    pub fn change_orientation(&mut self, width: f32, height: f32) -> Result<(), PlatformError> {
        self.viewport = Viewport::try_new(width, height)?;
        tracing::debug!(
            "orientation changed to {:?} ({}x{})",
            self.viewport.orientation(),
            width,
            height
        );
        self.resize_all();
        Ok(())
    }

    fn resize_all(&mut self) {
        for widget in &mut self.compares {
            widget.resize(&mut self.document, &self.viewport);
        }
    }

    /// An image finished loading with the given natural size
    pub fn image_loaded(&mut self, node: NodeId, natural_width: f32, natural_height: f32) {
        if !self.document.exists(node) {
            return;
        }
        self.document
            .set_image(node, ImageInfo::loaded(natural_width, natural_height));
        let event = Event::new(event_types::LOAD, node).at(self.timers.now());
        self.dispatch(event);
    }

    /// Move time forward, running due timers; returns how many ran
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        self.timers.advance(elapsed_ms, &mut self.document)
    }
}
