//! Hero/services slider
//!
//! Rotates through `.slide` elements on a fixed autoplay interval. Users can
//! jump with generated dot buttons, step with the arrows or swipe; any of
//! those restarts the autoplay period. Hovering the slider stops autoplay.
//!
//! Autoplay can also be paused from outside through [`HeroControl`], which
//! implements [`AutoplayController`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use smallvec::SmallVec;
use vitrine_core::dom::{Document, NodeId, PointerEvents};
use vitrine_core::events::{event_types, Event};
use vitrine_core::selector::Selector;
use vitrine_core::timer::{TimerHandle, TimerId};

use crate::autoplay::AutoplayController;
use crate::config::{HeroSelectors, HeroSliderConfig};

const ACTIVE_SLIDE_CLASS: &str = "is-active";
const ACTIVE_DOT_CLASS: &str = "active";
const REVEAL_IN_CLASS: &str = "in";

/// Slider state shared with the autoplay timer
#[derive(Debug)]
struct HeroState {
    slides: Vec<NodeId>,
    dots: Vec<NodeId>,
    reveal: Selector,
    current: usize,
    timer: Option<TimerId>,
    autoplay_ms: u64,
    /// Number of entrance animations restarted so far
    reveal_restarts: u64,
}

impl HeroState {
    fn activate(&mut self, doc: &mut Document, index: usize) {
        let Some(&active) = self.slides.get(index) else {
            return;
        };
        for &slide in &self.slides {
            doc.remove_class(slide, ACTIVE_SLIDE_CLASS);
            doc.update_style(slide, |s| s.pointer_events = Some(PointerEvents::None));
        }
        doc.add_class(active, ACTIVE_SLIDE_CLASS);
        doc.update_style(active, |s| s.pointer_events = Some(PointerEvents::Auto));

        for &dot in &self.dots {
            doc.remove_class(dot, ACTIVE_DOT_CLASS);
        }
        if let Some(&dot) = self.dots.get(index) {
            doc.add_class(dot, ACTIVE_DOT_CLASS);
        }

        for el in doc.select_all(active, &self.reveal) {
            doc.remove_class(el, REVEAL_IN_CLASS);
            doc.add_class(el, REVEAL_IN_CLASS);
            self.reveal_restarts += 1;
        }

        self.current = index;
        tracing::trace!("hero slide {} active", index);
    }

    /// Activate slide `n`, wrapping around in both directions
    fn go(&mut self, doc: &mut Document, n: isize) {
        let len = self.slides.len() as isize;
        if len == 0 {
            return;
        }
        self.activate(doc, n.rem_euclid(len) as usize);
    }

    fn step(&mut self, doc: &mut Document, delta: isize) {
        let target = self.current as isize + delta;
        self.go(doc, target);
    }
}

fn lock(state: &Mutex<HeroState>) -> MutexGuard<'_, HeroState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared handle to a slider's rotation and autoplay
#[derive(Clone)]
pub struct HeroControl {
    state: Arc<Mutex<HeroState>>,
    timers: TimerHandle,
}

impl std::fmt::Debug for HeroControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("HeroControl")
            .field("current", &state.current)
            .field("slides", &state.slides.len())
            .field("running", &state.timer.is_some())
            .finish()
    }
}

impl HeroControl {
    /// (Re)start autoplay: stop, then advance every autoplay period
    pub fn start(&self) {
        let mut state = lock(&self.state);
        if let Some(id) = state.timer.take() {
            self.timers.clear(id);
        }
        if state.slides.is_empty() {
            return;
        }
        let shared = Arc::clone(&self.state);
        let id = self.timers.set_interval(state.autoplay_ms, move |doc| {
            lock(&shared).step(doc, 1);
        });
        state.timer = Some(id);
        tracing::trace!("hero autoplay started");
    }

    /// Stop autoplay; no-op when stopped
    pub fn stop(&self) {
        let timer = lock(&self.state).timer.take();
        if let Some(id) = timer {
            self.timers.clear(id);
            tracing::trace!("hero autoplay stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).timer.is_some()
    }

    /// Index of the active slide
    pub fn current(&self) -> usize {
        lock(&self.state).current
    }

    /// Jump to slide `n` (wrapping); user navigation restarts autoplay
    pub fn go(&self, doc: &mut Document, n: isize, user: bool) {
        lock(&self.state).go(doc, n);
        if user {
            self.start();
        }
    }

    pub fn next(&self, doc: &mut Document, user: bool) {
        let n = self.current() as isize + 1;
        self.go(doc, n, user);
    }

    pub fn prev(&self, doc: &mut Document, user: bool) {
        let n = self.current() as isize - 1;
        self.go(doc, n, user);
    }
}

impl AutoplayController for HeroControl {
    fn pause(&self) {
        self.stop();
    }

    fn resume(&self) {
        self.start();
    }
}

/// Horizontal touch travel between `touchstart` and `touchend`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct SwipeTracker {
    start_x: Option<f32>,
    last_x: Option<f32>,
}

impl SwipeTracker {
    fn begin(&mut self, x: f32) {
        self.start_x = Some(x);
        self.last_x = None;
    }

    fn track(&mut self, x: f32) {
        self.last_x = Some(x);
    }

    /// Signed travel if a move was seen; resets the tracker
    fn finish(&mut self) -> Option<f32> {
        let travel = match (self.start_x, self.last_x) {
            (Some(start), Some(last)) => Some(last - start),
            _ => None,
        };
        *self = Self::default();
        travel
    }
}

/// The page's hero slider
#[derive(Debug)]
pub struct HeroSlider {
    root: NodeId,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    control: HeroControl,
    swipe: SwipeTracker,
    swipe_threshold: f32,
}

impl HeroSlider {
    /// Find the first slider in `doc`, build its dots and start autoplay
    ///
    /// Returns `None` when there is no slider root or it has no slides.
    pub fn discover(
        doc: &mut Document,
        selectors: &HeroSelectors,
        config: &HeroSliderConfig,
        timers: TimerHandle,
    ) -> Option<Self> {
        let Some(root) = doc.select_first(doc.root(), &selectors.root) else {
            tracing::debug!("no hero slider in document");
            return None;
        };
        let slides = doc.select_all(root, &selectors.slide);
        if slides.is_empty() {
            tracing::debug!("hero slider {:?} has no slides, left inert", root);
            return None;
        }

        for &slide in &slides {
            let background = doc
                .attribute(slide, "data-bg")
                .filter(|bg| !bg.is_empty())
                .map(|bg| format!("url(\"{}\")", bg));
            if let Some(background) = background {
                doc.update_style(slide, |s| s.background = Some(background));
            }
        }

        let mut dots = Vec::new();
        match doc.select_first(root, &selectors.dots) {
            Some(wrap) => {
                for n in 1..=slides.len() {
                    let dot = doc.create_element("button");
                    doc.set_attribute(dot, "type", "button");
                    doc.set_attribute(
                        dot,
                        "aria-label",
                        config.dot_label.replace("{n}", &n.to_string()),
                    );
                    doc.append_child(wrap, dot);
                    dots.push(dot);
                }
            }
            None => tracing::debug!("hero slider {:?} has no dots container", root),
        }

        let prev = doc.select_first(root, &selectors.prev);
        let next = doc.select_first(root, &selectors.next);

        let state = HeroState {
            slides,
            dots,
            reveal: selectors.reveal.clone(),
            current: 0,
            timer: None,
            autoplay_ms: config.autoplay_ms,
            reveal_restarts: 0,
        };
        let control = HeroControl {
            state: Arc::new(Mutex::new(state)),
            timers,
        };
        control.go(doc, 0, false);
        control.start();

        tracing::debug!(
            "hero slider {:?}: {} slides, arrows={}/{}",
            root,
            lock(&control.state).slides.len(),
            prev.is_some(),
            next.is_some()
        );

        Some(Self {
            root,
            prev,
            next,
            control,
            swipe: SwipeTracker::default(),
            swipe_threshold: config.swipe_threshold_px,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn control(&self) -> &HeroControl {
        &self.control
    }

    /// The control as a shareable [`AutoplayController`]
    pub fn controller(&self) -> Arc<dyn AutoplayController> {
        Arc::new(self.control.clone())
    }

    pub fn current(&self) -> usize {
        self.control.current()
    }

    pub fn slides(&self) -> Vec<NodeId> {
        lock(&self.control.state).slides.clone()
    }

    pub fn dots(&self) -> Vec<NodeId> {
        lock(&self.control.state).dots.clone()
    }

    /// How many entrance animations were restarted so far
    pub fn reveal_restarts(&self) -> u64 {
        lock(&self.control.state).reveal_restarts
    }

    pub fn go(&self, doc: &mut Document, n: isize, user: bool) {
        self.control.go(doc, n, user);
    }

    pub fn next(&self, doc: &mut Document) {
        self.control.next(doc, false);
    }

    pub fn prev(&self, doc: &mut Document) {
        self.control.prev(doc, false);
    }

    /// Elements this slider listens on during bubbling
    pub fn listened_nodes(&self) -> SmallVec<[NodeId; 8]> {
        let mut nodes = SmallVec::new();
        nodes.push(self.root);
        nodes.extend(self.prev);
        nodes.extend(self.next);
        nodes.extend(self.dots());
        nodes
    }

    /// Handle an event while it bubbles through `current`
    pub fn handle_event(&mut self, doc: &mut Document, current: NodeId, event: &mut Event) {
        let ty = event.event_type;

        if ty == event_types::CLICK {
            if Some(current) == self.prev {
                self.control.prev(doc, true);
            } else if Some(current) == self.next {
                self.control.next(doc, true);
            } else if let Some(index) = self.dots().iter().position(|d| *d == current) {
                self.control.go(doc, index as isize, true);
            }
            return;
        }

        if current != self.root {
            return;
        }

        match ty {
            event_types::MOUSE_ENTER => self.control.stop(),
            event_types::MOUSE_LEAVE => self.control.start(),
            event_types::TOUCH_START => {
                if let Some(x) = event.client_x() {
                    self.swipe.begin(x);
                }
            }
            event_types::TOUCH_MOVE => {
                if let Some(x) = event.client_x() {
                    self.swipe.track(x);
                }
            }
            event_types::TOUCH_END => {
                let Some(travel) = self.swipe.finish() else {
                    return;
                };
                if travel.abs() > self.swipe_threshold {
                    tracing::trace!("hero swipe {}", travel);
                    if travel < 0.0 {
                        self.control.next(doc, true);
                    } else {
                        self.control.prev(doc, true);
                    }
                }
            }
            event_types::TOUCH_CANCEL => {
                self.swipe.finish();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        doc: Document,
        timers: TimerHandle,
        slider: HeroSlider,
        slides: Vec<NodeId>,
    }

    fn fixture(count: usize, with_dots: bool) -> Fixture {
        let mut doc = Document::new();
        let body = doc.root();
        let root = doc.create_element("section");
        doc.add_class(root, "site-slider");
        doc.append_child(body, root);

        let mut slides = Vec::new();
        for i in 0..count {
            let slide = doc.create_element("article");
            doc.add_class(slide, "slide");
            if i == 1 {
                doc.set_attribute(slide, "data-bg", "img/hero-2.jpg");
            }
            let title = doc.create_element("h2");
            doc.add_class(title, "reveal");
            doc.append_child(slide, title);
            doc.append_child(root, slide);
            slides.push(slide);
        }
        if with_dots {
            let dots = doc.create_element("div");
            doc.add_class(dots, "slider-dots");
            doc.append_child(root, dots);
        }
        for side in ["prev", "next"] {
            let arrow = doc.create_element("button");
            doc.add_class(arrow, "slider-arrow");
            doc.add_class(arrow, side);
            doc.append_child(root, arrow);
        }

        let config = HeroSliderConfig::default();
        let selectors = HeroSelectors::compile(&config).unwrap();
        let timers = TimerHandle::new();
        let slider = HeroSlider::discover(&mut doc, &selectors, &config, timers.clone()).unwrap();
        Fixture {
            doc,
            timers,
            slider,
            slides,
        }
    }

    fn touch(ty: u32, target: NodeId, x: f32) -> Event {
        Event::pointer(ty, target, x, 50.0, 2)
    }

    #[test]
    fn test_discovery_builds_dots_and_activates_first() {
        let fx = fixture(3, true);
        let dots = fx.slider.dots();
        assert_eq!(dots.len(), 3);
        assert_eq!(fx.doc.attribute(dots[2], "aria-label"), Some("Go to slide 3"));
        assert!(fx.doc.has_class(dots[0], "active"));
        assert!(fx.doc.has_class(fx.slides[0], "is-active"));
        assert_eq!(
            fx.doc.style(fx.slides[1]).unwrap().pointer_events,
            Some(PointerEvents::None)
        );
        assert_eq!(
            fx.doc.style(fx.slides[1]).unwrap().background.as_deref(),
            Some("url(\"img/hero-2.jpg\")")
        );
        assert!(fx.slider.control().is_running());
    }

    #[test]
    fn test_no_slides_is_inert() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        doc.add_class(root, "site-slider");
        doc.append_child(doc.root(), root);
        let config = HeroSliderConfig::default();
        let selectors = HeroSelectors::compile(&config).unwrap();
        let timers = TimerHandle::new();
        assert!(HeroSlider::discover(&mut doc, &selectors, &config, timers.clone()).is_none());
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn test_missing_dots_container() {
        let mut fx = fixture(2, false);
        assert!(fx.slider.dots().is_empty());
        fx.slider.next(&mut fx.doc);
        assert_eq!(fx.slider.current(), 1);
    }

    #[test]
    fn test_autoplay_advances_and_wraps() {
        let mut fx = fixture(3, true);
        fx.timers.advance(6000, &mut fx.doc);
        assert_eq!(fx.slider.current(), 1);
        fx.timers.advance(12_000, &mut fx.doc);
        assert_eq!(fx.slider.current(), 0);
        assert!(fx.doc.has_class(fx.slides[0], "is-active"));
        assert!(!fx.doc.has_class(fx.slides[2], "is-active"));
    }

    #[test]
    fn test_go_wraps_both_ways() {
        let mut fx = fixture(3, true);
        fx.slider.go(&mut fx.doc, -1, false);
        assert_eq!(fx.slider.current(), 2);
        fx.slider.go(&mut fx.doc, 7, false);
        assert_eq!(fx.slider.current(), 1);
        fx.slider.prev(&mut fx.doc);
        assert_eq!(fx.slider.current(), 0);
    }

    #[test]
    fn test_user_navigation_restarts_autoplay() {
        let mut fx = fixture(3, true);
        fx.timers.advance(5000, &mut fx.doc);
        let dot = fx.slider.dots()[2];
        let mut click = Event::new(event_types::CLICK, dot);
        fx.slider.handle_event(&mut fx.doc, dot, &mut click);
        assert_eq!(fx.slider.current(), 2);

        // The old period would have fired at 6000
        fx.timers.advance(5999, &mut fx.doc);
        assert_eq!(fx.slider.current(), 2);
        fx.timers.advance(1, &mut fx.doc);
        assert_eq!(fx.slider.current(), 0);
    }

    #[test]
    fn test_arrow_clicks() {
        let mut fx = fixture(3, true);
        let root = fx.slider.root();
        let prev = fx.doc.query_selector(root, ".slider-arrow.prev").unwrap().unwrap();
        let next = fx.doc.query_selector(root, ".slider-arrow.next").unwrap().unwrap();

        let mut click = Event::new(event_types::CLICK, prev);
        fx.slider.handle_event(&mut fx.doc, prev, &mut click);
        assert_eq!(fx.slider.current(), 2);
        let mut click = Event::new(event_types::CLICK, next);
        fx.slider.handle_event(&mut fx.doc, next, &mut click);
        assert_eq!(fx.slider.current(), 0);
    }

    #[test]
    fn test_hover_stops_and_leave_restarts() {
        let mut fx = fixture(3, true);
        let root = fx.slider.root();
        let mut enter = Event::new(event_types::MOUSE_ENTER, root);
        fx.slider.handle_event(&mut fx.doc, root, &mut enter);
        assert!(!fx.slider.control().is_running());
        fx.timers.advance(20_000, &mut fx.doc);
        assert_eq!(fx.slider.current(), 0);

        let mut leave = Event::new(event_types::MOUSE_LEAVE, root);
        fx.slider.handle_event(&mut fx.doc, root, &mut leave);
        assert!(fx.slider.control().is_running());
        fx.timers.advance(6000, &mut fx.doc);
        assert_eq!(fx.slider.current(), 1);
    }

    #[test]
    fn test_swipe_left_and_right() {
        let mut fx = fixture(3, true);
        let root = fx.slider.root();

        for (ty, x) in [
            (event_types::TOUCH_START, 300.0),
            (event_types::TOUCH_MOVE, 200.0),
            (event_types::TOUCH_END, 200.0),
        ] {
            let mut event = touch(ty, root, x);
            fx.slider.handle_event(&mut fx.doc, root, &mut event);
        }
        assert_eq!(fx.slider.current(), 1);

        for (ty, x) in [
            (event_types::TOUCH_START, 100.0),
            (event_types::TOUCH_MOVE, 200.0),
            (event_types::TOUCH_END, 200.0),
        ] {
            let mut event = touch(ty, root, x);
            fx.slider.handle_event(&mut fx.doc, root, &mut event);
        }
        assert_eq!(fx.slider.current(), 0);
    }

    #[test]
    fn test_short_swipe_and_tap_do_nothing() {
        let mut fx = fixture(3, true);
        let root = fx.slider.root();

        for (ty, x) in [
            (event_types::TOUCH_START, 300.0),
            (event_types::TOUCH_MOVE, 270.0),
            (event_types::TOUCH_END, 270.0),
        ] {
            let mut event = touch(ty, root, x);
            fx.slider.handle_event(&mut fx.doc, root, &mut event);
        }
        assert_eq!(fx.slider.current(), 0);

        // A tap far from the left edge has no move and is not a swipe
        for ty in [event_types::TOUCH_START, event_types::TOUCH_END] {
            let mut event = touch(ty, root, 300.0);
            fx.slider.handle_event(&mut fx.doc, root, &mut event);
        }
        assert_eq!(fx.slider.current(), 0);
    }

    #[test]
    fn test_controller_pause_resume() {
        let mut fx = fixture(3, true);
        let controller = fx.slider.controller();
        controller.pause();
        fx.timers.advance(12_000, &mut fx.doc);
        assert_eq!(fx.slider.current(), 0);
        controller.resume();
        controller.resume();
        assert_eq!(fx.timers.pending(), 1);
        fx.timers.advance(6000, &mut fx.doc);
        assert_eq!(fx.slider.current(), 1);
    }

    #[test]
    fn test_reveal_animation_restarts() {
        let mut fx = fixture(3, true);
        let before = fx.slider.reveal_restarts();
        fx.slider.go(&mut fx.doc, 1, false);
        assert_eq!(fx.slider.reveal_restarts(), before + 1);
        let title = fx.doc.children(fx.slides[1])[0];
        assert!(fx.doc.has_class(title, "in"));
    }
}
