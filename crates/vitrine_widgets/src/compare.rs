//! Before/after compare widget
//!
//! Two stacked images; the "after" image is clipped from the right so only
//! the leftmost `reveal` percent of it shows, and a handle marks the
//! boundary. The reveal follows three inputs, whichever came last:
//!
//! - a pointer drag that starts anywhere in the container
//! - a linked range control (`input` and `change`)
//! - the initial control value at construction
//!
//! The container is sized to the before image's aspect ratio, capped at a
//! share of the viewport height (see [`crate::sizing`]).
//!
//! While the user interacts, the widget pauses an optional
//! [`AutoplayController`] and resumes it after a delay.
//!
//! # Example
//!
//! ```rust
//! use vitrine_core::dom::{Document, ImageInfo};
//! use vitrine_platform::Viewport;
//! use vitrine_widgets::compare::{compare, CompareElements};
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let container = doc.create_element("div");
//! let before = doc.create_element("img");
//! let after = doc.create_element("img");
//! let handle = doc.create_element("div");
//! doc.append_child(root, container);
//! for child in [before, after, handle] {
//!     doc.append_child(container, child);
//! }
//! doc.set_image(before, ImageInfo::loaded(1600.0, 900.0));
//!
//! let elements = CompareElements::new(container, before, after, handle);
//! let mut widget = compare(elements).build(&mut doc, &Viewport::default());
//! assert_eq!(widget.set_reveal(&mut doc, 150.0), 100.0);
//! ```

use std::sync::Arc;

use smallvec::SmallVec;
use vitrine_core::dom::{aspect_ratio, ClipInset, Document, Length, NodeId, ObjectFit};
use vitrine_core::events::{event_types, Event, EventType};
use vitrine_core::fsm::StateMachine;
use vitrine_core::timer::TimerHandle;
use vitrine_platform::Viewport;

use crate::autoplay::{AutoplayController, AutoplayLink};
use crate::config::{CompareConfig, CompareSelectors};
use crate::sizing::{
    available_width, clamp_percent, compute_bounding_size, measured_ancestor, reveal_percent,
    BoundingSize, SizingPolicy,
};

/// Drag states
pub mod states {
    /// No pointer is dragging the handle
    pub const IDLE: u32 = 0;
    /// A pointer went down in the container and has not been released
    pub const DRAGGING: u32 = 1;
}

/// Events on the range control that never leave it
const RANGE_ISOLATED: [EventType; 6] = [
    event_types::CLICK,
    event_types::INPUT,
    event_types::CHANGE,
    event_types::POINTER_DOWN,
    event_types::MOUSE_DOWN,
    event_types::TOUCH_START,
];

/// Events on the instruction element or the handle that never leave the widget
const PRESS_ISOLATED: [EventType; 4] = [
    event_types::CLICK,
    event_types::POINTER_DOWN,
    event_types::MOUSE_DOWN,
    event_types::TOUCH_START,
];

/// Container events that pause autoplay
const INTERACTION_START: [EventType; 3] = [
    event_types::POINTER_DOWN,
    event_types::TOUCH_START,
    event_types::MOUSE_DOWN,
];

/// Container events that schedule an autoplay resume
const INTERACTION_END: [EventType; 5] = [
    event_types::POINTER_UP,
    event_types::TOUCH_END,
    event_types::MOUSE_UP,
    event_types::MOUSE_LEAVE,
    event_types::POINTER_CANCEL,
];

/// The elements one compare widget is made of
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompareElements {
    pub container: NodeId,
    pub before: NodeId,
    pub after: NodeId,
    pub handle: NodeId,
    /// Element holding the linked control
    pub instruction: Option<NodeId>,
    /// The linked range control
    pub range: Option<NodeId>,
}

impl CompareElements {
    /// Elements without a linked control
    pub fn new(container: NodeId, before: NodeId, after: NodeId, handle: NodeId) -> Self {
        Self {
            container,
            before,
            after,
            handle,
            instruction: None,
            range: None,
        }
    }

    /// Attach a linked control and the element that holds it
    pub fn with_control(mut self, instruction: NodeId, range: Option<NodeId>) -> Self {
        self.instruction = Some(instruction);
        self.range = range;
        self
    }

    /// Locate the parts of the widget rooted at `container`
    ///
    /// Returns `None` when the before image, after image or handle is
    /// missing. The instruction element is the container's next sibling if
    /// it matches, otherwise the first match under the container's parent.
    pub fn discover(
        doc: &Document,
        container: NodeId,
        selectors: &CompareSelectors,
    ) -> Option<Self> {
        let before = doc.select_first(container, &selectors.before);
        let after = doc.select_first(container, &selectors.after);
        let handle = doc.select_first(container, &selectors.handle);
        let (Some(before), Some(after), Some(handle)) = (before, after, handle) else {
            tracing::debug!(
                "compare {:?} skipped: before={:?} after={:?} handle={:?}",
                container,
                before,
                after,
                handle
            );
            return None;
        };

        let instruction = doc
            .next_element_sibling(container)
            .filter(|sibling| selectors.instruction.matches(doc, *sibling))
            .or_else(|| {
                doc.parent(container)
                    .and_then(|parent| doc.select_first(parent, &selectors.instruction))
            });
        let range = instruction.and_then(|i| doc.select_first(i, &selectors.range));

        Some(Self {
            container,
            before,
            after,
            handle,
            instruction,
            range,
        })
    }
}

/// A before/after compare widget
pub struct CompareWidget {
    elements: CompareElements,
    policy: SizingPolicy,
    /// Current reveal in percent, always within [0, 100]
    reveal: f32,
    /// Natural aspect ratio of the before image once known
    aspect_ratio: Option<f32>,
    bounding: Option<BoundingSize>,
    /// Ancestor whose width was last used for sizing
    observed_ancestor: NodeId,
    /// Sizing waits for the before image's first `load`
    awaiting_load: bool,
    fsm: StateMachine,
    drag_pointer: Option<u64>,
    link: AutoplayLink,
}

impl std::fmt::Debug for CompareWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompareWidget")
            .field("container", &self.elements.container)
            .field("reveal", &self.reveal)
            .field("bounding", &self.bounding)
            .field("dragging", &self.is_dragging())
            .finish()
    }
}

impl CompareWidget {
    fn create_fsm() -> StateMachine {
        StateMachine::builder(states::IDLE)
            .on(states::IDLE, event_types::POINTER_DOWN, states::DRAGGING)
            // A second press while dragging restarts the drag
            .on(states::DRAGGING, event_types::POINTER_DOWN, states::DRAGGING)
            .on(states::DRAGGING, event_types::POINTER_UP, states::IDLE)
            .on(states::DRAGGING, event_types::POINTER_CANCEL, states::IDLE)
            .build()
    }

    pub fn elements(&self) -> &CompareElements {
        &self.elements
    }

    pub fn container(&self) -> NodeId {
        self.elements.container
    }

    /// Current reveal percentage
    pub fn reveal_ratio(&self) -> f32 {
        self.reveal
    }

    /// Size applied by the last successful [`resize`](Self::resize)
    pub fn bounding_size(&self) -> Option<BoundingSize> {
        self.bounding
    }

    /// Cached natural aspect ratio (height / width) of the before image
    pub fn aspect_ratio(&self) -> Option<f32> {
        self.aspect_ratio
    }

    pub fn is_dragging(&self) -> bool {
        self.fsm.current_state() == states::DRAGGING
    }

    /// Whether sizing still waits for the before image to load
    pub fn is_awaiting_load(&self) -> bool {
        self.awaiting_load
    }

    /// Elements whose size changes should trigger a resize
    pub fn observed_nodes(&self) -> [NodeId; 2] {
        [self.elements.container, self.observed_ancestor]
    }

    /// Elements this widget listens on during bubbling
    pub fn listened_nodes(&self) -> SmallVec<[NodeId; 4]> {
        let mut nodes = SmallVec::new();
        nodes.push(self.elements.container);
        nodes.push(self.elements.before);
        nodes.extend(self.elements.instruction);
        nodes.extend(self.elements.range);
        nodes
    }

    /// Apply a reveal value and return the clamped value actually used
    ///
    /// Updates the after image's clip, the handle position and the linked
    /// control.
    pub fn set_reveal(&mut self, doc: &mut Document, value: f32) -> f32 {
        let applied = clamp_percent(value);
        self.reveal = applied;

        doc.update_style(self.elements.after, |style| {
            style.clip_path = Some(ClipInset::reveal_from_left(applied));
        });
        doc.update_style(self.elements.handle, |style| {
            style.left = Some(Length::Percent(applied));
        });
        if let Some(range) = self.elements.range {
            doc.set_attribute(range, "value", applied.to_string());
        }

        tracing::trace!("compare {:?} reveal {}", self.elements.container, applied);
        applied
    }

    /// Move the reveal to viewport x `client_x`, measured against the
    /// container's current rectangle
    ///
    /// No-op when the container has no width.
    pub fn move_to(&mut self, doc: &mut Document, client_x: f32) -> Option<f32> {
        let rect = doc.rect(self.elements.container);
        match reveal_percent(rect, client_x) {
            Some(pct) => Some(self.set_reveal(doc, pct)),
            None => {
                tracing::trace!(
                    "compare {:?} has no width, drag ignored",
                    self.elements.container
                );
                None
            }
        }
    }

    /// Recompute and apply the container size
    ///
    /// Returns `None` (and leaves the style alone) while no aspect ratio
    /// can be determined.
    pub fn resize(&mut self, doc: &mut Document, viewport: &Viewport) -> Option<BoundingSize> {
        let ratio = self.current_aspect_ratio(doc)?;

        self.observed_ancestor = measured_ancestor(doc, self.elements.container);
        let available = available_width(doc, self.elements.container);
        let max_height = self.policy.max_height(viewport);
        let size = compute_bounding_size(available, ratio, max_height);
        size.apply(doc, self.elements.container);
        self.bounding = Some(size);

        tracing::debug!(
            "compare {:?} sized: available={} ratio={} max={} -> {:?}",
            self.elements.container,
            available,
            ratio,
            max_height,
            size
        );
        Some(size)
    }

    fn current_aspect_ratio(&mut self, doc: &Document) -> Option<f32> {
        if let Some(ratio) = self.aspect_ratio {
            return Some(ratio);
        }
        if let Some(ratio) = doc
            .image(self.elements.before)
            .and_then(|image| image.natural_aspect_ratio())
        {
            self.aspect_ratio = Some(ratio);
            return Some(ratio);
        }

        // Rendered size is a stopgap and is not cached
        let rect = doc.rect(self.elements.before);
        let ratio = aspect_ratio(rect.width, rect.height);
        if ratio.is_none() {
            tracing::debug!(
                "compare {:?} sizing deferred: no usable aspect ratio",
                self.elements.container
            );
        }
        ratio
    }

    /// Handle an event while it bubbles through `current`
    ///
    /// `current` is one of [`listened_nodes`](Self::listened_nodes). May
    /// stop the event's propagation.
    pub fn handle_event(
        &mut self,
        doc: &mut Document,
        viewport: &Viewport,
        current: NodeId,
        event: &mut Event,
    ) {
        let ty = event.event_type;

        if Some(current) == self.elements.range {
            if matches!(ty, event_types::INPUT | event_types::CHANGE) {
                self.sync_from_control(doc);
            }
            if RANGE_ISOLATED.contains(&ty) {
                event.stop_propagation();
            }
            return;
        }

        if Some(current) == self.elements.instruction {
            if PRESS_ISOLATED.contains(&ty) {
                event.stop_propagation();
            }
            return;
        }

        if current == self.elements.before {
            if ty == event_types::LOAD && self.awaiting_load {
                self.awaiting_load = false;
                self.resize(doc, viewport);
            }
            return;
        }

        if current != self.elements.container {
            return;
        }

        if ty == event_types::POINTER_DOWN {
            self.begin_drag(doc, event);
        }
        if INTERACTION_START.contains(&ty) {
            self.link.interaction_started();
        } else if INTERACTION_END.contains(&ty) {
            self.link.interaction_ended();
        }

        // Presses on the handle are the widget's own business
        if PRESS_ISOLATED.contains(&ty) && doc.contains(self.elements.handle, event.target) {
            event.stop_propagation();
        }
    }

    /// Handle an event that reached window-level listeners
    pub fn handle_window_event(&mut self, doc: &mut Document, event: &Event) {
        if !self.is_dragging() {
            return;
        }
        match event.event_type {
            event_types::POINTER_MOVE => {
                let same_pointer = match (event.pointer_id(), self.drag_pointer) {
                    (Some(moved), Some(dragging)) => moved == dragging,
                    _ => true,
                };
                if let (true, Some(x)) = (same_pointer, event.client_x()) {
                    self.move_to(doc, x);
                }
            }
            event_types::POINTER_UP | event_types::POINTER_CANCEL => {
                self.end_drag(doc, event.event_type);
            }
            _ => {}
        }
    }

    fn begin_drag(&mut self, doc: &mut Document, event: &Event) {
        if let Some(pointer_id) = event.pointer_id() {
            if let Err(err) = doc.set_pointer_capture(self.elements.container, pointer_id) {
                tracing::debug!(
                    "compare {:?}: pointer capture failed: {}",
                    self.elements.container,
                    err
                );
            }
            self.drag_pointer = Some(pointer_id);
        }
        if let Some(x) = event.client_x() {
            self.move_to(doc, x);
        }
        self.fsm.send(event_types::POINTER_DOWN);
    }

    fn end_drag(&mut self, doc: &mut Document, trigger: EventType) {
        if let Some(pointer_id) = self.drag_pointer.take() {
            doc.release_pointer_capture(self.elements.container, pointer_id);
        }
        self.fsm.send(trigger);
        tracing::trace!(
            "compare {:?} drag ended at {}",
            self.elements.container,
            self.reveal
        );
    }

    fn sync_from_control(&mut self, doc: &mut Document) {
        match self.control_value(doc) {
            Some(value) => {
                self.set_reveal(doc, value);
            }
            None => tracing::trace!(
                "compare {:?}: non-numeric control value ignored",
                self.elements.container
            ),
        }
    }

    /// Finite numeric value of the linked control, if any
    pub fn control_value(&self, doc: &Document) -> Option<f32> {
        let range = self.elements.range?;
        doc.attribute(range, "value")?
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
    }
}

/// Create a compare widget builder
pub fn compare(elements: CompareElements) -> CompareWidgetBuilder {
    CompareWidgetBuilder {
        elements,
        policy: SizingPolicy::default(),
        resume_delay_ms: CompareConfig::default().resume_delay_ms,
        controller: None,
        timers: None,
    }
}

/// Builder for [`CompareWidget`]
pub struct CompareWidgetBuilder {
    elements: CompareElements,
    policy: SizingPolicy,
    resume_delay_ms: u64,
    controller: Option<Arc<dyn AutoplayController>>,
    timers: Option<TimerHandle>,
}

impl CompareWidgetBuilder {
    /// Take sizing and resume delay from a configuration
    pub fn config(mut self, config: &CompareConfig) -> Self {
        self.policy = SizingPolicy::from_config(config);
        self.resume_delay_ms = config.resume_delay_ms;
        self
    }

    /// Set the height cap parameters
    pub fn policy(mut self, policy: SizingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn resume_delay_ms(mut self, delay: u64) -> Self {
        self.resume_delay_ms = delay;
        self
    }

    /// Pause `controller` during interactions; resumes are scheduled on
    /// `timers`
    pub fn autoplay(mut self, controller: Arc<dyn AutoplayController>, timers: TimerHandle) -> Self {
        self.controller = Some(controller);
        self.timers = Some(timers);
        self
    }

    /// Same as [`autoplay`](Self::autoplay) but accepts no controller
    pub fn autoplay_opt(
        mut self,
        controller: Option<Arc<dyn AutoplayController>>,
        timers: TimerHandle,
    ) -> Self {
        self.controller = controller;
        self.timers = Some(timers);
        self
    }

    /// Initialize the widget against the document
    ///
    /// Applies the initial reveal (the control's value, or 0), makes both
    /// images `contain`, and sizes the container now if the before image
    /// is complete or after its first `load` otherwise.
    pub fn build(self, doc: &mut Document, viewport: &Viewport) -> CompareWidget {
        let elements = self.elements;
        let link = AutoplayLink::new(
            self.controller,
            self.timers.unwrap_or_default(),
            self.resume_delay_ms,
        );

        let mut widget = CompareWidget {
            elements,
            policy: self.policy,
            reveal: 0.0,
            aspect_ratio: None,
            bounding: None,
            observed_ancestor: measured_ancestor(doc, elements.container),
            awaiting_load: false,
            fsm: CompareWidget::create_fsm(),
            drag_pointer: None,
            link,
        };

        let initial = widget.control_value(doc).unwrap_or(0.0);
        widget.set_reveal(doc, initial);

        for image in [elements.before, elements.after] {
            doc.update_style(image, |style| {
                style.object_fit = Some(ObjectFit::Contain);
                style.object_position = Some("center".to_string());
            });
        }

        let complete = doc.image(elements.before).is_some_and(|image| image.complete);
        if complete {
            widget.resize(doc, viewport);
        } else {
            widget.awaiting_load = true;
        }

        tracing::debug!(
            "compare {:?} ready: reveal={} control={:?} sized={}",
            elements.container,
            widget.reveal,
            elements.range,
            widget.bounding.is_some()
        );
        widget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoplay::tests::CountingController;
    use vitrine_core::dom::ImageInfo;
    use vitrine_core::geometry::Rect;
    use vitrine_core::selector::Selector;

    struct Fixture {
        doc: Document,
        section: NodeId,
        elements: CompareElements,
    }

    /// body > section > [div.compare > (img.before, img.after, div.cmp-handle > span),
    ///                   div.cmp-instruction > input.cmp-range]
    fn fixture(control_value: Option<&str>) -> Fixture {
        let mut doc = Document::new();
        let root = doc.root();
        let section = doc.create_element("section");
        doc.append_child(root, section);
        doc.set_rect(section, Rect::new(0.0, 0.0, 800.0, 600.0));

        let container = doc.create_element("div");
        doc.add_class(container, "compare");
        doc.append_child(section, container);
        doc.set_rect(container, Rect::new(100.0, 0.0, 400.0, 200.0));

        let before = doc.create_element("img");
        doc.add_class(before, "before");
        let after = doc.create_element("img");
        doc.add_class(after, "after");
        let handle = doc.create_element("div");
        doc.add_class(handle, "cmp-handle");
        let grip = doc.create_element("span");
        for child in [before, after, handle] {
            doc.append_child(container, child);
        }
        doc.append_child(handle, grip);

        let instruction = doc.create_element("div");
        doc.add_class(instruction, "cmp-instruction");
        doc.append_child(section, instruction);
        let range = doc.create_element("input");
        doc.add_class(range, "cmp-range");
        if let Some(value) = control_value {
            doc.set_attribute(range, "value", value);
        }
        doc.append_child(instruction, range);

        let elements = CompareElements::new(container, before, after, handle)
            .with_control(instruction, Some(range));
        Fixture {
            doc,
            section,
            elements,
        }
    }

    fn cap_450() -> SizingPolicy {
        SizingPolicy {
            min_height: 450.0,
            narrow_breakpoint: 820.0,
            narrow_fraction: 0.5,
            wide_fraction: 0.5,
        }
    }

    fn counting(timers: &TimerHandle) -> (Arc<CountingController>, CompareWidgetBuilder, Fixture) {
        let fx = fixture(None);
        let counter = Arc::new(CountingController::default());
        let builder = compare(fx.elements).autoplay(counter.clone(), timers.clone());
        (counter, builder, fx)
    }

    fn down(target: NodeId, x: f32) -> Event {
        Event::pointer(event_types::POINTER_DOWN, target, x, 10.0, 1)
    }

    #[test]
    fn test_set_reveal_clamps() {
        let mut fx = fixture(None);
        let mut widget = compare(fx.elements).build(&mut fx.doc, &Viewport::default());
        assert_eq!(widget.set_reveal(&mut fx.doc, -50.0), 0.0);
        assert_eq!(widget.set_reveal(&mut fx.doc, 150.0), 100.0);
        assert_eq!(widget.set_reveal(&mut fx.doc, 42.0), 42.0);
        assert_eq!(widget.set_reveal(&mut fx.doc, f32::NAN), 0.0);
    }

    #[test]
    fn test_set_reveal_is_idempotent() {
        let mut fx = fixture(None);
        let mut widget = compare(fx.elements).build(&mut fx.doc, &Viewport::default());
        let after = fx.elements.after;
        let handle = fx.elements.handle;

        widget.set_reveal(&mut fx.doc, 30.0);
        let clip = fx.doc.style(after).unwrap().clip_path;
        let left = fx.doc.style(handle).unwrap().left;
        widget.set_reveal(&mut fx.doc, 30.0);
        assert_eq!(fx.doc.style(after).unwrap().clip_path, clip);
        assert_eq!(fx.doc.style(handle).unwrap().left, left);

        assert_eq!(clip.unwrap().to_string(), "inset(0 70% 0 0)");
        assert_eq!(left, Some(Length::Percent(30.0)));
    }

    #[test]
    fn test_initial_value_from_control() {
        let mut fx = fixture(Some("30"));
        let widget = compare(fx.elements).build(&mut fx.doc, &Viewport::default());
        assert_eq!(widget.reveal_ratio(), 30.0);

        let mut fx = fixture(Some("250"));
        let widget = compare(fx.elements).build(&mut fx.doc, &Viewport::default());
        assert_eq!(widget.reveal_ratio(), 100.0);
        assert_eq!(fx.doc.attribute(fx.elements.range.unwrap(), "value"), Some("100"));

        let mut fx = fixture(Some("wide"));
        let widget = compare(fx.elements).build(&mut fx.doc, &Viewport::default());
        assert_eq!(widget.reveal_ratio(), 0.0);

        for infinite in ["Infinity", "inf", "-inf", "NaN"] {
            let mut fx = fixture(Some(infinite));
            let widget = compare(fx.elements).build(&mut fx.doc, &Viewport::default());
            assert_eq!(widget.reveal_ratio(), 0.0, "initial value {infinite}");
        }
    }

    #[test]
    fn test_control_sync_both_ways() {
        let mut fx = fixture(None);
        let viewport = Viewport::default();
        let mut widget = compare(fx.elements).build(&mut fx.doc, &viewport);
        let range = fx.elements.range.unwrap();

        fx.doc.set_attribute(range, "value", "30");
        let mut change = Event::new(event_types::CHANGE, range);
        widget.handle_event(&mut fx.doc, &viewport, range, &mut change);
        assert_eq!(widget.reveal_ratio(), 30.0);
        assert!(change.propagation_stopped);

        fx.doc.set_attribute(range, "value", "42.5");
        let mut input = Event::new(event_types::INPUT, range);
        widget.handle_event(&mut fx.doc, &viewport, range, &mut input);
        assert_eq!(widget.reveal_ratio(), 42.5);

        widget.set_reveal(&mut fx.doc, 70.0);
        assert_eq!(fx.doc.attribute(range, "value"), Some("70"));

        // Garbage in the control leaves the reveal alone
        for garbage in ["abc", "Infinity"] {
            fx.doc.set_attribute(range, "value", garbage);
            let mut input = Event::new(event_types::INPUT, range);
            widget.handle_event(&mut fx.doc, &viewport, range, &mut input);
            assert_eq!(widget.reveal_ratio(), 70.0);
        }
    }

    #[test]
    fn test_isolated_events() {
        let mut fx = fixture(None);
        let viewport = Viewport::default();
        let mut widget = compare(fx.elements).build(&mut fx.doc, &viewport);
        let instruction = fx.elements.instruction.unwrap();
        let container = fx.elements.container;

        let mut click = Event::new(event_types::CLICK, instruction);
        widget.handle_event(&mut fx.doc, &viewport, instruction, &mut click);
        assert!(click.propagation_stopped);

        let mut up = Event::new(event_types::POINTER_UP, instruction);
        widget.handle_event(&mut fx.doc, &viewport, instruction, &mut up);
        assert!(!up.propagation_stopped);

        // Inside the handle: still drags, then stops at the container
        let grip = fx.doc.children(fx.elements.handle)[0];
        fx.doc.pointer_pressed(1);
        let mut press = down(grip, 300.0);
        widget.handle_event(&mut fx.doc, &viewport, container, &mut press);
        assert!(press.propagation_stopped);
        assert!(widget.is_dragging());
        assert_eq!(widget.reveal_ratio(), 50.0);

        // Plain container press keeps bubbling
        let mut press = down(container, 200.0);
        widget.handle_event(&mut fx.doc, &viewport, container, &mut press);
        assert!(!press.propagation_stopped);
    }

    #[test]
    fn test_fits_width_under_cap() {
        let mut fx = fixture(None);
        fx.doc.set_image(fx.elements.before, ImageInfo::loaded(1000.0, 500.0));
        let widget = compare(fx.elements)
            .policy(cap_450())
            .build(&mut fx.doc, &Viewport::default());

        let size = widget.bounding_size().unwrap();
        assert_eq!(size.height, 400.0);
        assert_eq!(size.width, None);
        assert!(!size.is_centered());
        let style = fx.doc.style(fx.elements.container).unwrap();
        assert_eq!(style.height, Some(Length::Px(400.0)));
        assert_eq!(style.width, None);
        assert_eq!(style.margin_left, None);
    }

    #[test]
    fn test_caps_height_and_centers() {
        let mut fx = fixture(None);
        fx.doc.set_rect(fx.section, Rect::new(0.0, 0.0, 1600.0, 600.0));
        fx.doc.set_image(fx.elements.before, ImageInfo::loaded(1000.0, 500.0));
        let widget = compare(fx.elements)
            .policy(cap_450())
            .build(&mut fx.doc, &Viewport::default());

        let size = widget.bounding_size().unwrap();
        assert_eq!(size.height, 450.0);
        assert_eq!(size.width, Some(900.0));
        let style = fx.doc.style(fx.elements.container).unwrap();
        assert_eq!(style.width, Some(Length::Px(900.0)));
        assert_eq!(style.margin_left, Some(Length::Auto));
        assert_eq!(style.margin_right, Some(Length::Auto));
    }

    #[test]
    fn test_sizing_waits_for_load() {
        let mut fx = fixture(None);
        let viewport = Viewport::default();
        let before = fx.elements.before;
        let mut widget = compare(fx.elements)
            .policy(cap_450())
            .build(&mut fx.doc, &viewport);
        assert!(widget.is_awaiting_load());
        assert_eq!(widget.bounding_size(), None);

        fx.doc.set_image(before, ImageInfo::loaded(1000.0, 500.0));
        let mut load = Event::new(event_types::LOAD, before);
        widget.handle_event(&mut fx.doc, &viewport, before, &mut load);
        assert!(!widget.is_awaiting_load());
        assert_eq!(widget.bounding_size().unwrap().height, 400.0);
        assert_eq!(widget.aspect_ratio(), Some(0.5));
    }

    #[test]
    fn test_rendered_size_fallback_not_cached() {
        let mut fx = fixture(None);
        let viewport = Viewport::default();
        let before = fx.elements.before;
        // Broken image: complete but no natural size
        fx.doc.set_image(before, ImageInfo::loaded(0.0, 0.0));
        let mut widget = compare(fx.elements)
            .policy(cap_450())
            .build(&mut fx.doc, &viewport);
        assert_eq!(widget.bounding_size(), None);

        fx.doc.set_rect(before, Rect::new(0.0, 0.0, 400.0, 100.0));
        assert_eq!(widget.resize(&mut fx.doc, &viewport).unwrap().height, 200.0);
        assert_eq!(widget.aspect_ratio(), None);
    }

    #[test]
    fn test_drag_maps_x_to_percent() {
        let mut fx = fixture(None);
        let viewport = Viewport::default();
        let container = fx.elements.container;
        let mut widget = compare(fx.elements).build(&mut fx.doc, &viewport);

        fx.doc.pointer_pressed(1);
        let mut press = down(container, 300.0);
        widget.handle_event(&mut fx.doc, &viewport, container, &mut press);
        assert_eq!(widget.reveal_ratio(), 50.0);
        assert_eq!(fx.doc.pointer_capture(1), Some(container));

        let moved = Event::pointer(event_types::POINTER_MOVE, container, 200.0, 10.0, 1);
        widget.handle_window_event(&mut fx.doc, &moved);
        assert_eq!(widget.reveal_ratio(), 25.0);

        // Another pointer moving elsewhere does not steer this drag
        let other = Event::pointer(event_types::POINTER_MOVE, container, 480.0, 10.0, 9);
        widget.handle_window_event(&mut fx.doc, &other);
        assert_eq!(widget.reveal_ratio(), 25.0);

        // Rect is read fresh on every move
        fx.doc.set_rect(container, Rect::new(0.0, 0.0, 400.0, 200.0));
        let moved = Event::pointer(event_types::POINTER_MOVE, container, 200.0, 10.0, 1);
        widget.handle_window_event(&mut fx.doc, &moved);
        assert_eq!(widget.reveal_ratio(), 50.0);
    }

    #[test]
    fn test_moves_after_release_are_ignored() {
        let mut fx = fixture(None);
        let viewport = Viewport::default();
        let container = fx.elements.container;
        let mut widget = compare(fx.elements).build(&mut fx.doc, &viewport);

        let mut press = down(container, 300.0);
        widget.handle_event(&mut fx.doc, &viewport, container, &mut press);
        let up = Event::pointer(event_types::POINTER_UP, fx.doc.root(), 0.0, 0.0, 1);
        widget.handle_window_event(&mut fx.doc, &up);
        assert!(!widget.is_dragging());

        let moved = Event::pointer(event_types::POINTER_MOVE, container, 150.0, 10.0, 1);
        widget.handle_window_event(&mut fx.doc, &moved);
        assert_eq!(widget.reveal_ratio(), 50.0);
    }

    #[test]
    fn test_pointer_cancel_ends_drag() {
        let mut fx = fixture(None);
        let viewport = Viewport::default();
        let container = fx.elements.container;
        let mut widget = compare(fx.elements).build(&mut fx.doc, &viewport);

        let mut press = down(container, 300.0);
        widget.handle_event(&mut fx.doc, &viewport, container, &mut press);
        let cancel = Event::pointer(event_types::POINTER_CANCEL, container, 0.0, 0.0, 1);
        widget.handle_window_event(&mut fx.doc, &cancel);
        assert!(!widget.is_dragging());
    }

    #[test]
    fn test_zero_width_drag_is_noop() {
        let mut fx = fixture(None);
        let viewport = Viewport::default();
        let container = fx.elements.container;
        fx.doc.set_rect(container, Rect::new(100.0, 0.0, 0.0, 0.0));
        let mut widget = compare(fx.elements).build(&mut fx.doc, &viewport);
        widget.set_reveal(&mut fx.doc, 40.0);

        // Capture fails too: the pointer was never pressed
        let mut press = down(container, 300.0);
        widget.handle_event(&mut fx.doc, &viewport, container, &mut press);
        assert_eq!(widget.reveal_ratio(), 40.0);
        assert_eq!(widget.move_to(&mut fx.doc, 250.0), None);
        assert_eq!(fx.doc.pointer_capture(1), None);
    }

    #[test]
    fn test_pause_and_deferred_resume() {
        let timers = TimerHandle::new();
        let (counter, builder, mut fx) = counting(&timers);
        let viewport = Viewport::default();
        let container = fx.elements.container;
        let mut widget = builder.build(&mut fx.doc, &viewport);

        let mut press = down(container, 300.0);
        widget.handle_event(&mut fx.doc, &viewport, container, &mut press);
        assert_eq!(counter.pauses(), 1);

        let mut release = Event::pointer(event_types::POINTER_UP, container, 300.0, 10.0, 1);
        widget.handle_event(&mut fx.doc, &viewport, container, &mut release);
        assert_eq!(counter.resumes(), 0);
        timers.advance(799, &mut fx.doc);
        assert_eq!(counter.resumes(), 0);
        timers.advance(1, &mut fx.doc);
        assert_eq!(counter.resumes(), 1);
    }

    #[test]
    fn test_no_controller_is_fine() {
        let mut fx = fixture(None);
        let viewport = Viewport::default();
        let container = fx.elements.container;
        let mut widget = compare(fx.elements).build(&mut fx.doc, &viewport);

        for ty in [
            event_types::POINTER_DOWN,
            event_types::MOUSE_DOWN,
            event_types::POINTER_UP,
            event_types::MOUSE_LEAVE,
        ] {
            let mut event = Event::pointer(ty, container, 300.0, 0.0, 1);
            widget.handle_event(&mut fx.doc, &viewport, container, &mut event);
        }
    }

    #[test]
    fn test_discover_finds_sibling_instruction() {
        let fx = fixture(None);
        let selectors = CompareSelectors::compile(&CompareConfig::default()).unwrap();
        let found = CompareElements::discover(&fx.doc, fx.elements.container, &selectors).unwrap();
        assert_eq!(found, fx.elements);
    }

    #[test]
    fn test_discover_falls_back_to_parent_and_skips_incomplete() {
        let mut fx = fixture(None);
        let selectors = CompareSelectors::compile(&CompareConfig::default()).unwrap();
        let instruction = fx.elements.instruction.unwrap();

        // Something unrelated between the container and its instruction
        let caption = fx.doc.create_element("p");
        fx.doc.append_child(fx.section, caption);
        fx.doc.append_child(fx.section, instruction);
        let found = CompareElements::discover(&fx.doc, fx.elements.container, &selectors).unwrap();
        assert_eq!(found.instruction, Some(instruction));
        assert_eq!(found.range, fx.elements.range);

        fx.doc.remove(fx.elements.handle);
        assert!(CompareElements::discover(&fx.doc, fx.elements.container, &selectors).is_none());
        assert!(Selector::class("compare").matches(&fx.doc, fx.elements.container));
    }
}
