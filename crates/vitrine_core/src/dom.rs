//! Document model
//!
//! A small element arena standing in for the browser DOM. It holds exactly
//! what the widgets read and write:
//!
//! - structure: tag, id, classes, attributes, parent/children
//! - measurements: the bounding client rectangle of each element, set by the
//!   host after its own layout pass
//! - image metadata (natural size, load completeness) and media state
//! - inline [`Style`] properties the widgets mutate
//! - active pointers and pointer capture
//!
//! Layout itself is not computed here. Hosts call [`Document::set_rect`]
//! whenever their layout changes.

use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

use crate::geometry::{Point, Rect};

new_key_type! {
    /// Handle to an element in a [`Document`]
    pub struct NodeId;
}

/// Errors from document operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The node was removed or never existed
    #[error("node {0:?} is not in the document")]
    NodeNotFound(NodeId),

    /// Pointer capture requested for a pointer that is not down
    #[error("pointer {0} is not active")]
    PointerNotActive(u64),

    /// Media operation on an element without media state
    #[error("node {0:?} is not a media element")]
    NotMedia(NodeId),

    /// The host refused playback (e.g. autoplay policy)
    #[error("playback of node {0:?} was blocked")]
    PlaybackBlocked(NodeId),
}

// ============================================================================
// Style
// ============================================================================

/// A CSS length for the handful of inline properties widgets set
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Absolute pixels
    Px(f32),
    /// Percentage of the containing block
    Percent(f32),
    /// `auto`
    Auto,
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(v) => write!(f, "{}px", v),
            Length::Percent(v) => write!(f, "{}%", v),
            Length::Auto => write!(f, "auto"),
        }
    }
}

/// `clip-path: inset(top right bottom left)` with every side in percent
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClipInset {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl ClipInset {
    /// Keep the leftmost `visible` percent, hide the rest from the right edge
    pub fn reveal_from_left(visible: f32) -> Self {
        Self {
            right: 100.0 - visible,
            ..Self::default()
        }
    }
}

impl fmt::Display for ClipInset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side(v: f32) -> String {
            if v == 0.0 {
                "0".to_string()
            } else {
                format!("{}%", v)
            }
        }
        write!(
            f,
            "inset({} {} {} {})",
            side(self.top),
            side(self.right),
            side(self.bottom),
            side(self.left)
        )
    }
}

/// `object-fit`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectFit {
    Fill,
    Contain,
    Cover,
}

/// `pointer-events`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerEvents {
    Auto,
    None,
}

/// Inline style of an element
///
/// `None` means the property is unset and the stylesheet value applies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
    pub clip_path: Option<ClipInset>,
    pub left: Option<Length>,
    pub width: Option<Length>,
    pub height: Option<Length>,
    pub margin_left: Option<Length>,
    pub margin_right: Option<Length>,
    pub object_fit: Option<ObjectFit>,
    pub object_position: Option<String>,
    pub pointer_events: Option<PointerEvents>,
    /// Value of the `--bg` custom property
    pub background: Option<String>,
}

// ============================================================================
// Element data
// ============================================================================

/// Image metadata for `<img>` elements
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImageInfo {
    /// Intrinsic width, 0 until decoded
    pub natural_width: f32,
    /// Intrinsic height, 0 until decoded
    pub natural_height: f32,
    /// Whether loading finished (successfully or not)
    pub complete: bool,
}

impl ImageInfo {
    /// An image that has finished decoding
    pub fn loaded(natural_width: f32, natural_height: f32) -> Self {
        Self {
            natural_width,
            natural_height,
            complete: true,
        }
    }

    /// Height over width from the intrinsic size, if known
    pub fn natural_aspect_ratio(&self) -> Option<f32> {
        aspect_ratio(self.natural_width, self.natural_height)
    }
}

/// Height over width, or `None` when either side is zero or invalid
pub fn aspect_ratio(width: f32, height: f32) -> Option<f32> {
    if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
        Some(height / width)
    } else {
        None
    }
}

/// Playback state for `<video>` elements
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MediaState {
    /// Number of `load()` requests
    pub loads: u32,
    /// Whether the last `play()` succeeded
    pub playing: bool,
    /// When set, `play()` is refused like a browser autoplay policy would
    pub autoplay_blocked: bool,
}

/// An element
#[derive(Clone, Debug)]
pub struct Node {
    tag: String,
    id: Option<String>,
    classes: SmallVec<[String; 4]>,
    attributes: IndexMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Rect,
    style: Style,
    image: Option<ImageInfo>,
    media: Option<MediaState>,
}

impl Node {
    fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let image = (tag == "img").then(ImageInfo::default);
        let media = (tag == "video").then(MediaState::default);
        Self {
            tag,
            id: None,
            classes: SmallVec::new(),
            attributes: IndexMap::new(),
            parent: None,
            children: Vec::new(),
            rect: Rect::ZERO,
            style: Style::default(),
            image,
            media,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn image(&self) -> Option<&ImageInfo> {
        self.image.as_ref()
    }

    pub fn media(&self) -> Option<&MediaState> {
        self.media.as_ref()
    }
}

// ============================================================================
// Document
// ============================================================================

/// The element tree plus pointer bookkeeping
#[derive(Debug)]
pub struct Document {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    /// Pointers currently pressed
    active_pointers: SmallVec<[u64; 4]>,
    /// Pointer id -> capturing element
    captures: SmallVec<[(u64, NodeId); 2]>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding only the root (`body`) element
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("body"));
        Self {
            nodes,
            root,
            active_pointers: SmallVec::new(),
            captures: SmallVec::new(),
        }
    }

    /// The root element; the final fallback for measurements and hit tests
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of elements, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node)
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.insert(Node::new(tag))
    }

    /// Append `child` as the last child of `parent`, detaching it first
    ///
    /// Appending a node under itself or one of its descendants is ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.exists(parent) || !self.exists(child) || self.contains(child, parent) {
            tracing::debug!("append_child({:?}, {:?}) ignored", parent, child);
            return;
        }
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Remove an element and its whole subtree
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root || !self.exists(node) {
            return;
        }
        self.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                stack.extend(removed.children);
            }
            self.captures.retain(|(_, target)| *target != id);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// The element immediately after `node` under the same parent
    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |n| self.parent(*n))
    }

    /// `node` followed by its ancestors: the bubbling path of an event
    pub fn composed_path(&self, node: NodeId) -> SmallVec<[NodeId; 16]> {
        if !self.exists(node) {
            return SmallVec::new();
        }
        std::iter::once(node).chain(self.ancestors(node)).collect()
    }

    /// All descendants of `node` in document (pre-)order, excluding `node`
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Whether `node` is `ancestor` or lies inside it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.exists(node) {
            return false;
        }
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    // =========================================================================
    // Identity, classes, attributes
    // =========================================================================

    pub fn set_id(&mut self, node: NodeId, id: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.id = Some(id.into());
        }
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(n) = self.nodes.get_mut(node) {
            if !n.has_class(class) {
                n.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes.get(node).is_some_and(|n| n.has_class(class))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(node).and_then(|n| n.attribute(name))
    }

    // =========================================================================
    // Layout measurements
    // =========================================================================

    /// Record the element's bounding client rectangle
    ///
    /// Returns the previous rectangle.
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) -> Option<Rect> {
        self.nodes
            .get_mut(node)
            .map(|n| std::mem::replace(&mut n.rect, rect))
    }

    /// Bounding client rectangle; zero for unknown nodes
    pub fn rect(&self, node: NodeId) -> Rect {
        self.nodes.get(node).map(|n| n.rect).unwrap_or(Rect::ZERO)
    }

    /// Measured width, like `clientWidth`
    pub fn client_width(&self, node: NodeId) -> f32 {
        self.rect(node).width
    }

    /// Deepest element under `point`, preferring later siblings
    ///
    /// `pointer-events` is inherited: a `none` element and everything under
    /// it are skipped unless a descendant sets `auto` again. Falls back to
    /// the root.
    pub fn hit_test(&self, point: Point) -> NodeId {
        let mut best = self.root;
        let mut stack = vec![(self.root, true)];
        while let Some((id, inherited)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let hittable = match node.style.pointer_events {
                Some(PointerEvents::Auto) => true,
                Some(PointerEvents::None) => false,
                None => inherited,
            };
            if id != self.root && hittable && node.rect.contains(point) {
                best = id;
            }
            // Children are visited after their parent; later siblings last.
            stack.extend(node.children.iter().rev().map(|&child| (child, hittable)));
        }
        best
    }

    // =========================================================================
    // Style
    // =========================================================================

    pub fn style(&self, node: NodeId) -> Option<&Style> {
        self.nodes.get(node).map(|n| &n.style)
    }

    /// Mutate the inline style; no-op for unknown nodes
    pub fn update_style(&mut self, node: NodeId, f: impl FnOnce(&mut Style)) {
        if let Some(n) = self.nodes.get_mut(node) {
            f(&mut n.style);
        }
    }

    // =========================================================================
    // Images and media
    // =========================================================================

    pub fn set_image(&mut self, node: NodeId, info: ImageInfo) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.image = Some(info);
        }
    }

    pub fn image(&self, node: NodeId) -> Option<&ImageInfo> {
        self.nodes.get(node).and_then(|n| n.image.as_ref())
    }

    pub fn media(&self, node: NodeId) -> Option<&MediaState> {
        self.nodes.get(node).and_then(|n| n.media.as_ref())
    }

    /// Refuse or allow future `play()` calls
    pub fn set_autoplay_blocked(&mut self, node: NodeId, blocked: bool) {
        if let Some(media) = self.nodes.get_mut(node).and_then(|n| n.media.as_mut()) {
            media.autoplay_blocked = blocked;
        }
    }

    /// Equivalent of `HTMLMediaElement.load()`
    pub fn load_media(&mut self, node: NodeId) -> Result<(), DomError> {
        let media = self.media_mut(node)?;
        media.loads += 1;
        media.playing = false;
        Ok(())
    }

    /// Equivalent of `HTMLMediaElement.play()`
    pub fn play_media(&mut self, node: NodeId) -> Result<(), DomError> {
        let media = self.media_mut(node)?;
        if media.autoplay_blocked {
            return Err(DomError::PlaybackBlocked(node));
        }
        media.playing = true;
        Ok(())
    }

    fn media_mut(&mut self, node: NodeId) -> Result<&mut MediaState, DomError> {
        let n = self
            .nodes
            .get_mut(node)
            .ok_or(DomError::NodeNotFound(node))?;
        n.media.as_mut().ok_or(DomError::NotMedia(node))
    }

    // =========================================================================
    // Pointers
    // =========================================================================

    /// Mark a pointer as pressed
    pub fn pointer_pressed(&mut self, pointer_id: u64) {
        if !self.active_pointers.contains(&pointer_id) {
            self.active_pointers.push(pointer_id);
        }
    }

    /// Mark a pointer as released; drops any capture it held
    pub fn pointer_released(&mut self, pointer_id: u64) {
        self.active_pointers.retain(|p| *p != pointer_id);
        self.captures.retain(|(p, _)| *p != pointer_id);
    }

    pub fn is_pointer_active(&self, pointer_id: u64) -> bool {
        self.active_pointers.contains(&pointer_id)
    }

    /// Route further events of `pointer_id` to `node`
    pub fn set_pointer_capture(&mut self, node: NodeId, pointer_id: u64) -> Result<(), DomError> {
        if !self.exists(node) {
            return Err(DomError::NodeNotFound(node));
        }
        if !self.is_pointer_active(pointer_id) {
            return Err(DomError::PointerNotActive(pointer_id));
        }
        self.captures.retain(|(p, _)| *p != pointer_id);
        self.captures.push((pointer_id, node));
        Ok(())
    }

    pub fn release_pointer_capture(&mut self, node: NodeId, pointer_id: u64) {
        self.captures
            .retain(|(p, target)| !(*p == pointer_id && *target == node));
    }

    /// Element currently capturing `pointer_id`
    pub fn pointer_capture(&self, pointer_id: u64) -> Option<NodeId> {
        self.captures
            .iter()
            .find(|(p, _)| *p == pointer_id)
            .map(|(_, node)| *node)
    }
}
