//! Video carousel
//!
//! One `<video>` element cycling through a configured list of sources with
//! previous/next controls and indicator dots.

use smallvec::SmallVec;
use vitrine_core::dom::{Document, NodeId};
use vitrine_core::events::{event_types, Event};

use crate::config::{CarouselSelectors, VideoCarouselConfig};

const ACTIVE_DOT_CLASS: &str = "active";

#[derive(Debug)]
pub struct VideoCarousel {
    root: NodeId,
    video: NodeId,
    source: NodeId,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    dots: Vec<NodeId>,
    sources: Vec<String>,
    current: usize,
}

impl VideoCarousel {
    /// Find the carousel and show the first video
    ///
    /// Returns `None` when the root, the video, its source element or the
    /// source list is missing.
    pub fn discover(
        doc: &mut Document,
        selectors: &CarouselSelectors,
        config: &VideoCarouselConfig,
    ) -> Option<Self> {
        let root = doc.select_first(doc.root(), &selectors.root)?;
        let video = doc.select_first(root, &selectors.video);
        let source = video.and_then(|v| doc.select_first(v, &selectors.source));
        let (Some(video), Some(source)) = (video, source) else {
            tracing::debug!("video carousel {:?} skipped: no video or source", root);
            return None;
        };
        if config.sources.is_empty() {
            tracing::debug!("video carousel {:?} has no sources, left inert", root);
            return None;
        }

        let mut carousel = Self {
            root,
            video,
            source,
            prev: doc.select_first(root, &selectors.prev),
            next: doc.select_first(root, &selectors.next),
            dots: doc.select_all(root, &selectors.dot),
            sources: config.sources.clone(),
            current: 0,
        };
        carousel.show(doc, 0);
        tracing::debug!(
            "video carousel {:?}: {} sources, {} dots",
            root,
            carousel.sources.len(),
            carousel.dots.len()
        );
        Some(carousel)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn video(&self) -> NodeId {
        self.video
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Source URL currently shown
    pub fn current_source(&self) -> Option<&str> {
        self.sources.get(self.current).map(String::as_str)
    }

    /// Show video `n`, wrapping around in both directions
    pub fn show(&mut self, doc: &mut Document, n: isize) {
        let len = self.sources.len() as isize;
        if len == 0 {
            return;
        }
        self.current = n.rem_euclid(len) as usize;
        let src = self.sources[self.current].clone();
        doc.set_attribute(self.source, "src", src);

        if let Err(err) = doc.load_media(self.video) {
            tracing::debug!("video carousel: load failed: {}", err);
        }
        if let Err(err) = doc.play_media(self.video) {
            tracing::trace!("video carousel: play refused: {}", err);
        }

        for &dot in &self.dots {
            doc.remove_class(dot, ACTIVE_DOT_CLASS);
        }
        if let Some(&dot) = self.dots.get(self.current) {
            doc.add_class(dot, ACTIVE_DOT_CLASS);
        }
    }

    /// Elements this carousel listens on during bubbling
    pub fn listened_nodes(&self) -> SmallVec<[NodeId; 8]> {
        let mut nodes = SmallVec::new();
        nodes.extend(self.prev);
        nodes.extend(self.next);
        nodes.extend(self.dots.iter().copied());
        nodes
    }

    /// Handle a click bubbling through `current`
    pub fn handle_event(&mut self, doc: &mut Document, current: NodeId, event: &mut Event) {
        if event.event_type != event_types::CLICK {
            return;
        }
        if Some(current) == self.prev {
            self.show(doc, self.current as isize - 1);
        } else if Some(current) == self.next {
            self.show(doc, self.current as isize + 1);
        } else if self.dots.contains(&current) {
            match doc
                .attribute(current, "data-index")
                .and_then(|index| index.trim().parse::<isize>().ok())
            {
                Some(index) => self.show(doc, index),
                None => tracing::trace!("video carousel: dot without numeric data-index"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::dom::DomError;

    fn build(sources: &[&str]) -> (Document, Option<VideoCarousel>, Vec<NodeId>) {
        let mut doc = Document::new();
        let body = doc.root();
        let root = doc.create_element("section");
        doc.set_id(root, "videos");
        doc.append_child(body, root);

        let video = doc.create_element("video");
        doc.set_id(video, "carouselVideo");
        doc.append_child(root, video);
        let source = doc.create_element("source");
        doc.append_child(video, source);

        for side in ["prev", "next"] {
            let control = doc.create_element("button");
            doc.add_class(control, "carousel-control");
            doc.add_class(control, side);
            doc.append_child(root, control);
        }

        let indicators = doc.create_element("div");
        doc.add_class(indicators, "carousel-indicators");
        doc.append_child(root, indicators);
        let mut dots = Vec::new();
        for i in 0..3 {
            let dot = doc.create_element("span");
            doc.add_class(dot, "dot");
            doc.set_attribute(dot, "data-index", i.to_string());
            doc.append_child(indicators, dot);
            dots.push(dot);
        }

        let config = VideoCarouselConfig {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let selectors = CarouselSelectors::compile(&config).unwrap();
        let carousel = VideoCarousel::discover(&mut doc, &selectors, &config);
        (doc, carousel, dots)
    }

    fn source_src(doc: &Document, carousel: &VideoCarousel) -> Option<String> {
        let source = doc.children(carousel.video())[0];
        doc.attribute(source, "src").map(str::to_string)
    }

    #[test]
    fn test_shows_first_on_discovery() {
        let (doc, carousel, dots) = build(&["a.mp4", "b.mp4", "c.mp4"]);
        let carousel = carousel.unwrap();
        assert_eq!(source_src(&doc, &carousel).as_deref(), Some("a.mp4"));
        assert!(doc.has_class(dots[0], "active"));
        let media = doc.media(carousel.video()).unwrap();
        assert_eq!(media.loads, 1);
        assert!(media.playing);
    }

    #[test]
    fn test_arrows_wrap() {
        let (mut doc, carousel, _) = build(&["a.mp4", "b.mp4", "c.mp4"]);
        let mut carousel = carousel.unwrap();
        let root = carousel.root();
        let prev = doc.query_selector(root, ".carousel-control.prev").unwrap().unwrap();
        let next = doc.query_selector(root, ".carousel-control.next").unwrap().unwrap();

        let mut click = Event::new(event_types::CLICK, prev);
        carousel.handle_event(&mut doc, prev, &mut click);
        assert_eq!(carousel.current(), 2);
        assert_eq!(carousel.current_source(), Some("c.mp4"));

        let mut click = Event::new(event_types::CLICK, next);
        carousel.handle_event(&mut doc, next, &mut click);
        assert_eq!(carousel.current(), 0);
    }

    #[test]
    fn test_dot_click_and_bad_index() {
        let (mut doc, carousel, dots) = build(&["a.mp4", "b.mp4", "c.mp4"]);
        let mut carousel = carousel.unwrap();

        let mut click = Event::new(event_types::CLICK, dots[1]);
        carousel.handle_event(&mut doc, dots[1], &mut click);
        assert_eq!(carousel.current(), 1);
        assert!(doc.has_class(dots[1], "active"));
        assert!(!doc.has_class(dots[0], "active"));

        doc.set_attribute(dots[2], "data-index", "last");
        let mut click = Event::new(event_types::CLICK, dots[2]);
        carousel.handle_event(&mut doc, dots[2], &mut click);
        assert_eq!(carousel.current(), 1);
    }

    #[test]
    fn test_blocked_playback_is_ignored() {
        let (mut doc, carousel, _) = build(&["a.mp4", "b.mp4"]);
        let mut carousel = carousel.unwrap();
        let video = carousel.video();
        doc.set_autoplay_blocked(video, true);
        assert_eq!(doc.play_media(video), Err(DomError::PlaybackBlocked(video)));

        carousel.show(&mut doc, 1);
        assert_eq!(source_src(&doc, &carousel).as_deref(), Some("b.mp4"));
        assert!(!doc.media(video).unwrap().playing);
    }

    #[test]
    fn test_no_sources_is_inert() {
        let (doc, carousel, dots) = build(&[]);
        assert!(carousel.is_none());
        assert!(!doc.has_class(dots[0], "active"));
    }
}
