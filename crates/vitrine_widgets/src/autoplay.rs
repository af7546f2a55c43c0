//! Pause/resume coordination between widgets
//!
//! Interacting with a compare widget must not be interrupted by a slider
//! rotating underneath it. The compare widget only knows the
//! [`AutoplayController`] contract; the page injects whichever slider owns
//! the autoplay timer.

use std::sync::Arc;

use vitrine_core::timer::{TimerHandle, TimerId};

/// Something with an autoplay timer that can be paused and resumed
///
/// Calls are fire-and-forget. Repeated calls are harmless and the most
/// recent signal wins.
pub trait AutoplayController: Send + Sync {
    /// Stop advancing until `resume` is called
    fn pause(&self);

    /// Start advancing again
    fn resume(&self);
}

/// A widget's link to an optional [`AutoplayController`]
///
/// Pauses immediately when an interaction starts and resumes after a delay
/// once it ends. Without a controller every call is a no-op.
#[derive(Clone)]
pub struct AutoplayLink {
    controller: Option<Arc<dyn AutoplayController>>,
    timers: TimerHandle,
    resume_delay_ms: u64,
}

impl std::fmt::Debug for AutoplayLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoplayLink")
            .field("linked", &self.controller.is_some())
            .field("resume_delay_ms", &self.resume_delay_ms)
            .finish()
    }
}

impl AutoplayLink {
    pub fn new(
        controller: Option<Arc<dyn AutoplayController>>,
        timers: TimerHandle,
        resume_delay_ms: u64,
    ) -> Self {
        Self {
            controller,
            timers,
            resume_delay_ms,
        }
    }

    /// Pause the controller right away
    pub fn interaction_started(&self) {
        if let Some(controller) = &self.controller {
            tracing::trace!("autoplay paused");
            controller.pause();
        }
    }

    /// Schedule a resume after the configured delay
    ///
    /// Every call schedules its own resume; earlier ones are not cancelled.
    pub fn interaction_ended(&self) -> Option<TimerId> {
        let controller = self.controller.clone()?;
        tracing::trace!("autoplay resume in {}ms", self.resume_delay_ms);
        Some(
            self.timers
                .set_timeout(self.resume_delay_ms, move |_| controller.resume()),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vitrine_core::dom::Document;

    /// Counts pause/resume calls
    #[derive(Default)]
    pub(crate) struct CountingController {
        pub pauses: AtomicUsize,
        pub resumes: AtomicUsize,
    }

    impl CountingController {
        pub fn pauses(&self) -> usize {
            self.pauses.load(Ordering::SeqCst)
        }

        pub fn resumes(&self) -> usize {
            self.resumes.load(Ordering::SeqCst)
        }
    }

    impl AutoplayController for CountingController {
        fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }

        fn resume(&self) {
            self.resumes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_pause_now_resume_later() {
        let timers = TimerHandle::new();
        let mut doc = Document::new();
        let counter = Arc::new(CountingController::default());
        let link = AutoplayLink::new(Some(counter.clone()), timers.clone(), 800);

        link.interaction_started();
        assert_eq!(counter.pauses(), 1);

        assert!(link.interaction_ended().is_some());
        timers.advance(799, &mut doc);
        assert_eq!(counter.resumes(), 0);
        timers.advance(1, &mut doc);
        assert_eq!(counter.resumes(), 1);
    }

    #[test]
    fn test_each_end_schedules_its_own_resume() {
        let timers = TimerHandle::new();
        let mut doc = Document::new();
        let counter = Arc::new(CountingController::default());
        let link = AutoplayLink::new(Some(counter.clone()), timers.clone(), 800);

        link.interaction_ended();
        link.interaction_ended();
        timers.advance(800, &mut doc);
        assert_eq!(counter.resumes(), 2);
    }

    #[test]
    fn test_unlinked_is_noop() {
        let timers = TimerHandle::new();
        let link = AutoplayLink::new(None, timers.clone(), 800);
        link.interaction_started();
        assert_eq!(link.interaction_ended(), None);
        assert_eq!(timers.pending(), 0);
    }
}
