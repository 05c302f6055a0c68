#![forbid(unsafe_code)]

//! Timeline tracks: a delayed, eased fade that reports milestones.
//!
//! A [`Track`] is one step of a transition plan on a shared timeline: it
//! starts at `offset`, runs for `duration` with an [`Easing`], and queues
//! [`TrackEvent`]s as it crosses its start and end. Events are drained by
//! the caller after each tick rather than delivered through closures.
//!
//! # Invariants
//!
//! 1. `Started` fires at most once per play-through, on the tick that
//!    reaches `offset`.
//! 2. `Completed` fires at most once, after `Started` (possibly in the same
//!    tick).
//! 3. [`Track::finish`] fires whatever milestones are still pending.
//! 4. `drain_events()` clears the queue; events are not replayed.

use std::time::Duration;

use smallvec::SmallVec;

use super::{Animation, Delayed, Easing, Fade};

/// A milestone crossed by a [`Track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEvent {
    /// The track reached its start offset.
    Started,
    /// The track reached its end.
    Completed,
}

/// A delayed, eased fade with milestone events.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    anim: Delayed<Fade>,
    started_fired: bool,
    completed_fired: bool,
    events: SmallVec<[TrackEvent; 2]>,
}

impl Track {
    /// Track starting at `offset` and running for `duration`.
    #[must_use]
    pub fn new(offset: Duration, duration: Duration, easing: Easing) -> Self {
        Self {
            anim: Delayed::new(offset, Fade::new(duration).easing(easing)),
            started_fired: false,
            completed_fired: false,
            events: SmallVec::new(),
        }
    }

    /// Start offset on the timeline.
    #[must_use]
    pub fn offset(&self) -> Duration {
        self.anim.delay()
    }

    /// End time on the timeline.
    #[must_use]
    pub fn end(&self) -> Duration {
        self.anim.delay().saturating_add(self.anim.inner().duration())
    }

    /// Whether the track has started.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.anim.has_started()
    }

    /// Eased progress in [0, 1].
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.anim.value()
    }

    /// Jump to the end, queueing any pending milestones.
    pub fn finish(&mut self) {
        self.anim.finish();
        self.check_events();
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> SmallVec<[TrackEvent; 2]> {
        std::mem::take(&mut self.events)
    }

    fn check_events(&mut self) {
        if !self.started_fired && self.anim.has_started() {
            self.started_fired = true;
            self.events.push(TrackEvent::Started);
        }
        if self.started_fired && !self.completed_fired && self.anim.is_complete() {
            self.completed_fired = true;
            self.events.push(TrackEvent::Completed);
        }
    }
}

impl Animation for Track {
    fn tick(&mut self, dt: Duration) {
        self.anim.tick(dt);
        self.check_events();
    }

    fn is_complete(&self) -> bool {
        self.anim.is_complete()
    }

    fn value(&self) -> f32 {
        self.anim.value()
    }

    fn reset(&mut self) {
        self.anim.reset();
        self.started_fired = false;
        self.completed_fired = false;
        self.events.clear();
    }

    fn overshoot(&self) -> Duration {
        self.anim.overshoot()
    }

    fn finish(&mut self) {
        Track::finish(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_200: Duration = Duration::from_millis(200);

    #[test]
    fn track_bounds() {
        let track = Track::new(MS_100, MS_200, Easing::Linear);
        assert_eq!(track.offset(), MS_100);
        assert_eq!(track.end(), Duration::from_millis(300));
    }

    #[test]
    fn started_then_completed() {
        let mut track = Track::new(MS_100, MS_200, Easing::Linear);
        track.tick(Duration::from_millis(50));
        assert!(track.drain_events().is_empty());

        track.tick(Duration::from_millis(150));
        assert_eq!(track.drain_events().as_slice(), &[TrackEvent::Started]);
        assert!((track.progress() - 0.5).abs() < 1e-6);

        track.tick(MS_200);
        assert_eq!(track.drain_events().as_slice(), &[TrackEvent::Completed]);

        track.tick(MS_100);
        assert!(track.drain_events().is_empty());
    }

    #[test]
    fn large_tick_fires_both_in_order() {
        let mut track = Track::new(MS_100, MS_100, Easing::EaseOut);
        track.tick(Duration::from_secs(1));
        assert_eq!(
            track.drain_events().as_slice(),
            &[TrackEvent::Started, TrackEvent::Completed]
        );
    }

    #[test]
    fn zero_length_track_completes_at_offset() {
        let mut track = Track::new(MS_100, Duration::ZERO, Easing::Linear);
        track.tick(MS_100);
        assert_eq!(
            track.drain_events().as_slice(),
            &[TrackEvent::Started, TrackEvent::Completed]
        );
    }

    #[test]
    fn finish_flushes_pending_milestones_once() {
        let mut track = Track::new(MS_100, MS_200, Easing::Linear);
        track.tick(Duration::from_millis(150));
        assert_eq!(track.drain_events().as_slice(), &[TrackEvent::Started]);
        track.finish();
        assert_eq!(track.drain_events().as_slice(), &[TrackEvent::Completed]);
        track.finish();
        assert!(track.drain_events().is_empty());
    }

    #[test]
    fn reset_replays_milestones() {
        let mut track = Track::new(Duration::ZERO, MS_100, Easing::Linear);
        track.tick(MS_200);
        assert_eq!(track.drain_events().len(), 2);
        track.reset();
        track.tick(MS_200);
        assert_eq!(track.drain_events().len(), 2);
    }
}
