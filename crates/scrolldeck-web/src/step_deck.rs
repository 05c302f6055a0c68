#![forbid(unsafe_code)]

//! Step-based deck runner for WASM hosts.
//!
//! [`StepDeck`] drives a [`DeckRuntime`] without threads or blocking. The
//! host (JavaScript) controls the loop:
//!
//! 1. Push events via [`StepDeck::push_event`].
//! 2. Advance time via [`StepDeck::advance_time`].
//! 3. Call [`StepDeck::step`] once per animation frame.
//! 4. Read render output via [`StepDeck::take_outputs`].
//!
//! # Example
//!
//! ```ignore
//! use scrolldeck_web::StepDeck;
//! use scrolldeck_core::event::Event;
//! use core::time::Duration;
//!
//! let mut deck = StepDeck::new(content, DeckConfig::default(), viewport, measurer);
//! deck.init()?;
//!
//! // requestAnimationFrame loop
//! deck.push_event(Event::Wheel(WheelEvent::new(48.0)));
//! deck.advance_time(Duration::from_millis(16));
//! let result = deck.step()?;
//! let json = deck.take_outputs().to_json()?;
//! ```

use core::time::Duration;
use std::collections::VecDeque;

use scrolldeck_core::clock::{Clock, ManualClock};
use scrolldeck_core::content::Deck;
use scrolldeck_core::event::Event;
use scrolldeck_core::geometry::Viewport;
use scrolldeck_core::navigation::Position;
use scrolldeck_layout::{Measurer, SplitReport};
use scrolldeck_runtime::{
    DeckConfig, DeckRuntime, EventOutcome, NavigateOutcome, announcement_text,
};

use crate::{QueuedAnnouncer, TARGET_WEB, WebError, WebOutputs, WebStage};

/// Result of a single [`StepDeck::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Number of events processed during this step.
    pub events_processed: u32,
    /// Navigations started during this step.
    pub navigations: u32,
    /// Cues delivered by the frame tick.
    pub cues: usize,
    /// A transition completed during this step.
    pub completed: bool,
    /// A debounced resize re-split the panels during this step.
    pub resplit: bool,
    /// Whether a transition is still running.
    pub animating: bool,
    pub position: Position,
    /// Current frame index (monotonically increasing).
    pub frame_idx: u64,
}

/// Host-driven, non-blocking deck runner.
///
/// # Lifecycle
///
/// 1. [`StepDeck::new`] - create with content, config, and initial viewport.
/// 2. [`StepDeck::init`] - call once to split panels and emit initial state.
/// 3. [`StepDeck::step`] - call repeatedly from the host's frame loop.
/// 4. Read outputs after each step via [`StepDeck::take_outputs`].
pub struct StepDeck<M: Measurer> {
    runtime: DeckRuntime<WebStage, M>,
    clock: ManualClock,
    queue: VecDeque<Event>,
    announcer: QueuedAnnouncer,
    mounted: bool,
    frame_idx: u64,
}

impl<M: Measurer> StepDeck<M> {
    /// Create a runner for `deck` laid out for `viewport`.
    #[must_use]
    pub fn new(deck: Deck, config: DeckConfig, viewport: Viewport, measurer: M) -> Self {
        let announcer = QueuedAnnouncer::default();
        let runtime = DeckRuntime::new(deck, config, viewport, WebStage::default(), measurer)
            .with_announcer(announcer.clone());
        Self {
            runtime,
            clock: ManualClock::new(),
            queue: VecDeque::new(),
            announcer,
            mounted: false,
            frame_idx: 0,
        }
    }

    /// Split panels for the initial viewport and emit layers, dots, and
    /// structure into the outputs.
    ///
    /// Must be called exactly once before [`step`](Self::step).
    pub fn init(&mut self) -> Result<SplitReport, WebError> {
        if self.mounted {
            return Err(WebError::AlreadyMounted);
        }
        self.mounted = true;
        Ok(self.runtime.mount())
    }

    /// Process all pending events, then advance animations to the current
    /// clock time.
    pub fn step(&mut self) -> Result<StepResult, WebError> {
        if !self.mounted {
            return Err(WebError::NotMounted);
        }
        let now = self.clock.now_mono();

        let mut events_processed: u32 = 0;
        let mut navigations: u32 = 0;
        while let Some(event) = self.queue.pop_front() {
            events_processed += 1;
            if let EventOutcome::Navigate(NavigateOutcome::Started { .. }) =
                self.runtime.handle_event(&event, now)
            {
                navigations += 1;
            }
        }

        let frame = self.runtime.tick(now);
        self.collect_announcements();
        self.frame_idx += 1;

        Ok(StepResult {
            events_processed,
            navigations,
            cues: frame.cues,
            completed: frame.completed,
            resplit: frame.resplit,
            animating: self.runtime.is_animating(),
            position: self.runtime.position(),
            frame_idx: self.frame_idx,
        })
    }

    /// Queue an event; processed on the next [`step`](Self::step).
    pub fn push_event(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Queue a viewport resize.
    pub fn resize(&mut self, viewport: Viewport) {
        self.push_event(Event::Resize(viewport));
    }

    /// Advance the deterministic clock by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Set the deterministic clock to an absolute time. Moving backwards is
    /// ignored.
    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Current clock time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now_mono()
    }

    /// Take the captured outputs, leaving empty defaults.
    pub fn take_outputs(&mut self) -> WebOutputs {
        self.runtime.stage_mut().take_outputs()
    }

    /// Read the captured outputs without consuming them.
    #[must_use]
    pub fn outputs(&self) -> &WebOutputs {
        self.runtime.stage().outputs()
    }

    /// Access the runtime.
    #[must_use]
    pub fn runtime(&self) -> &DeckRuntime<WebStage, M> {
        &self.runtime
    }

    /// Mutably access the runtime.
    pub fn runtime_mut(&mut self) -> &mut DeckRuntime<WebStage, M> {
        &mut self.runtime
    }

    /// Whether [`init`](Self::init) has run.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Number of completed steps.
    #[must_use]
    pub fn frame_idx(&self) -> u64 {
        self.frame_idx
    }

    /// Events waiting for the next step.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    fn collect_announcements(&mut self) {
        for (section, panel) in self.announcer.drain() {
            let deck = self.runtime.deck();
            let Some(live) = deck.section(section) else {
                continue;
            };
            let text = announcement_text(
                section,
                panel,
                live.panel_count(),
                live.effective_title(panel),
            );
            tracing::debug!(target: TARGET_WEB, %text, "announcement");
            self.runtime.stage_mut().announce(text);
        }
    }
}
