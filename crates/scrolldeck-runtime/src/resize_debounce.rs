#![forbid(unsafe_code)]

//! Resize debouncer for the overflow re-split.
//!
//! Viewport changes arrive in bursts (window drags, orientation flips,
//! mobile toolbars collapsing). Re-splitting is comparatively expensive, so
//! the debouncer coalesces a burst into a single apply:
//!
//! - **Latest-wins**: only the final viewport of a burst is applied.
//! - **Bounded latency**: a pending viewport applies within `hard_deadline`
//!   of the first event in the burst, even if events keep arriving.
//! - **Small-viewport gate**: changes where neither the applied nor the new
//!   viewport is small are recorded without a re-split. Orientation changes
//!   bypass the gate.
//!
//! # Usage
//!
//! ```ignore
//! let mut debouncer = ResizeDebouncer::new(ResizeDebounceConfig::default(), viewport);
//!
//! // On resize event
//! let action = debouncer.handle_resize(new_viewport, now);
//!
//! // On every frame
//! if let DebounceAction::Apply { viewport, .. } = debouncer.tick(now) {
//!     // re-run the overflow detector
//! }
//! ```
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `hard_deadline = 0` | Apply on the first event |
//! | Same viewport, nothing pending | `DebounceAction::None` |
//! | Clock goes backwards | Elapsed times saturate at zero |

use std::time::Duration;

use scrolldeck_core::geometry::Viewport;

/// Configuration for the resize debouncer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResizeDebounceConfig {
    /// Quiet period after the last event before applying (default: 250ms).
    pub delay: Duration,
    /// Maximum time a burst may defer an apply (default: 1000ms).
    pub hard_deadline: Duration,
    /// Widths at or below this are "small" (default: 1024px).
    pub small_viewport_max_width: f32,
}

impl Default for ResizeDebounceConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(250),
            hard_deadline: Duration::from_millis(1000),
            small_viewport_max_width: 1024.0,
        }
    }
}

/// What the caller should do after feeding the debouncer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebounceAction {
    /// Nothing to do.
    None,
    /// A viewport is pending; keep the current layout for now.
    Pending,
    /// Re-split for `viewport`.
    Apply {
        viewport: Viewport,
        /// Time from the first event of the burst to this apply.
        waited: Duration,
        /// True when the hard deadline forced the apply.
        forced_by_deadline: bool,
    },
}

/// Running counters, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceStats {
    pub events: u64,
    pub applies: u64,
    pub forced: u64,
    /// Changes recorded without a re-split (large viewports).
    pub skipped: u64,
}

/// Latest-wins resize debouncer.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    config: ResizeDebounceConfig,
    applied: Viewport,
    pending: Option<Viewport>,
    window_start: Option<Duration>,
    last_event: Option<Duration>,
    stats: DebounceStats,
}

impl ResizeDebouncer {
    /// Debouncer whose current layout was computed for `applied`.
    #[must_use]
    pub fn new(config: ResizeDebounceConfig, applied: Viewport) -> Self {
        Self {
            config,
            applied,
            pending: None,
            window_start: None,
            last_event: None,
            stats: DebounceStats::default(),
        }
    }

    /// Handle a viewport resize at `now`.
    pub fn handle_resize(&mut self, viewport: Viewport, now: Duration) -> DebounceAction {
        let max = self.config.small_viewport_max_width;
        if self.pending.is_none() && !viewport.is_small(max) && !self.applied.is_small(max) {
            self.stats.events += 1;
            if viewport != self.applied {
                self.stats.skipped += 1;
                self.applied = viewport;
            }
            return DebounceAction::None;
        }
        self.handle(viewport, now)
    }

    /// Handle an orientation change at `now`. Not subject to the
    /// small-viewport gate.
    pub fn handle_orientation_change(&mut self, viewport: Viewport, now: Duration) -> DebounceAction {
        self.handle(viewport, now)
    }

    fn handle(&mut self, viewport: Viewport, now: Duration) -> DebounceAction {
        self.stats.events += 1;
        self.last_event = Some(now);

        if self.pending.is_none() && viewport == self.applied {
            return DebounceAction::None;
        }

        self.pending = Some(viewport);
        let start = *self.window_start.get_or_insert(now);

        if now.saturating_sub(start) >= self.config.hard_deadline {
            return self.apply_pending(now, true);
        }
        DebounceAction::Pending
    }

    /// Advance to `now`; applies the pending viewport once the quiet period
    /// or the hard deadline has elapsed.
    pub fn tick(&mut self, now: Duration) -> DebounceAction {
        if self.pending.is_none() {
            return DebounceAction::None;
        }
        let Some(start) = self.window_start else {
            return DebounceAction::None;
        };

        if now.saturating_sub(start) >= self.config.hard_deadline {
            return self.apply_pending(now, true);
        }
        if let Some(last) = self.last_event
            && now.saturating_sub(last) >= self.config.delay
        {
            return self.apply_pending(now, false);
        }
        DebounceAction::Pending
    }

    /// Time until the pending viewport applies, if any is pending.
    #[must_use]
    pub fn time_until_apply(&self, now: Duration) -> Option<Duration> {
        self.pending?;
        let last = self.last_event?;
        let start = self.window_start?;

        let by_quiet = self.config.delay.saturating_sub(now.saturating_sub(last));
        let by_deadline = self
            .config
            .hard_deadline
            .saturating_sub(now.saturating_sub(start));
        Some(by_quiet.min(by_deadline))
    }

    /// Whether a viewport is waiting to be applied.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Viewport the current layout was computed for.
    #[inline]
    #[must_use]
    pub fn applied(&self) -> Viewport {
        self.applied
    }

    /// Running counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> DebounceStats {
        self.stats
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &ResizeDebounceConfig {
        &self.config
    }

    fn apply_pending(&mut self, now: Duration, forced: bool) -> DebounceAction {
        let Some(viewport) = self.pending.take() else {
            return DebounceAction::None;
        };
        let waited = self
            .window_start
            .take()
            .map_or(Duration::ZERO, |start| now.saturating_sub(start));

        self.applied = viewport;
        self.stats.applies += 1;
        if forced {
            self.stats.forced += 1;
        }

        DebounceAction::Apply {
            viewport,
            waited,
            forced_by_deadline: forced,
        }
    }
}
