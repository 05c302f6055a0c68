#![forbid(unsafe_code)]

//! Navigation state: the single source of truth for the deck position.
//!
//! [`NavigationState`] records the current `(section, panel)` position, the
//! animation-in-progress flag, and the timestamps used for throttling. It is
//! an explicit store owned by the runtime and passed by reference; nothing in
//! the workspace holds it globally.
//!
//! Target computation is pure: [`step_target`], [`section_target`], and
//! [`panel_target`] take the current position and the live panel counts and
//! return where a request would land, or `None` when the request is a no-op.
//!
//! # Invariants
//!
//! 1. `section < section_count` and `panel < panel_count(section)` whenever
//!    the deck is non-empty and the state was updated through the setters.
//! 2. `is_animating` is set only by [`NavigationState::begin_transition`] and
//!    cleared only by [`NavigationState::finish_transition`].
//! 3. Boundaries are terminal: stepping past the last panel of the last
//!    section (or before the first panel of the first section) is a no-op.
//!
//! # Failure Modes
//!
//! - A transition whose completion never fires would hold `is_animating`
//!   forever; [`NavigationState::gate`] reports `SafetyOverride` once the
//!   safety timeout has elapsed so input is never locked permanently.
//! - Empty sections (zero panels) are skipped by neither helper; callers
//!   guarantee every section has at least one panel.

use std::cmp::Ordering;
use std::time::Duration;

/// Default safety timeout after which a stuck transition stops blocking input.
pub const DEFAULT_SAFETY_TIMEOUT: Duration = Duration::from_millis(3000);

// ---------------------------------------------------------------------------
// Direction / Position
// ---------------------------------------------------------------------------

/// Direction of travel through the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Towards later content.
    Forward,
    /// Towards earlier content.
    Backward,
}

impl Direction {
    /// `+1` for forward, `-1` for backward.
    #[inline]
    #[must_use]
    pub const fn sign(self) -> i8 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    /// The opposite direction.
    #[inline]
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    /// Direction of travel from `from` to `to`, or `None` if they are equal.
    #[must_use]
    pub fn between(from: Position, to: Position) -> Option<Self> {
        match to.cmp(&from) {
            Ordering::Greater => Some(Self::Forward),
            Ordering::Less => Some(Self::Backward),
            Ordering::Equal => None,
        }
    }
}

/// A `(section, panel)` position. Ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub section: usize,
    pub panel: usize,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(section: usize, panel: usize) -> Self {
        Self { section, panel }
    }

    /// Whether this position exists in `counts`.
    #[must_use]
    pub fn is_valid_in(&self, counts: &impl PanelCounts) -> bool {
        self.section < counts.section_count() && self.panel < counts.panel_count(self.section)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.section, self.panel)
    }
}

/// Live panel counts per section.
pub trait PanelCounts {
    /// Number of sections.
    fn section_count(&self) -> usize;

    /// Number of panels in `section` (0 for out-of-range sections).
    fn panel_count(&self, section: usize) -> usize;
}

impl PanelCounts for [usize] {
    fn section_count(&self) -> usize {
        self.len()
    }

    fn panel_count(&self, section: usize) -> usize {
        self.get(section).copied().unwrap_or(0)
    }
}

impl PanelCounts for Vec<usize> {
    fn section_count(&self) -> usize {
        self.as_slice().section_count()
    }

    fn panel_count(&self, section: usize) -> usize {
        self.as_slice().panel_count(section)
    }
}

// ---------------------------------------------------------------------------
// Target computation
// ---------------------------------------------------------------------------

/// Where a forward/backward step from `from` lands, or `None` at a boundary.
#[must_use]
pub fn step_target(
    from: Position,
    direction: Direction,
    counts: &impl PanelCounts,
) -> Option<Position> {
    let sections = counts.section_count();
    if from.section >= sections {
        return None;
    }
    match direction {
        Direction::Forward => {
            let panels = counts.panel_count(from.section);
            if from.panel + 1 < panels {
                Some(Position::new(from.section, from.panel + 1))
            } else if from.section + 1 < sections {
                Some(Position::new(from.section + 1, 0))
            } else {
                None
            }
        }
        Direction::Backward => {
            if from.panel > 0 {
                Some(Position::new(from.section, from.panel - 1))
            } else if from.section > 0 {
                let prev = from.section - 1;
                let last = counts.panel_count(prev).saturating_sub(1);
                Some(Position::new(prev, last))
            } else {
                None
            }
        }
    }
}

/// Direct jump to panel 0 of `section`.
///
/// `None` when `section` is the current section or out of range.
#[must_use]
pub fn section_target(
    from: Position,
    section: usize,
    counts: &impl PanelCounts,
) -> Option<(Position, Direction)> {
    if section == from.section || section >= counts.section_count() {
        return None;
    }
    let to = Position::new(section, 0);
    Direction::between(from, to).map(|dir| (to, dir))
}

/// Direct jump to an exact panel.
///
/// `None` when `to` equals `from` or does not exist.
#[must_use]
pub fn panel_target(
    from: Position,
    to: Position,
    counts: &impl PanelCounts,
) -> Option<(Position, Direction)> {
    if !to.is_valid_in(counts) {
        return None;
    }
    Direction::between(from, to).map(|dir| (to, dir))
}

// ---------------------------------------------------------------------------
// NavigationState
// ---------------------------------------------------------------------------

/// Outcome of the navigation gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Navigation may proceed.
    Open,
    /// Too soon after the last accepted navigation.
    Cooldown { remaining: Duration },
    /// A transition is in progress and the safety timeout has not elapsed.
    Animating { elapsed: Duration },
    /// A transition is still flagged in progress but has exceeded the safety
    /// timeout; navigation may proceed.
    SafetyOverride { stale_for: Duration },
}

impl Gate {
    /// Whether this gate allows a navigation.
    #[inline]
    #[must_use]
    pub const fn allows(&self) -> bool {
        matches!(self, Self::Open | Self::SafetyOverride { .. })
    }
}

/// Current position, animation flag, and throttling timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    position: Position,
    is_animating: bool,
    last_navigation: Option<Duration>,
    animation_start: Option<Duration>,
    safety_timeout: Duration,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationState {
    /// State at `(0, 0)`, idle, with the default safety timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            position: Position::new(0, 0),
            is_animating: false,
            last_navigation: None,
            animation_start: None,
            safety_timeout: DEFAULT_SAFETY_TIMEOUT,
        }
    }

    /// Override the safety timeout (builder).
    #[must_use]
    pub const fn with_safety_timeout(mut self, timeout: Duration) -> Self {
        self.safety_timeout = timeout;
        self
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current section index.
    #[inline]
    #[must_use]
    pub const fn current_section(&self) -> usize {
        self.position.section
    }

    /// Current panel index within the current section.
    #[inline]
    #[must_use]
    pub const fn current_panel(&self) -> usize {
        self.position.panel
    }

    /// Whether a transition is in progress.
    #[inline]
    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.is_animating
    }

    /// Time of the last accepted navigation.
    #[inline]
    #[must_use]
    pub const fn last_navigation_time(&self) -> Option<Duration> {
        self.last_navigation
    }

    /// Start time of the in-progress transition.
    #[inline]
    #[must_use]
    pub const fn animation_start_time(&self) -> Option<Duration> {
        self.animation_start
    }

    /// Configured safety timeout.
    #[inline]
    #[must_use]
    pub const fn safety_timeout(&self) -> Duration {
        self.safety_timeout
    }

    /// Evaluate the navigation gate at `now` for the given cooldown.
    #[must_use]
    pub fn gate(&self, now: Duration, cooldown: Duration) -> Gate {
        if let Some(last) = self.last_navigation {
            let since = now.saturating_sub(last);
            if since < cooldown {
                return Gate::Cooldown {
                    remaining: cooldown - since,
                };
            }
        }
        if self.is_animating {
            let elapsed = self
                .animation_start
                .map_or(Duration::ZERO, |start| now.saturating_sub(start));
            if elapsed < self.safety_timeout {
                return Gate::Animating { elapsed };
            }
            return Gate::SafetyOverride {
                stale_for: elapsed - self.safety_timeout,
            };
        }
        Gate::Open
    }

    /// Whether a navigation may start at `now`.
    #[must_use]
    pub fn can_navigate(&self, now: Duration, cooldown: Duration) -> bool {
        self.gate(now, cooldown).allows()
    }

    /// Record an accepted navigation to `to` starting at `now`.
    pub fn begin_transition(&mut self, to: Position, now: Duration) {
        self.position = to;
        self.is_animating = true;
        self.last_navigation = Some(now);
        self.animation_start = Some(now);
    }

    /// Clear the animation flag. Called from the master completion callback.
    pub fn finish_transition(&mut self) {
        self.is_animating = false;
        self.animation_start = None;
    }

    /// Move to `position` without a transition, clamped into `counts`.
    ///
    /// Used for the initial position and after the panel structure changes.
    pub fn set_position(&mut self, position: Position, counts: &impl PanelCounts) {
        self.position = clamp_position(position, counts);
    }

    /// Re-clamp the current position after the panel structure changed.
    pub fn clamp_to(&mut self, counts: &impl PanelCounts) {
        self.position = clamp_position(self.position, counts);
    }
}

fn clamp_position(position: Position, counts: &impl PanelCounts) -> Position {
    let sections = counts.section_count();
    if sections == 0 {
        return Position::default();
    }
    let section = position.section.min(sections - 1);
    let panels = counts.panel_count(section);
    Position::new(section, position.panel.min(panels.saturating_sub(1)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MS_50: Duration = Duration::from_millis(50);
    const MS_200: Duration = Duration::from_millis(200);
    const MS_250: Duration = Duration::from_millis(250);

    fn counts() -> Vec<usize> {
        vec![1, 3, 2]
    }

    #[test]
    fn forward_advances_panel_then_section() {
        let c = counts();
        assert_eq!(
            step_target(Position::new(1, 0), Direction::Forward, &c),
            Some(Position::new(1, 1))
        );
        assert_eq!(
            step_target(Position::new(1, 2), Direction::Forward, &c),
            Some(Position::new(2, 0))
        );
    }

    #[test]
    fn backward_lands_on_last_panel_of_previous_section() {
        let c = counts();
        assert_eq!(
            step_target(Position::new(2, 0), Direction::Backward, &c),
            Some(Position::new(1, 2))
        );
        assert_eq!(
            step_target(Position::new(1, 0), Direction::Backward, &c),
            Some(Position::new(0, 0))
        );
    }

    #[test]
    fn boundaries_are_terminal() {
        let c = counts();
        assert_eq!(step_target(Position::new(0, 0), Direction::Backward, &c), None);
        assert_eq!(step_target(Position::new(2, 1), Direction::Forward, &c), None);
    }

    #[test]
    fn section_jump_targets_first_panel() {
        let c = counts();
        assert_eq!(
            section_target(Position::new(2, 1), 1, &c),
            Some((Position::new(1, 0), Direction::Backward))
        );
        assert_eq!(
            section_target(Position::new(0, 0), 2, &c),
            Some((Position::new(2, 0), Direction::Forward))
        );
    }

    #[test]
    fn section_jump_to_current_or_missing_is_ignored() {
        let c = counts();
        assert_eq!(section_target(Position::new(1, 2), 1, &c), None);
        assert_eq!(section_target(Position::new(1, 2), 7, &c), None);
    }

    #[test]
    fn panel_jump_within_section() {
        let c = counts();
        assert_eq!(
            panel_target(Position::new(1, 2), Position::new(1, 0), &c),
            Some((Position::new(1, 0), Direction::Backward))
        );
        assert_eq!(panel_target(Position::new(1, 2), Position::new(1, 2), &c), None);
        assert_eq!(panel_target(Position::new(1, 2), Position::new(1, 3), &c), None);
    }

    #[test]
    fn cooldown_blocks_then_releases() {
        let mut state = NavigationState::new();
        state.begin_transition(Position::new(0, 1), Duration::ZERO);
        state.finish_transition();

        assert!(!state.can_navigate(MS_50, MS_200));
        assert_eq!(
            state.gate(MS_50, MS_200),
            Gate::Cooldown {
                remaining: Duration::from_millis(150)
            }
        );
        assert!(state.can_navigate(MS_250, MS_200));
    }

    #[test]
    fn animating_blocks_until_safety_timeout() {
        let mut state = NavigationState::new().with_safety_timeout(Duration::from_secs(1));
        state.begin_transition(Position::new(0, 1), Duration::ZERO);

        assert_eq!(
            state.gate(MS_250, MS_200),
            Gate::Animating { elapsed: MS_250 }
        );
        let late = Duration::from_millis(1200);
        assert_eq!(
            state.gate(late, MS_200),
            Gate::SafetyOverride {
                stale_for: MS_200
            }
        );
        assert!(state.can_navigate(late, MS_200));
    }

    #[test]
    fn finish_transition_clears_flag_only() {
        let mut state = NavigationState::new();
        state.begin_transition(Position::new(1, 0), MS_50);
        assert!(state.is_animating());
        assert_eq!(state.animation_start_time(), Some(MS_50));
        state.finish_transition();
        assert!(!state.is_animating());
        assert_eq!(state.animation_start_time(), None);
        assert_eq!(state.last_navigation_time(), Some(MS_50));
        assert_eq!(state.position(), Position::new(1, 0));
    }

    #[test]
    fn set_position_clamps() {
        let mut state = NavigationState::new();
        state.set_position(Position::new(9, 9), &counts());
        assert_eq!(state.position(), Position::new(2, 1));
        state.clamp_to(&vec![1, 1]);
        assert_eq!(state.position(), Position::new(1, 0));
    }

    #[test]
    fn direction_sign_and_between() {
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Backward.sign(), -1);
        assert_eq!(Direction::Forward.reversed(), Direction::Backward);
        assert_eq!(
            Direction::between(Position::new(0, 3), Position::new(1, 0)),
            Some(Direction::Forward)
        );
        assert_eq!(Direction::between(Position::new(1, 0), Position::new(1, 0)), None);
    }
}
