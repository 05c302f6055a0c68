#![forbid(unsafe_code)]

//! Gesture recognition: raw input events to navigation intents.
//!
//! [`GestureRecognizer`] is a small stateful processor that turns wheel
//! deltas, touch swipes, and key presses into [`Intent`]s. It does not
//! throttle; the runtime applies cooldown and serialization afterwards.
//!
//! # State Machine
//!
//! - **Wheel accumulator**: deltas add up until `|sum| ≥ wheel_threshold`,
//!   which emits one step and clears the sum. A pause longer than
//!   `wheel_idle_reset` discards a partial sum.
//! - **Swipe tracker**: `Start` records the origin, `Move` tracks the largest
//!   excursion, `End` compares net travel with `swipe_threshold`. Swiping
//!   up (finger moves towards the top) means forward.
//!
//! # Invariants
//!
//! 1. At most one intent per event.
//! 2. Key releases and browser command chords (Ctrl/Alt/Super) never
//!    produce an intent.
//! 3. After `reset()`, both trackers are idle.
//!
//! # Failure Modes
//!
//! - Non-finite wheel deltas or touch coordinates are dropped.
//! - A `Move`/`End` without a preceding `Start` is ignored.

use std::time::Duration;

use crate::debug;
use crate::event::{DotTarget, Event, KeyCode, KeyEventKind, Modifiers, TouchPhase};
use crate::geometry::Viewport;
use crate::navigation::Direction;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds and timeouts for gesture recognition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GestureConfig {
    /// Accumulated wheel delta (px) that triggers one step (default: 30).
    pub wheel_threshold: f32,
    /// Pause after which a partial wheel sum is discarded (default: 200ms).
    pub wheel_idle_reset: Duration,
    /// Minimum vertical travel (px) for a swipe (default: 50).
    pub swipe_threshold: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            wheel_threshold: 30.0,
            wheel_idle_reset: Duration::from_millis(200),
            swipe_threshold: 50.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// What the user asked for, before throttling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Move one panel in a direction.
    Step(Direction),
    /// Jump to the first section.
    First,
    /// Jump to the last section.
    Last,
    /// Activate a pagination dot.
    Dot(DotTarget),
    /// Viewport changed size.
    Resize(Viewport),
    /// Device orientation changed.
    OrientationChange(Viewport),
    /// Advance animations.
    Tick,
}

#[derive(Debug, Clone, Copy)]
struct WheelState {
    sum: f32,
    last: Duration,
}

#[derive(Debug, Clone, Copy)]
struct SwipeState {
    start_y: f32,
    max_travel: f32,
}

// ---------------------------------------------------------------------------
// GestureRecognizer
// ---------------------------------------------------------------------------

/// Stateful recognizer from [`Event`] to [`Intent`].
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    wheel: Option<WheelState>,
    swipe: Option<SwipeState>,
}

impl GestureRecognizer {
    /// Create a recognizer with the given configuration.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            wheel: None,
            swipe: None,
        }
    }

    /// Process one event at monotonic time `now`.
    pub fn process(&mut self, event: &Event, now: Duration) -> Option<Intent> {
        match event {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release || key.has_command_modifier() {
                    return None;
                }
                match key.code {
                    KeyCode::Down | KeyCode::Right | KeyCode::PageDown => {
                        Some(Intent::Step(Direction::Forward))
                    }
                    KeyCode::Up | KeyCode::Left | KeyCode::PageUp => {
                        Some(Intent::Step(Direction::Backward))
                    }
                    KeyCode::Char(' ') if key.modifiers.contains(Modifiers::SHIFT) => {
                        Some(Intent::Step(Direction::Backward))
                    }
                    KeyCode::Char(' ') => Some(Intent::Step(Direction::Forward)),
                    KeyCode::Home => Some(Intent::First),
                    KeyCode::End => Some(Intent::Last),
                    _ => None,
                }
            }
            Event::Wheel(wheel) => self.on_wheel(wheel.delta_y, now),
            Event::Touch(touch) => self.on_touch(touch.phase, touch.y),
            Event::DotActivated(target) => Some(Intent::Dot(*target)),
            Event::Resize(viewport) => Some(Intent::Resize(*viewport)),
            Event::OrientationChange(viewport) => Some(Intent::OrientationChange(*viewport)),
            Event::Tick => Some(Intent::Tick),
        }
    }

    /// Whether a swipe is being tracked.
    #[inline]
    #[must_use]
    pub fn is_swiping(&self) -> bool {
        self.swipe.is_some()
    }

    /// Reset all gesture state to idle.
    pub fn reset(&mut self) {
        self.wheel = None;
        self.swipe = None;
    }

    /// Get a reference to the current configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    fn on_wheel(&mut self, delta_y: f32, now: Duration) -> Option<Intent> {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return None;
        }
        let mut state = match self.wheel {
            Some(state) if now.saturating_sub(state.last) <= self.config.wheel_idle_reset => state,
            _ => WheelState {
                sum: 0.0,
                last: now,
            },
        };
        state.sum += delta_y;
        state.last = now;

        if state.sum.abs() >= self.config.wheel_threshold {
            let direction = if state.sum > 0.0 {
                Direction::Forward
            } else {
                Direction::Backward
            };
            self.wheel = None;
            return Some(Intent::Step(direction));
        }
        self.wheel = Some(state);
        None
    }

    fn on_touch(&mut self, phase: TouchPhase, y: f32) -> Option<Intent> {
        if !y.is_finite() {
            return None;
        }
        match phase {
            TouchPhase::Start => {
                self.swipe = Some(SwipeState {
                    start_y: y,
                    max_travel: 0.0,
                });
                None
            }
            TouchPhase::Move => {
                if let Some(swipe) = self.swipe.as_mut() {
                    swipe.max_travel = swipe.max_travel.max((swipe.start_y - y).abs());
                }
                None
            }
            TouchPhase::End => {
                let swipe = self.swipe.take()?;
                let travel = swipe.start_y - y;
                if travel.abs() < self.config.swipe_threshold {
                    if swipe.max_travel >= self.config.swipe_threshold {
                        debug!(
                            target: crate::logging::TARGET_NAV,
                            max_travel = swipe.max_travel,
                            "swipe returned to origin; ignored"
                        );
                    }
                    return None;
                }
                Some(Intent::Step(if travel > 0.0 {
                    Direction::Forward
                } else {
                    Direction::Backward
                }))
            }
            TouchPhase::Cancel => {
                self.swipe = None;
                None
            }
        }
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyEvent, TouchEvent, WheelEvent};

    const T0: Duration = Duration::ZERO;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    #[test]
    fn arrow_keys_map_to_steps() {
        let mut g = GestureRecognizer::default();
        assert_eq!(
            g.process(&key(KeyCode::Down), T0),
            Some(Intent::Step(Direction::Forward))
        );
        assert_eq!(
            g.process(&key(KeyCode::PageUp), T0),
            Some(Intent::Step(Direction::Backward))
        );
        assert_eq!(g.process(&key(KeyCode::Home), T0), Some(Intent::First));
        assert_eq!(g.process(&key(KeyCode::End), T0), Some(Intent::Last));
        assert_eq!(g.process(&key(KeyCode::Escape), T0), None);
    }

    #[test]
    fn space_respects_shift() {
        let mut g = GestureRecognizer::default();
        assert_eq!(
            g.process(&key(KeyCode::Char(' ')), T0),
            Some(Intent::Step(Direction::Forward))
        );
        let shifted = Event::Key(KeyEvent::new(KeyCode::Char(' ')).with_modifiers(Modifiers::SHIFT));
        assert_eq!(
            g.process(&shifted, T0),
            Some(Intent::Step(Direction::Backward))
        );
    }

    #[test]
    fn releases_and_command_chords_are_ignored() {
        let mut g = GestureRecognizer::default();
        let release = Event::Key(KeyEvent::new(KeyCode::Down).with_kind(KeyEventKind::Release));
        assert_eq!(g.process(&release, T0), None);
        let chord = Event::Key(KeyEvent::new(KeyCode::Down).with_modifiers(Modifiers::CTRL));
        assert_eq!(g.process(&chord, T0), None);
    }

    #[test]
    fn wheel_accumulates_to_threshold() {
        let mut g = GestureRecognizer::default();
        assert_eq!(g.process(&Event::Wheel(WheelEvent::new(12.0)), ms(0)), None);
        assert_eq!(g.process(&Event::Wheel(WheelEvent::new(12.0)), ms(16)), None);
        assert_eq!(
            g.process(&Event::Wheel(WheelEvent::new(12.0)), ms(32)),
            Some(Intent::Step(Direction::Forward))
        );
        // Accumulator was cleared.
        assert_eq!(g.process(&Event::Wheel(WheelEvent::new(12.0)), ms(48)), None);
    }

    #[test]
    fn wheel_partial_sum_expires_after_idle() {
        let mut g = GestureRecognizer::default();
        assert_eq!(g.process(&Event::Wheel(WheelEvent::new(-20.0)), ms(0)), None);
        assert_eq!(g.process(&Event::Wheel(WheelEvent::new(-20.0)), ms(500)), None);
        assert_eq!(
            g.process(&Event::Wheel(WheelEvent::new(-20.0)), ms(520)),
            Some(Intent::Step(Direction::Backward))
        );
    }

    #[test]
    fn wheel_rejects_non_finite() {
        let mut g = GestureRecognizer::default();
        assert_eq!(
            g.process(&Event::Wheel(WheelEvent::new(f32::NAN)), T0),
            None
        );
    }

    #[test]
    fn swipe_up_is_forward() {
        let mut g = GestureRecognizer::default();
        g.process(&Event::Touch(TouchEvent::new(TouchPhase::Start, 600.0)), T0);
        g.process(&Event::Touch(TouchEvent::new(TouchPhase::Move, 500.0)), T0);
        assert!(g.is_swiping());
        assert_eq!(
            g.process(&Event::Touch(TouchEvent::new(TouchPhase::End, 420.0)), T0),
            Some(Intent::Step(Direction::Forward))
        );
        assert!(!g.is_swiping());
    }

    #[test]
    fn short_swipe_is_ignored() {
        let mut g = GestureRecognizer::default();
        g.process(&Event::Touch(TouchEvent::new(TouchPhase::Start, 300.0)), T0);
        assert_eq!(
            g.process(&Event::Touch(TouchEvent::new(TouchPhase::End, 320.0)), T0),
            None
        );
    }

    #[test]
    fn end_without_start_and_cancel() {
        let mut g = GestureRecognizer::default();
        assert_eq!(
            g.process(&Event::Touch(TouchEvent::new(TouchPhase::End, 0.0)), T0),
            None
        );
        g.process(&Event::Touch(TouchEvent::new(TouchPhase::Start, 0.0)), T0);
        g.process(&Event::Touch(TouchEvent::new(TouchPhase::Cancel, 0.0)), T0);
        assert_eq!(
            g.process(&Event::Touch(TouchEvent::new(TouchPhase::End, 400.0)), T0),
            None
        );
    }

    #[test]
    fn passthrough_events() {
        let mut g = GestureRecognizer::default();
        let vp = Viewport::new(390.0, 844.0);
        assert_eq!(g.process(&Event::Resize(vp), T0), Some(Intent::Resize(vp)));
        assert_eq!(g.process(&Event::Tick, T0), Some(Intent::Tick));
        assert_eq!(
            g.process(&Event::DotActivated(DotTarget::Section(2)), T0),
            Some(Intent::Dot(DotTarget::Section(2)))
        );
    }
}
