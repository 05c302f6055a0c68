#![forbid(unsafe_code)]

//! Deck configuration: defaults plus `SCROLLDECK_*` environment overrides.
//!
//! # Environment Variables
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `SCROLLDECK_COOLDOWN_MS` | `navigation.cooldown` | integer ms |
//! | `SCROLLDECK_SAFETY_TIMEOUT_MS` | `navigation.safety_timeout` | integer ms |
//! | `SCROLLDECK_WHEEL_THRESHOLD` | `gestures.wheel_threshold` | px |
//! | `SCROLLDECK_WHEEL_IDLE_MS` | `gestures.wheel_idle_reset` | integer ms |
//! | `SCROLLDECK_SWIPE_THRESHOLD` | `gestures.swipe_threshold` | px |
//! | `SCROLLDECK_TIME_SCALE` | `timings` (all durations) | factor, `0` disables motion |
//! | `SCROLLDECK_GAP_RESERVE` | `overflow.gap_reserve` | px |
//! | `SCROLLDECK_PACKING` | `overflow.policy` | `greedy` or `sparse-tail[:min_fill]` |
//! | `SCROLLDECK_RESIZE_DELAY_MS` | `resize.delay` | integer ms |
//! | `SCROLLDECK_RESIZE_DEADLINE_MS` | `resize.hard_deadline` | integer ms |
//! | `SCROLLDECK_SMALL_VIEWPORT_MAX_WIDTH` | `resize.small_viewport_max_width` | px |
//! | `SCROLLDECK_CRITICAL_THRESHOLD` | `errors.critical_threshold` | integer |
//!
//! Unparsable values are ignored with a warning; the default stays.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use scrolldeck_core::gesture::GestureConfig;
use scrolldeck_core::logging::TARGET_NAV;
use scrolldeck_core::navigation::DEFAULT_SAFETY_TIMEOUT;
use scrolldeck_layout::{OverflowConfig, PackingPolicy};

use crate::error::ErrorPolicy;
use crate::resize_debounce::ResizeDebounceConfig;
use crate::transition::TransitionTimings;

/// Default `min_fill` for `SCROLLDECK_PACKING=sparse-tail`.
const DEFAULT_MIN_FILL: f32 = 0.35;

/// Throttling of navigation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavigationConfig {
    /// Minimum time between accepted navigations (default: 800ms).
    pub cooldown: Duration,
    /// Time after which a stuck transition no longer blocks (default: 3s).
    pub safety_timeout: Duration,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(800),
            safety_timeout: DEFAULT_SAFETY_TIMEOUT,
        }
    }
}

/// All runtime settings.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeckConfig {
    pub navigation: NavigationConfig,
    pub gestures: GestureConfig,
    pub timings: TransitionTimings,
    pub overflow: OverflowConfig,
    pub resize: ResizeDebounceConfig,
    pub errors: ErrorPolicy,
}

impl DeckConfig {
    /// Defaults with `SCROLLDECK_*` environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults with overrides read through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.apply_overrides(&lookup);
        config
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        let ms = |key: &str| parsed::<u64>(lookup, key).map(Duration::from_millis);

        if let Some(v) = ms("SCROLLDECK_COOLDOWN_MS") {
            self.navigation.cooldown = v;
        }
        if let Some(v) = ms("SCROLLDECK_SAFETY_TIMEOUT_MS") {
            self.navigation.safety_timeout = v;
        }
        if let Some(v) = px(lookup, "SCROLLDECK_WHEEL_THRESHOLD") {
            self.gestures.wheel_threshold = v;
        }
        if let Some(v) = ms("SCROLLDECK_WHEEL_IDLE_MS") {
            self.gestures.wheel_idle_reset = v;
        }
        if let Some(v) = px(lookup, "SCROLLDECK_SWIPE_THRESHOLD") {
            self.gestures.swipe_threshold = v;
        }
        if let Some(v) = px(lookup, "SCROLLDECK_TIME_SCALE") {
            self.timings = self.timings.scaled(v);
        }
        if let Some(v) = px(lookup, "SCROLLDECK_GAP_RESERVE") {
            self.overflow.gap_reserve = v;
        }
        if let Some(raw) = lookup("SCROLLDECK_PACKING") {
            match parse_packing(&raw) {
                Some(policy) => self.overflow.policy = policy,
                None => ignored("SCROLLDECK_PACKING", &raw),
            }
        }
        if let Some(v) = ms("SCROLLDECK_RESIZE_DELAY_MS") {
            self.resize.delay = v;
        }
        if let Some(v) = ms("SCROLLDECK_RESIZE_DEADLINE_MS") {
            self.resize.hard_deadline = v;
        }
        if let Some(v) = px(lookup, "SCROLLDECK_SMALL_VIEWPORT_MAX_WIDTH") {
            self.resize.small_viewport_max_width = v;
        }
        if let Some(v) = parsed::<u32>(lookup, "SCROLLDECK_CRITICAL_THRESHOLD") {
            self.errors.critical_threshold = v.max(1);
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            ignored(key, &raw);
            None
        }
    }
}

/// Finite, non-negative float.
fn px(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f32> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f32>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => {
            ignored(key, &raw);
            None
        }
    }
}

fn parse_packing(raw: &str) -> Option<PackingPolicy> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("greedy") {
        return Some(PackingPolicy::Greedy);
    }
    let rest = raw.strip_prefix("sparse-tail")?;
    let min_fill = match rest.strip_prefix(':') {
        Some(value) => value.trim().parse::<f32>().ok()?,
        None if rest.is_empty() => DEFAULT_MIN_FILL,
        None => return None,
    };
    (min_fill.is_finite() && (0.0..=1.0).contains(&min_fill))
        .then_some(PackingPolicy::AvoidSparseTail { min_fill })
}

fn ignored(key: &str, raw: &str) {
    tracing::warn!(target: TARGET_NAV, key, value = raw, "ignoring unparsable config override");
}
