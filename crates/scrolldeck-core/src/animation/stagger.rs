#![forbid(unsafe_code)]

//! Stagger utilities: cascading start offsets for a list of items.
//!
//! Used for the statistic charge-up: each donut in a panel begins its
//! fill slightly after the previous one.
//!
//! # Invariants
//!
//! 1. `stagger_offsets(0, ..)` returns an empty vec.
//! 2. First offset is always `Duration::ZERO`.
//! 3. Offsets are monotonically non-decreasing.
//! 4. For `Linear`, offset[i] = i * delay exactly.
//! 5. For eased modes the total span is still `(count - 1) * delay`; only
//!    the distribution follows the curve.
//!
//! # Failure Modes
//!
//! - Count of 1: returns `[Duration::ZERO]`.
//! - Zero delay: all offsets are `Duration::ZERO`.

use std::time::Duration;

use super::Easing;

/// How to distribute delay offsets across items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum StaggerMode {
    /// Equal spacing: offset[i] = i * delay.
    #[default]
    Linear,
    /// Gaps follow an easing curve over the full span.
    Eased(Easing),
}

/// Compute stagger delay offsets for `count` items.
#[must_use]
pub fn stagger_offsets(count: usize, delay: Duration, mode: StaggerMode) -> Vec<Duration> {
    match count {
        0 => return Vec::new(),
        1 => return vec![Duration::ZERO],
        _ => {}
    }

    match mode {
        StaggerMode::Linear => (0..count)
            .map(|i| delay.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)))
            .collect(),
        StaggerMode::Eased(easing) => {
            let span = delay.as_secs_f64() * (count - 1) as f64;
            (0..count)
                .map(|i| {
                    let t = i as f32 / (count - 1) as f32;
                    Duration::from_secs_f64(span * f64::from(easing.apply(t)))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_50: Duration = Duration::from_millis(50);
    const MS_100: Duration = Duration::from_millis(100);

    #[test]
    fn zero_and_single_counts() {
        assert!(stagger_offsets(0, MS_100, StaggerMode::Linear).is_empty());
        assert_eq!(
            stagger_offsets(1, MS_100, StaggerMode::Linear),
            vec![Duration::ZERO]
        );
    }

    #[test]
    fn linear_equal_spacing() {
        let offsets = stagger_offsets(4, MS_50, StaggerMode::Linear);
        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                MS_50,
                Duration::from_millis(100),
                Duration::from_millis(150)
            ]
        );
    }

    #[test]
    fn ease_in_gaps_increase() {
        let offsets = stagger_offsets(5, MS_100, StaggerMode::Eased(Easing::EaseIn));
        assert_eq!(offsets[0], Duration::ZERO);
        let gaps: Vec<Duration> = offsets.windows(2).map(|w| w[1] - w[0]).collect();
        for pair in gaps.windows(2) {
            assert!(pair[1] >= pair[0], "gaps should increase: {gaps:?}");
        }
    }

    #[test]
    fn eased_span_matches_linear_span() {
        let eased = stagger_offsets(5, MS_100, StaggerMode::Eased(Easing::EaseOut));
        let last = eased[4].as_millis();
        assert!((399..=400).contains(&last), "last offset {last}ms");
    }

    #[test]
    fn zero_delay_all_zero() {
        let offsets = stagger_offsets(5, Duration::ZERO, StaggerMode::Eased(Easing::EaseInOut));
        assert!(offsets.iter().all(|d| d.is_zero()));
    }

    #[test]
    fn offsets_are_monotonic() {
        for mode in [
            StaggerMode::Linear,
            StaggerMode::Eased(Easing::EaseIn),
            StaggerMode::Eased(Easing::EaseOut),
        ] {
            let offsets = stagger_offsets(10, MS_50, mode);
            for w in offsets.windows(2) {
                assert!(w[1] >= w[0], "{mode:?}");
            }
        }
    }
}
