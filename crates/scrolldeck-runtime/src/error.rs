#![forbid(unsafe_code)]

//! Error taxonomy and the centralized error reporter.
//!
//! Nothing on the input path returns an error to its caller. Failures are
//! handed to the [`ErrorReporter`], which logs them, counts them, and maps
//! each to a [`Degradation`] the caller applies.
//!
//! # Invariants
//!
//! 1. Errors are never retried.
//! 2. A consecutive run reaching [`ErrorPolicy::critical_threshold`] is
//!    escalated exactly once per run.
//! 3. Escalation never halts navigation.
//! 4. [`ErrorReporter::end_run`] is the only way a run ends.

use std::collections::VecDeque;
use std::fmt;

use scrolldeck_core::dom::DomWarning;
use scrolldeck_core::logging::TARGET_ERRORS;
use scrolldeck_layout::MeasureError;

use crate::stage::StageError;

/// Number of recent errors retained for inspection.
const RECENT_CAPACITY: usize = 16;

/// A runtime failure.
#[derive(Debug, Clone, PartialEq)]
pub enum DeckError {
    /// A referenced node or attribute was not found.
    MissingDom { what: String },
    /// A height calculation failed during overflow detection.
    Measurement {
        section: usize,
        panel: usize,
        source: MeasureError,
    },
    /// The stage failed to apply a cue.
    Animation { step: String, source: StageError },
    /// The consecutive error count reached the critical threshold.
    Critical { consecutive: u32 },
}

/// What the caller does about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// Skip the operation.
    Skip,
    /// Leave the panel as authored.
    LeaveUnsplit,
    /// Keep running the transition.
    ContinueTransition,
    /// Log distinctly; navigation continues.
    Escalate,
}

impl DeckError {
    /// The degradation this error maps to.
    #[must_use]
    pub fn degradation(&self) -> Degradation {
        match self {
            Self::MissingDom { .. } => Degradation::Skip,
            Self::Measurement { .. } => Degradation::LeaveUnsplit,
            Self::Animation { .. } => Degradation::ContinueTransition,
            Self::Critical { .. } => Degradation::Escalate,
        }
    }

    /// Short stable name, used as a log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingDom { .. } => "missing_dom",
            Self::Measurement { .. } => "measurement",
            Self::Animation { .. } => "animation",
            Self::Critical { .. } => "critical",
        }
    }

    /// Classify a stage failure while applying `step`: an absent node is
    /// [`DeckError::MissingDom`], anything else [`DeckError::Animation`].
    #[must_use]
    pub fn from_stage(step: impl Into<String>, source: StageError) -> Self {
        if source.is_missing() {
            Self::MissingDom {
                what: format!("{} ({})", source.message(), step.into()),
            }
        } else {
            Self::Animation {
                step: step.into(),
                source,
            }
        }
    }
}

impl From<&DomWarning> for DeckError {
    fn from(warning: &DomWarning) -> Self {
        Self::MissingDom {
            what: warning.to_string(),
        }
    }
}

impl fmt::Display for DeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDom { what } => write!(f, "missing {what}"),
            Self::Measurement {
                section,
                panel,
                source,
            } => write!(f, "measuring panel {section}.{panel}: {source}"),
            Self::Animation { step, source } => write!(f, "applying {step}: {source}"),
            Self::Critical { consecutive } => {
                write!(f, "{consecutive} consecutive errors")
            }
        }
    }
}

impl std::error::Error for DeckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Measurement { source, .. } => Some(source),
            Self::Animation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Reporter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorPolicy {
    /// Consecutive errors that trigger escalation (default: 10).
    pub critical_threshold: u32,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self {
            critical_threshold: 10,
        }
    }
}

/// Centralized logging and counting of runtime errors.
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    policy: ErrorPolicy,
    total: u64,
    consecutive: u32,
    escalated: bool,
    recent: VecDeque<DeckError>,
}

impl ErrorReporter {
    /// Reporter with the given policy.
    #[must_use]
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Log and count `error`, returning the degradation to apply.
    ///
    /// Returns [`Degradation::Escalate`] on the report that reaches the
    /// critical threshold.
    pub fn report(&mut self, error: DeckError) -> Degradation {
        self.total += 1;
        self.consecutive = self.consecutive.saturating_add(1);
        let action = error.degradation();

        match &error {
            DeckError::MissingDom { .. } => {
                tracing::debug!(target: TARGET_ERRORS, kind = error.kind(), "{error}");
            }
            DeckError::Critical { .. } => {
                tracing::error!(target: TARGET_ERRORS, kind = error.kind(), "{error}");
            }
            _ => {
                tracing::warn!(
                    target: TARGET_ERRORS,
                    kind = error.kind(),
                    consecutive = self.consecutive,
                    "{error}"
                );
            }
        }
        self.remember(error);

        if !self.escalated && self.consecutive >= self.policy.critical_threshold {
            self.escalated = true;
            let critical = DeckError::Critical {
                consecutive: self.consecutive,
            };
            tracing::error!(
                target: TARGET_ERRORS,
                kind = critical.kind(),
                total = self.total,
                "critical: {critical}; navigation continues"
            );
            self.remember(critical);
            return Degradation::Escalate;
        }
        action
    }

    /// End the current run of consecutive errors.
    pub fn end_run(&mut self) {
        if self.consecutive > 0 {
            tracing::debug!(
                target: TARGET_ERRORS,
                consecutive = self.consecutive,
                "error run ended"
            );
        }
        self.consecutive = 0;
        self.escalated = false;
    }

    /// Errors reported since construction.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Length of the current run.
    #[must_use]
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Whether the current run has been escalated.
    #[must_use]
    pub fn is_escalated(&self) -> bool {
        self.escalated
    }

    /// Most recent errors, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &DeckError> {
        self.recent.iter()
    }

    /// Current policy.
    #[must_use]
    pub fn policy(&self) -> &ErrorPolicy {
        &self.policy
    }

    fn remember(&mut self, error: DeckError) {
        if self.recent.len() == RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(error);
    }
}
