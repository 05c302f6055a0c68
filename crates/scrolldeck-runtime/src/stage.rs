#![forbid(unsafe_code)]

//! The stage: the host surface that applies render cues.
//!
//! The runtime never touches a real DOM. Everything visual is expressed as
//! [`Cue`]s (one per active transition step per frame), layer commands, and
//! dot snapshots, handed to a [`Stage`]. Stage errors flow to the
//! [`ErrorReporter`](crate::error::ErrorReporter); the stage is never
//! retried.

use std::fmt;

use scrolldeck_core::content::Deck;
use scrolldeck_core::navigation::Position;

use crate::background::LayerCommand;
use crate::pagination::PaginationDot;
use crate::transition::Cue;

/// A stage failed to apply something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    message: String,
    missing: bool,
}

impl StageError {
    /// Error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            missing: false,
        }
    }

    /// The node the stage was asked to touch does not exist.
    #[must_use]
    pub fn missing(what: impl Into<String>) -> Self {
        Self {
            message: what.into(),
            missing: true,
        }
    }

    /// The message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the failure was an absent node rather than a failed update.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.missing
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StageError {}

/// Host surface that applies render output.
pub trait Stage {
    /// Apply one step's progress sample.
    fn apply(&mut self, cue: &Cue) -> Result<(), StageError>;

    /// Apply background layer commands outside a transition (initial state).
    fn apply_layers(&mut self, _commands: &[LayerCommand]) -> Result<(), StageError> {
        Ok(())
    }

    /// Replace the pagination dots.
    fn refresh_dots(&mut self, _dots: &[PaginationDot]) -> Result<(), StageError> {
        Ok(())
    }

    /// The live panel structure changed (initial mount or re-split); show
    /// `position` with `title` without animating.
    fn structure_changed(
        &mut self,
        _deck: &Deck,
        _position: Position,
        _title: &str,
    ) -> Result<(), StageError> {
        Ok(())
    }
}

/// Stage that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStage;

impl Stage for NullStage {
    fn apply(&mut self, _cue: &Cue) -> Result<(), StageError> {
        Ok(())
    }
}

/// Something a [`RecordingStage`] received.
#[derive(Debug, Clone, PartialEq)]
pub enum StageRecord {
    Cue(Cue),
    Layers(Vec<LayerCommand>),
    Dots(Vec<PaginationDot>),
    Structure { position: Position, title: String },
}

/// Stage that records everything, with optional injected failures.
#[derive(Debug, Clone, Default)]
pub struct RecordingStage {
    records: Vec<StageRecord>,
    fail_when: Option<fn(&Cue) -> bool>,
    missing_when: Option<fn(&Cue) -> bool>,
}

impl RecordingStage {
    /// Empty recording stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every cue matching `predicate` (builder). Failed cues are still
    /// recorded.
    #[must_use]
    pub fn failing_when(mut self, predicate: fn(&Cue) -> bool) -> Self {
        self.fail_when = Some(predicate);
        self
    }

    /// Treat the actor of every cue matching `predicate` as absent
    /// (builder). Such cues are still recorded.
    #[must_use]
    pub fn missing_when(mut self, predicate: fn(&Cue) -> bool) -> Self {
        self.missing_when = Some(predicate);
        self
    }

    /// Everything received, in order.
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Received cues, in order.
    pub fn cues(&self) -> impl Iterator<Item = &Cue> {
        self.records.iter().filter_map(|r| match r {
            StageRecord::Cue(cue) => Some(cue),
            _ => None,
        })
    }

    /// The most recent dot snapshot.
    #[must_use]
    pub fn last_dots(&self) -> Option<&[PaginationDot]> {
        self.records.iter().rev().find_map(|r| match r {
            StageRecord::Dots(dots) => Some(dots.as_slice()),
            _ => None,
        })
    }

    /// Drain all records.
    pub fn take(&mut self) -> Vec<StageRecord> {
        std::mem::take(&mut self.records)
    }
}

impl Stage for RecordingStage {
    fn apply(&mut self, cue: &Cue) -> Result<(), StageError> {
        self.records.push(StageRecord::Cue(cue.clone()));
        if self.missing_when.is_some_and(|predicate| predicate(cue)) {
            return Err(StageError::missing(format!("no node for {}", cue.describe())));
        }
        match self.fail_when {
            Some(predicate) if predicate(cue) => Err(StageError::new(format!(
                "injected failure for {}",
                cue.describe()
            ))),
            _ => Ok(()),
        }
    }

    fn apply_layers(&mut self, commands: &[LayerCommand]) -> Result<(), StageError> {
        self.records.push(StageRecord::Layers(commands.to_vec()));
        Ok(())
    }

    fn refresh_dots(&mut self, dots: &[PaginationDot]) -> Result<(), StageError> {
        self.records.push(StageRecord::Dots(dots.to_vec()));
        Ok(())
    }

    fn structure_changed(
        &mut self,
        _deck: &Deck,
        position: Position,
        title: &str,
    ) -> Result<(), StageError> {
        self.records.push(StageRecord::Structure {
            position,
            title: title.to_string(),
        });
        Ok(())
    }
}
