#![forbid(unsafe_code)]

//! `scrolldeck-web` provides a WASM-friendly host for ScrollDeck.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes input events
//!   and viewport changes.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`. It provides the building
//! blocks a JS wrapper needs: a [`WebStage`] that captures render output as
//! serializable [`WebOutputs`] and a step runner ([`step_deck::StepDeck`]).

pub mod step_deck;

use std::cell::RefCell;
use std::rc::Rc;

use scrolldeck_core::navigation::Position;
use scrolldeck_runtime::{
    AnnounceError, Announcer, Cue, LayerCommand, PaginationDot, Stage, StageError,
};
use serde::Serialize;

pub use step_deck::{StepDeck, StepResult};

/// Log target for host-side events.
pub const TARGET_WEB: &str = "scrolldeck::web";

/// Web host error type.
#[derive(Debug)]
pub enum WebError {
    /// [`StepDeck::init`] was not called before stepping.
    NotMounted,
    /// [`StepDeck::init`] was called twice.
    AlreadyMounted,
    /// Output serialization failed.
    Json(serde_json::Error),
}

impl core::fmt::Display for WebError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotMounted => write!(f, "deck not mounted; call init() first"),
            Self::AlreadyMounted => write!(f, "deck already mounted"),
            Self::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl std::error::Error for WebError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for WebError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// A structure change the host must render without animating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureUpdate {
    pub position: Position,
    pub title: String,
    /// Live panel count per section.
    pub counts: Vec<usize>,
}

/// Captured render output of one step, for host consumption.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct WebOutputs {
    /// Cues in delivery order.
    pub cues: Vec<Cue>,
    /// Background layer commands applied outside a transition.
    pub layers: Vec<LayerCommand>,
    /// Latest dot snapshot, if the dots changed.
    pub dots: Option<Vec<PaginationDot>>,
    /// Latest structure change, if any.
    pub structure: Option<StructureUpdate>,
    /// Screen-reader announcements, in order.
    pub announcements: Vec<String>,
}

impl WebOutputs {
    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
            && self.layers.is_empty()
            && self.dots.is_none()
            && self.structure.is_none()
            && self.announcements.is_empty()
    }

    /// Serialize as a single JSON object for the JS bridge.
    pub fn to_json(&self) -> Result<String, WebError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Stage that captures everything into [`WebOutputs`].
#[derive(Debug, Default)]
pub struct WebStage {
    outputs: WebOutputs,
}

impl WebStage {
    /// Captured outputs.
    #[must_use]
    pub fn outputs(&self) -> &WebOutputs {
        &self.outputs
    }

    /// Take the captured outputs, leaving empty defaults.
    pub fn take_outputs(&mut self) -> WebOutputs {
        std::mem::take(&mut self.outputs)
    }

    pub(crate) fn announce(&mut self, text: String) {
        self.outputs.announcements.push(text);
    }
}

impl Stage for WebStage {
    fn apply(&mut self, cue: &Cue) -> Result<(), StageError> {
        self.outputs.cues.push(cue.clone());
        Ok(())
    }

    fn apply_layers(&mut self, commands: &[LayerCommand]) -> Result<(), StageError> {
        self.outputs.layers.extend_from_slice(commands);
        Ok(())
    }

    fn refresh_dots(&mut self, dots: &[PaginationDot]) -> Result<(), StageError> {
        self.outputs.dots = Some(dots.to_vec());
        Ok(())
    }

    fn structure_changed(
        &mut self,
        deck: &scrolldeck_core::content::Deck,
        position: Position,
        title: &str,
    ) -> Result<(), StageError> {
        self.outputs.structure = Some(StructureUpdate {
            position,
            title: title.to_string(),
            counts: deck.counts(),
        });
        Ok(())
    }
}

/// Announcer that queues `(section, panel)` pairs for the step runner, which
/// turns them into text with the deck's titles.
#[derive(Debug, Clone, Default)]
pub struct QueuedAnnouncer {
    queue: Rc<RefCell<Vec<(usize, usize)>>>,
}

impl QueuedAnnouncer {
    /// Drain queued announcements.
    pub fn drain(&self) -> Vec<(usize, usize)> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

impl Announcer for QueuedAnnouncer {
    fn announce(&mut self, section: usize, panel: usize) -> Result<(), AnnounceError> {
        self.queue.borrow_mut().push((section, panel));
        Ok(())
    }
}
