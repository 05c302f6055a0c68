#![forbid(unsafe_code)]

//! ScrollDeck public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from the internal crates, loads decks from JSON
//! ([`document`]), and offers a lightweight prelude for day-to-day usage.

use std::fmt;

pub mod document;

// --- Core re-exports -------------------------------------------------------

pub use scrolldeck_core::clock::{Clock, ManualClock};
pub use scrolldeck_core::content::{
    BackgroundSpec, ContentElement, Deck, ElementKind, Panel, Section, SectionMeta, StatGroup,
    StatItem, TitleAnimation,
};
pub use scrolldeck_core::dom::{DomError, DomWarning, ParsedDeck, VNode};
pub use scrolldeck_core::event::{
    DotTarget, Event, KeyCode, KeyEvent, Modifiers, TouchEvent, TouchPhase, WheelEvent,
};
pub use scrolldeck_core::geometry::Viewport;
pub use scrolldeck_core::navigation::{Direction, Position};

// --- Layout re-exports -----------------------------------------------------

pub use scrolldeck_layout::{EstimatingMeasurer, MeasurementTable, Measurer};

// --- Runtime re-exports ----------------------------------------------------

pub use scrolldeck_runtime::{
    Announcer, Cue, DeckConfig, DeckRuntime, EventOutcome, NavigateOutcome, NullStage,
    RecordingStage, Stage,
};

// --- Web re-exports --------------------------------------------------------

#[cfg(feature = "web")]
pub use scrolldeck_web::{StepDeck, StepResult, WebOutputs};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for loading and hosting decks.
#[derive(Debug)]
pub enum Error {
    /// I/O failure while reading content.
    Io(std::io::Error),
    /// Content JSON could not be decoded.
    Json(serde_json::Error),
    /// Markup did not follow the content contract.
    Content(DomError),
    /// The content has no sections.
    EmptyDeck,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid deck json: {err}"),
            Self::Content(err) => write!(f, "invalid deck markup: {err}"),
            Self::EmptyDeck => write!(f, "deck has no sections"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Content(err) => Some(err),
            Self::EmptyDeck => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<DomError> for Error {
    fn from(err: DomError) -> Self {
        Self::Content(err)
    }
}

/// Standard result type for scrolldeck APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Install a JSON tracing subscriber filtered by `RUST_LOG`.
///
/// Returns `false` if a global subscriber was already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    scrolldeck_core::logging::init_json_subscriber()
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Deck, DeckConfig, DeckRuntime, Direction, Error, Event, EventOutcome, KeyCode, KeyEvent,
        NavigateOutcome, Position, Result, Stage, Viewport,
    };

    #[cfg(feature = "web")]
    pub use crate::{StepDeck, WebOutputs};

    pub use crate::{core, document, layout, runtime};
}

pub use scrolldeck_core as core;
pub use scrolldeck_layout as layout;
pub use scrolldeck_runtime as runtime;
#[cfg(feature = "web")]
pub use scrolldeck_web as web;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as _;

    #[test]
    fn error_display_and_source() {
        assert_eq!(Error::EmptyDeck.to_string(), "deck has no sections");
        let err = Error::from(DomError::MissingContainer);
        assert_eq!(
            err.to_string(),
            "invalid deck markup: no element with class \"sections\" found"
        );
        assert!(err.source().is_some());
        assert!(Error::EmptyDeck.source().is_none());
    }

    #[test]
    fn loaded_deck_drives_runtime() {
        let deck = document::from_json_str(
            r#"{ "sections": [
                { "title": "A", "panels": [{ "elements": [{ "type": "body", "text": "a" }] }] },
                { "title": "B", "panels": [{ "elements": [{ "type": "body", "text": "b" }] }] }
            ] }"#,
        )
        .unwrap();
        let viewport = Viewport::new(1280.0, 800.0);
        let mut rt = DeckRuntime::new(
            deck,
            DeckConfig::default(),
            viewport,
            NullStage,
            EstimatingMeasurer::for_viewport(viewport, 24.0),
        );
        rt.mount();
        let outcome = rt.navigate(Direction::Forward, std::time::Duration::ZERO);
        assert!(outcome.is_started());
        rt.fast_forward();
        assert_eq!(rt.position(), Position::new(1, 0));
    }
}
