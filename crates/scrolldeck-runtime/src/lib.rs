#![forbid(unsafe_code)]

//! ScrollDeck Runtime
//!
//! Ties the core and layout crates into a running deck: input events in,
//! render cues out.
//!
//! # Key Components
//!
//! - [`DeckRuntime`] - the controller: gating, transitions, resize, completion
//! - [`TransitionCoordinator`] - plans the choreography of one transition
//! - [`TransitionRunner`] - advances a plan on the frame clock
//! - [`BackgroundLayerStack`] - one layer per distinct background
//! - [`PaginationManager`] - section and panel dots
//! - [`ResizeDebouncer`] - latest-wins resize coalescing
//! - [`ErrorReporter`] - counts failures and escalates long runs
//! - [`Stage`] - the host surface that applies cues
//!
//! # Role in ScrollDeck
//! `scrolldeck-runtime` is the orchestrator. It consumes events from
//! `scrolldeck-core`, re-splits panels through `scrolldeck-layout` when the
//! viewport changes, and hands everything visual to a [`Stage`]. It never
//! touches a real DOM; hosts (see `scrolldeck-web`) do.

pub mod announce;
pub mod background;
pub mod config;
pub mod deck;
pub mod error;
pub mod pagination;
pub mod resize_debounce;
pub mod stage;
pub mod transition;

pub use announce::{AnnounceError, Announcer, LogAnnouncer, RecordingAnnouncer, announcement_text};
pub use background::{
    BackgroundLayer, BackgroundLayerStack, LayerChange, LayerCommand, LayerId, LayerKey,
};
pub use config::{DeckConfig, NavigationConfig};
pub use deck::{DeckRuntime, EventOutcome, FrameReport, NavigateOutcome};
pub use error::{DeckError, Degradation, ErrorPolicy, ErrorReporter};
pub use pagination::{
    DotActivation, DotCommand, DotKind, GroupVisibility, PaginationDot, PaginationManager,
};
pub use resize_debounce::{DebounceAction, DebounceStats, ResizeDebounceConfig, ResizeDebouncer};
pub use stage::{NullStage, RecordingStage, Stage, StageError, StageRecord};
pub use transition::{
    Action, Actor, Cue, TransitionCoordinator, TransitionPlan, TransitionRunner, TransitionStep,
    TransitionTimings,
};
