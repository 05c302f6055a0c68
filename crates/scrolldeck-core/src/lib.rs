#![forbid(unsafe_code)]

//! Core: input events, gestures, animation primitives, the typed content
//! model, and navigation state.
//!
//! Everything here is host-agnostic and free of I/O. Time is passed in as a
//! monotonic [`std::time::Duration`]; content arrives either as a parsed
//! virtual DOM ([`dom`]) or as deserialized values ([`content`]).

pub mod animation;
pub mod clock;
pub mod content;
pub mod dom;
pub mod event;
pub mod geometry;
pub mod gesture;
pub mod logging;
pub mod navigation;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
