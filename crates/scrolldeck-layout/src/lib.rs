#![forbid(unsafe_code)]

//! Content overflow detection for ScrollDeck.
//!
//! - [`measure`] - the [`Measurer`] seam: host-reported heights
//!   ([`MeasurementTable`]) or a width-based estimate ([`EstimatingMeasurer`])
//! - [`group`] - semantic grouping (pretitle + heading, atomized stats)
//! - [`overflow`] - the [`OverflowDetector`]: greedy packing into
//!   continuation panels, with a [`SplitReport`] per pass
//!
//! # Example
//!
//! ```ignore
//! use scrolldeck_layout::{EstimatingMeasurer, OverflowDetector};
//!
//! let measurer = EstimatingMeasurer::for_viewport(viewport, 24.0);
//! let report = OverflowDetector::default().run(&mut deck, &measurer);
//! if report.changed() {
//!     // rebuild pagination from deck.counts()
//! }
//! ```

pub mod group;
pub mod measure;
pub mod overflow;

pub use group::{GroupKind, SemanticGroup, group_elements};
pub use measure::{EstimateMetrics, EstimatingMeasurer, MeasureError, MeasurementTable, Measurer};
pub use overflow::{
    OverflowConfig, OverflowDetector, PackingPolicy, PanelSplit, SectionSplit, SplitReport,
};
