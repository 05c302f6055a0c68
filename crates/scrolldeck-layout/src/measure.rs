#![forbid(unsafe_code)]

//! Measurement seam between the overflow detector and the host.
//!
//! The detector never lays anything out itself. It asks a [`Measurer`] for
//! the rendered box of each authored panel and the natural height of each
//! content element at the panel's real content width.
//!
//! Two implementations ship here:
//!
//! - [`MeasurementTable`]: heights reported by the host, keyed by
//!   [`ElementId`] and `(section, authored panel)`.
//! - [`EstimatingMeasurer`]: a width-based estimate from display columns
//!   (`unicode-width`), for hosts that cannot measure and for tests.

use std::collections::HashMap;
use std::fmt;

use scrolldeck_core::content::{ContentElement, ElementId, ElementKind, Panel, StatItem};
use scrolldeck_core::geometry::{PanelBox, Viewport, sanitize_px};
use unicode_width::UnicodeWidthStr;

/// A height could not be determined.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureError {
    /// No measurement for an element (e.g. node detached from the page).
    MissingElement(ElementId),
    /// No box for an authored panel.
    MissingPanel { section: usize, panel: usize },
    /// The host reported a non-finite or negative height.
    InvalidHeight { id: ElementId, value: f32 },
}

impl fmt::Display for MeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingElement(id) => write!(f, "no measurement for element {id}"),
            Self::MissingPanel { section, panel } => {
                write!(f, "no box for panel {panel} of section {section}")
            }
            Self::InvalidHeight { id, value } => {
                write!(f, "invalid height {value} for element {id}")
            }
        }
    }
}

impl std::error::Error for MeasureError {}

/// Source of panel boxes and element heights.
pub trait Measurer {
    /// Rendered box of authored panel `panel` in section `section`.
    fn panel_box(&self, section: usize, panel: usize) -> Result<PanelBox, MeasureError>;

    /// Natural outer height of `element` at `width`.
    fn element_height(&self, element: &ContentElement, width: f32) -> Result<f32, MeasureError>;

    /// Natural outer height of a single statistic laid out on its own.
    fn stat_height(&self, item: &StatItem, width: f32) -> Result<f32, MeasureError>;

    /// The viewport changed; called before a re-split.
    ///
    /// Host-backed measurers typically refresh their entries out of band and
    /// keep the default no-op.
    fn viewport_changed(&mut self, _viewport: Viewport) {}

    /// Natural height of all of `panel`'s content at `width`.
    fn content_height(&self, panel: &Panel, width: f32) -> Result<f32, MeasureError> {
        panel
            .elements
            .iter()
            .try_fold(0.0, |sum, el| Ok(sum + self.element_height(el, width)?))
    }
}

fn checked(id: ElementId, value: f32) -> Result<f32, MeasureError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(MeasureError::InvalidHeight { id, value })
    }
}

// ---------------------------------------------------------------------------
// MeasurementTable
// ---------------------------------------------------------------------------

/// Host-reported measurements.
///
/// A stats container without its own entry measures as the sum of its
/// items, matching the stacked layout of reconstructed wrappers.
#[derive(Debug, Clone, Default)]
pub struct MeasurementTable {
    boxes: HashMap<(usize, usize), PanelBox>,
    default_box: Option<PanelBox>,
    heights: HashMap<ElementId, f32>,
}

impl MeasurementTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Box used for panels without their own entry (builder).
    #[must_use]
    pub fn with_default_box(mut self, panel_box: PanelBox) -> Self {
        self.default_box = Some(panel_box);
        self
    }

    /// Record the box of one authored panel.
    pub fn set_panel_box(&mut self, section: usize, panel: usize, panel_box: PanelBox) {
        self.boxes.insert((section, panel), panel_box);
    }

    /// Record an element or stat item height.
    pub fn set_height(&mut self, id: ElementId, height: f32) {
        self.heights.insert(id, height);
    }

    /// Record a height (builder).
    #[must_use]
    pub fn with_height(mut self, id: ElementId, height: f32) -> Self {
        self.set_height(id, height);
        self
    }

    /// Number of recorded element heights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Whether no element heights are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    fn lookup(&self, id: ElementId) -> Result<f32, MeasureError> {
        let value = self
            .heights
            .get(&id)
            .copied()
            .ok_or(MeasureError::MissingElement(id))?;
        checked(id, value)
    }
}

impl Measurer for MeasurementTable {
    fn panel_box(&self, section: usize, panel: usize) -> Result<PanelBox, MeasureError> {
        self.boxes
            .get(&(section, panel))
            .or(self.default_box.as_ref())
            .copied()
            .ok_or(MeasureError::MissingPanel { section, panel })
    }

    fn element_height(&self, element: &ContentElement, width: f32) -> Result<f32, MeasureError> {
        match (&element.kind, self.lookup(element.id)) {
            (_, Ok(height)) => Ok(height),
            (ElementKind::Stats(group), Err(MeasureError::MissingElement(_))) => group
                .items
                .iter()
                .try_fold(0.0, |sum, item| Ok(sum + self.stat_height(item, width)?)),
            (_, Err(err)) => Err(err),
        }
    }

    fn stat_height(&self, item: &StatItem, _width: f32) -> Result<f32, MeasureError> {
        self.lookup(item.id)
    }
}

// ---------------------------------------------------------------------------
// EstimatingMeasurer
// ---------------------------------------------------------------------------

/// Typographic constants for [`EstimatingMeasurer`], in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimateMetrics {
    /// Average advance of one display column.
    pub column_px: f32,
    /// Line height of body text.
    pub body_line: f32,
    /// Line height of a level-1 heading; lower levels shrink by 15% per level.
    pub heading_line: f32,
    /// Line height of a pretitle.
    pub pretitle_line: f32,
    /// Vertical space after every element.
    pub spacing: f32,
    /// Height of one stat (donut plus label).
    pub stat: f32,
    /// Height of a media element.
    pub media: f32,
}

impl Default for EstimateMetrics {
    fn default() -> Self {
        Self {
            column_px: 9.0,
            body_line: 24.0,
            heading_line: 44.0,
            pretitle_line: 18.0,
            spacing: 16.0,
            stat: 120.0,
            media: 220.0,
        }
    }
}

/// Width-based height estimate.
///
/// Every panel shares the box derived from the viewport; text wraps at
/// `content_width / column_px` display columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatingMeasurer {
    panel_box: PanelBox,
    metrics: EstimateMetrics,
}

impl EstimatingMeasurer {
    /// Estimator for panels filling `viewport`, with `inset` px of padding on
    /// every side.
    #[must_use]
    pub fn for_viewport(viewport: Viewport, inset: f32) -> Self {
        let inset = sanitize_px(inset);
        Self {
            panel_box: PanelBox::new(viewport.height, viewport.width - 2.0 * inset)
                .with_padding(inset),
            metrics: EstimateMetrics::default(),
        }
    }

    /// Estimator with an explicit panel box.
    #[must_use]
    pub fn new(panel_box: PanelBox) -> Self {
        Self {
            panel_box,
            metrics: EstimateMetrics::default(),
        }
    }

    /// Override the metrics (builder).
    #[must_use]
    pub fn with_metrics(mut self, metrics: EstimateMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    fn lines(&self, text: &str, width: f32) -> f32 {
        let columns_per_line = (width / self.metrics.column_px.max(1.0)).floor().max(1.0);
        let lines: f32 = text
            .split('\n')
            .map(|line| (line.width() as f32 / columns_per_line).ceil().max(1.0))
            .sum();
        lines.max(1.0)
    }
}

impl Measurer for EstimatingMeasurer {
    fn panel_box(&self, _section: usize, _panel: usize) -> Result<PanelBox, MeasureError> {
        Ok(self.panel_box)
    }

    fn viewport_changed(&mut self, viewport: Viewport) {
        let b = &mut self.panel_box;
        b.height = viewport.height;
        b.content_width = sanitize_px(
            viewport.width - b.padding.horizontal_sum() - b.margin.horizontal_sum(),
        );
    }

    fn element_height(&self, element: &ContentElement, width: f32) -> Result<f32, MeasureError> {
        let m = &self.metrics;
        let body = match &element.kind {
            ElementKind::Pretitle { text } => self.lines(text, width) * m.pretitle_line,
            ElementKind::Heading { level, text } => {
                let scale = 0.85f32.powi(i32::from(level.saturating_sub(1)));
                let line = m.heading_line * scale;
                // Headings use wider glyphs in proportion to their size.
                let lines = self.lines(text, width / (line / m.body_line).max(1.0));
                lines * line
            }
            ElementKind::Body { text } | ElementKind::Other { text, .. } => {
                self.lines(text, width) * m.body_line
            }
            ElementKind::List { items, .. } => items
                .iter()
                .map(|item| self.lines(item, width) * m.body_line)
                .sum(),
            ElementKind::Stats(group) => {
                return group
                    .items
                    .iter()
                    .try_fold(0.0, |sum, item| Ok(sum + self.stat_height(item, width)?));
            }
            ElementKind::Media { .. } => m.media,
        };
        checked(element.id, body + m.spacing)
    }

    fn stat_height(&self, item: &StatItem, _width: f32) -> Result<f32, MeasureError> {
        checked(item.id, self.metrics.stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrolldeck_core::content::StatGroup;

    fn el(id: u32, kind: ElementKind) -> ContentElement {
        ContentElement {
            id: ElementId(id),
            kind,
        }
    }

    #[test]
    fn table_returns_recorded_heights() {
        let table = MeasurementTable::new().with_height(ElementId(3), 120.0);
        let body = el(3, ElementKind::Body { text: "x".into() });
        assert_eq!(table.element_height(&body, 500.0), Ok(120.0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn table_missing_element_is_an_error() {
        let table = MeasurementTable::new();
        let body = el(9, ElementKind::Body { text: "x".into() });
        assert_eq!(
            table.element_height(&body, 500.0),
            Err(MeasureError::MissingElement(ElementId(9)))
        );
    }

    #[test]
    fn table_rejects_non_finite_heights() {
        let table = MeasurementTable::new().with_height(ElementId(1), f32::NAN);
        let body = el(1, ElementKind::Body { text: "x".into() });
        assert!(matches!(
            table.element_height(&body, 500.0),
            Err(MeasureError::InvalidHeight { .. })
        ));
    }

    #[test]
    fn table_stats_fall_back_to_item_sum() {
        let mut a = StatItem::new(10.0, "a");
        a.id = ElementId(2);
        let mut b = StatItem::new(20.0, "b");
        b.id = ElementId(3);
        let stats = el(
            1,
            ElementKind::Stats(StatGroup {
                attrs: Default::default(),
                items: vec![a, b],
            }),
        );
        let table = MeasurementTable::new()
            .with_height(ElementId(2), 100.0)
            .with_height(ElementId(3), 80.0);
        assert_eq!(table.element_height(&stats, 500.0), Ok(180.0));
    }

    #[test]
    fn table_panel_box_uses_default() {
        let mut table = MeasurementTable::new().with_default_box(PanelBox::new(600.0, 400.0));
        table.set_panel_box(1, 0, PanelBox::new(300.0, 400.0));
        assert_eq!(table.panel_box(1, 0).unwrap().height, 300.0);
        assert_eq!(table.panel_box(4, 2).unwrap().height, 600.0);
        assert!(MeasurementTable::new().panel_box(0, 0).is_err());
    }

    #[test]
    fn estimator_wraps_long_text() {
        let m = EstimatingMeasurer::new(PanelBox::new(800.0, 90.0));
        let short = el(0, ElementKind::Body { text: "short".into() });
        let long = el(1, ElementKind::Body { text: "x".repeat(25) });
        // 90px / 9px = 10 columns per line.
        assert_eq!(m.element_height(&short, 90.0), Ok(24.0 + 16.0));
        assert_eq!(m.element_height(&long, 90.0), Ok(3.0 * 24.0 + 16.0));
    }

    #[test]
    fn estimator_counts_wide_glyphs() {
        let m = EstimatingMeasurer::new(PanelBox::new(800.0, 90.0));
        let cjk = el(0, ElementKind::Body { text: "\u{4E2D}".repeat(6) });
        // 6 glyphs x 2 columns = 12 columns -> 2 lines.
        assert_eq!(m.element_height(&cjk, 90.0), Ok(2.0 * 24.0 + 16.0));
    }

    #[test]
    fn estimator_content_height_sums_elements() {
        let m = EstimatingMeasurer::new(PanelBox::new(800.0, 900.0));
        let panel = Panel::with_elements(vec![
            el(0, ElementKind::Body { text: "a".into() }),
            el(1, ElementKind::Media { src: "m.png".into(), alt: String::new() }),
        ]);
        assert_eq!(m.content_height(&panel, 900.0), Ok(40.0 + 236.0));
    }

    #[test]
    fn estimator_for_viewport_insets_box() {
        let m = EstimatingMeasurer::for_viewport(Viewport::new(400.0, 700.0), 20.0);
        let panel_box = m.panel_box(0, 0).unwrap();
        assert_eq!(panel_box.content_width, 360.0);
        assert_eq!(panel_box.available_height(0.0), 660.0);
    }

    #[test]
    fn estimator_follows_viewport_changes() {
        let mut m = EstimatingMeasurer::for_viewport(Viewport::new(400.0, 700.0), 20.0);
        m.viewport_changed(Viewport::new(700.0, 400.0));
        let panel_box = m.panel_box(0, 0).unwrap();
        assert_eq!(panel_box.content_width, 660.0);
        assert_eq!(panel_box.available_height(0.0), 360.0);
    }
}
