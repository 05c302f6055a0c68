#![forbid(unsafe_code)]

//! Content overflow detection and panel splitting.
//!
//! For every authored panel the detector compares the natural content height
//! against the panel's available height. Overflowing panels are decomposed
//! into [`SemanticGroup`]s, bin-packed into parts, and every part beyond the
//! first becomes a continuation panel inserted right after its predecessor.
//!
//! # Packing
//!
//! Greedy first-fit by height, no look-ahead:
//!
//! 1. A group that fits in the current part joins it.
//! 2. A group that fits an empty part starts a new one.
//! 3. An over-tall splittable group starts a fresh part and is sub-split
//!    unit by unit; the last sub-part stays open for following groups.
//! 4. An over-tall unsplittable group occupies a part alone.
//!
//! When rule 2 or 3 opens a part for body or stat content, a heading group
//! left last in the previous part moves along with it if both fit.
//!
//! [`PackingPolicy::AvoidSparseTail`] then moves trailing pieces of the
//! penultimate part into a sparse last part while both still fit.
//!
//! # Invariants
//!
//! 1. Splitting always starts from the authored panels, so running twice
//!    without a change in measurements yields identical structure.
//! 2. Concatenating the units of all parts reproduces the authored units in
//!    order.
//! 3. Atomized stat items sharing a part and a source container are
//!    recombined into one wrapper carrying the container's attributes and id.
//!
//! # Failure Modes
//!
//! - A measurement failure for a panel is logged and recorded in the
//!   [`SplitReport`]; the panel is left unsplit.
//! - A panel with no available height is left unsplit.

use std::collections::HashMap;

use scrolldeck_core::content::{
    ContentElement, Deck, ElementId, ElementKind, Panel, Section, StatGroup,
};
use scrolldeck_core::logging::TARGET_OVERFLOW;
use scrolldeck_core::{debug, debug_span, warn};

use crate::group::{GroupKind, MeasuredUnit, SemanticGroup, Unit, group_elements};
use crate::measure::{MeasureError, Measurer};

/// Height slack tolerated when checking whether content fits, in px.
const FIT_EPSILON: f32 = 1e-3;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How groups are distributed across parts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PackingPolicy {
    /// First-fit, no look-ahead.
    #[default]
    Greedy,
    /// Greedy, then refill a last part filled below `min_fill` (a fraction
    /// of the available height) from the part before it.
    AvoidSparseTail { min_fill: f32 },
}

/// Overflow detector settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverflowConfig {
    /// Extra height kept free below the content, in px.
    pub gap_reserve: f32,
    pub policy: PackingPolicy,
}

impl Default for OverflowConfig {
    fn default() -> Self {
        Self {
            gap_reserve: 32.0,
            policy: PackingPolicy::Greedy,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// One authored panel that was split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSplit {
    /// Authored panel index.
    pub source: usize,
    /// Number of resulting parts (at least 2).
    pub parts: usize,
}

/// Outcome for one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSplit {
    pub section: usize,
    /// Live panel count before this pass.
    pub before: usize,
    /// Live panel count after this pass.
    pub after: usize,
    pub split: Vec<PanelSplit>,
    /// Authored panels left unsplit because measuring failed.
    pub failures: Vec<(usize, MeasureError)>,
}

/// Outcome of a full detector pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplitReport {
    pub sections: Vec<SectionSplit>,
}

impl SplitReport {
    /// Live panel counts per section before the pass.
    #[must_use]
    pub fn counts_before(&self) -> Vec<usize> {
        self.sections.iter().map(|s| s.before).collect()
    }

    /// Live panel counts per section after the pass.
    #[must_use]
    pub fn counts_after(&self) -> Vec<usize> {
        self.sections.iter().map(|s| s.after).collect()
    }

    /// Whether any section's panel count changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.sections.iter().any(|s| s.before != s.after)
    }

    /// Total number of authored panels that were split.
    #[must_use]
    pub fn split_count(&self) -> usize {
        self.sections.iter().map(|s| s.split.len()).sum()
    }

    /// Total number of measurement failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.sections.iter().map(|s| s.failures.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Packing internals
// ---------------------------------------------------------------------------

/// A run of units placed together: a whole group or one sub-split unit.
#[derive(Debug)]
struct Piece {
    units: Vec<MeasuredUnit>,
    height: f32,
    /// A whole heading or pretitle group.
    leads: bool,
}

impl Piece {
    fn group(group: SemanticGroup) -> Self {
        Self {
            height: group.height(),
            leads: matches!(group.kind, GroupKind::Heading | GroupKind::PretitleHeading),
            units: group.units,
        }
    }

    fn unit(unit: MeasuredUnit) -> Self {
        Self {
            height: unit.height,
            units: vec![unit],
            leads: false,
        }
    }
}

#[derive(Debug, Default)]
struct Part {
    pieces: Vec<Piece>,
    height: f32,
}

impl Part {
    fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    fn fits(&self, height: f32, available: f32) -> bool {
        self.height + height <= available + FIT_EPSILON
    }

    fn push(&mut self, piece: Piece) {
        self.height += piece.height;
        self.pieces.push(piece);
    }
}

impl Extend<Piece> for Part {
    fn extend<I: IntoIterator<Item = Piece>>(&mut self, pieces: I) {
        for piece in pieces {
            self.push(piece);
        }
    }
}

struct Packer {
    parts: Vec<Part>,
    available: f32,
}

impl Packer {
    fn new(available: f32) -> Self {
        Self {
            parts: vec![Part::default()],
            available,
        }
    }

    fn current(&mut self) -> &mut Part {
        if self.parts.is_empty() {
            self.parts.push(Part::default());
        }
        let last = self.parts.len() - 1;
        &mut self.parts[last]
    }

    fn fresh(&mut self) {
        if !self.current().is_empty() {
            self.parts.push(Part::default());
        }
    }

    fn place(&mut self, group: SemanticGroup) {
        let height = group.height();
        let available = self.available;

        let introduced = matches!(group.kind, GroupKind::Content | GroupKind::IndividualStat);

        if self.current().fits(height, available) {
            self.current().push(Piece::group(group));
        } else if height <= available + FIT_EPSILON {
            let lead = if introduced { self.detach_lead(height) } else { None };
            self.fresh();
            self.current().extend(lead);
            self.current().push(Piece::group(group));
        } else if group.splittable {
            let first = group.units.first().map_or(0.0, |u| u.height);
            let lead = if introduced { self.detach_lead(first) } else { None };
            self.fresh();
            self.current().extend(lead);
            for unit in group.units {
                if !self.current().is_empty() && !self.current().fits(unit.height, available) {
                    self.fresh();
                }
                self.current().push(Piece::unit(unit));
            }
        } else {
            self.fresh();
            self.current().push(Piece::group(group));
            self.fresh();
        }
    }

    /// Take a trailing heading off the current part when it fits beside
    /// `follow` px of the content it introduces.
    fn detach_lead(&mut self, follow: f32) -> Option<Piece> {
        let available = self.available;
        let part = self.current();
        let last = part.pieces.last()?;
        if !last.leads || part.pieces.len() < 2 || last.height + follow > available + FIT_EPSILON {
            return None;
        }
        let piece = part.pieces.pop()?;
        part.height -= piece.height;
        Some(piece)
    }

    fn avoid_sparse_tail(&mut self, min_fill: f32) {
        let limit = min_fill.clamp(0.0, 1.0) * self.available;
        while self.parts.len() >= 2 {
            let n = self.parts.len();
            let (head, tail) = self.parts.split_at_mut(n - 1);
            let prev = &mut head[n - 2];
            let last = &mut tail[0];
            if last.height >= limit || prev.pieces.len() <= 1 {
                break;
            }
            let Some(candidate) = prev.pieces.last() else {
                break;
            };
            if !last.fits(candidate.height, self.available) {
                break;
            }
            let Some(piece) = prev.pieces.pop() else {
                break;
            };
            prev.height -= piece.height;
            last.height += piece.height;
            last.pieces.insert(0, piece);
        }
    }

    fn finish(mut self, policy: PackingPolicy) -> Vec<Vec<Unit>> {
        self.parts.retain(|p| !p.is_empty());
        if let PackingPolicy::AvoidSparseTail { min_fill } = policy {
            self.avoid_sparse_tail(min_fill);
        }
        self.parts
            .into_iter()
            .map(|part| {
                part.pieces
                    .into_iter()
                    .flat_map(|piece| piece.units)
                    .map(|measured| measured.unit)
                    .collect()
            })
            .collect()
    }
}

/// Turn a part's units back into elements, rebuilding stats wrappers.
fn assemble(units: Vec<Unit>, containers: &HashMap<ElementId, &StatGroup>) -> Vec<ContentElement> {
    let mut out: Vec<ContentElement> = Vec::with_capacity(units.len());
    let mut wrappers: HashMap<ElementId, usize> = HashMap::new();

    for unit in units {
        match unit {
            Unit::Element(element) => out.push(element),
            Unit::Stat { container, item } => {
                if let Some(&index) = wrappers.get(&container)
                    && let ElementKind::Stats(group) = &mut out[index].kind
                {
                    group.items.push(item);
                    continue;
                }
                let attrs = containers
                    .get(&container)
                    .map(|group| group.attrs.clone())
                    .unwrap_or_default();
                wrappers.insert(container, out.len());
                out.push(ContentElement {
                    id: container,
                    kind: ElementKind::Stats(StatGroup {
                        attrs,
                        items: vec![item],
                    }),
                });
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Splits overflowing panels into continuation panels.
#[derive(Debug, Clone, Default)]
pub struct OverflowDetector {
    config: OverflowConfig,
}

impl OverflowDetector {
    /// Detector with the given settings.
    #[must_use]
    pub fn new(config: OverflowConfig) -> Self {
        Self { config }
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> &OverflowConfig {
        &self.config
    }

    /// Re-split every section of `deck` from its authored panels.
    pub fn run(&self, deck: &mut Deck, measurer: &impl Measurer) -> SplitReport {
        let _span = debug_span!(target: TARGET_OVERFLOW, "scrolldeck.overflow").entered();
        let mut report = SplitReport::default();

        for (index, section) in deck.sections_mut().iter_mut().enumerate() {
            let (panels, split) = self.split_section(index, section, measurer);
            if !section.replace_panels(panels) {
                warn!(
                    target: TARGET_OVERFLOW,
                    section = index,
                    "split result out of order; keeping authored panels"
                );
                section.reset_split();
            }
            report.sections.push(SectionSplit {
                after: section.panel_count(),
                ..split
            });
        }

        debug!(
            target: TARGET_OVERFLOW,
            split = report.split_count(),
            failures = report.failure_count(),
            counts = ?report.counts_after(),
            "overflow pass complete"
        );
        report
    }

    /// Compute the live panels of one section without modifying it.
    pub fn split_section(
        &self,
        index: usize,
        section: &Section,
        measurer: &impl Measurer,
    ) -> (Vec<Panel>, SectionSplit) {
        let mut split = SectionSplit {
            section: index,
            before: section.panel_count(),
            after: 0,
            split: Vec::new(),
            failures: Vec::new(),
        };
        let mut panels = Vec::with_capacity(section.authored().len());

        for (source, authored) in section.authored().iter().enumerate() {
            match self.split_authored(index, source, authored, measurer) {
                Ok(parts) => {
                    if parts.len() > 1 {
                        split.split.push(PanelSplit {
                            source,
                            parts: parts.len(),
                        });
                    }
                    panels.extend(parts);
                }
                Err(err) => {
                    warn!(
                        target: TARGET_OVERFLOW,
                        section = index,
                        panel = source,
                        error = %err,
                        "measurement failed; panel left unsplit"
                    );
                    split.failures.push((source, err));
                    panels.push(authored.clone());
                }
            }
        }

        split.after = panels.len();
        (panels, split)
    }

    fn split_authored(
        &self,
        section: usize,
        source: usize,
        panel: &Panel,
        measurer: &impl Measurer,
    ) -> Result<Vec<Panel>, MeasureError> {
        let panel_box = measurer.panel_box(section, source)?;
        let available = panel_box.available_height(self.config.gap_reserve);
        let width = panel_box.content_width;
        let content = measurer.content_height(panel, width)?;

        if content <= available + FIT_EPSILON {
            return Ok(vec![panel.clone()]);
        }
        if available <= 0.0 {
            debug!(
                target: TARGET_OVERFLOW,
                section,
                panel = source,
                "no available height; panel left unsplit"
            );
            return Ok(vec![panel.clone()]);
        }

        debug!(
            target: TARGET_OVERFLOW,
            section,
            panel = source,
            content,
            available,
            "panel overflows"
        );
        self.split_panel(panel, available, width, measurer)
    }

    /// Split `panel` into parts of at most `available` px each (except
    /// unsplittable over-tall groups), measuring at `width`.
    pub fn split_panel(
        &self,
        panel: &Panel,
        available: f32,
        width: f32,
        measurer: &impl Measurer,
    ) -> Result<Vec<Panel>, MeasureError> {
        let groups = group_elements(&panel.elements, measurer, width)?;
        let mut packer = Packer::new(available);
        for group in groups {
            packer.place(group);
        }
        let parts = packer.finish(self.config.policy);
        if parts.len() <= 1 {
            return Ok(vec![panel.clone()]);
        }

        let containers: HashMap<ElementId, &StatGroup> = panel
            .elements
            .iter()
            .filter_map(|el| el.as_stats().map(|group| (el.id, group)))
            .collect();

        Ok(parts
            .into_iter()
            .enumerate()
            .map(|(part, units)| {
                let elements = assemble(units, &containers);
                if part == 0 {
                    Panel {
                        elements,
                        ..panel.clone()
                    }
                } else {
                    panel.continuation(part, elements)
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::MeasurementTable;
    use scrolldeck_core::content::{SectionMeta, StatItem};
    use scrolldeck_core::geometry::PanelBox;
    use std::collections::BTreeMap;

    /// Single-section deck, one panel per entry, in a 500px box.
    ///
    /// Every element gets the height listed; for a stats container the
    /// height applies to each item and the container measures as their sum.
    fn deck_with(panels: Vec<Vec<(ContentElement, f32)>>) -> (Deck, MeasurementTable) {
        let mut heights: Vec<Option<f32>> = Vec::new();
        let panels: Vec<Panel> = panels
            .into_iter()
            .map(|els| {
                let mut elements = Vec::new();
                for (el, h) in els {
                    match el.as_stats() {
                        Some(group) => {
                            heights.push(None);
                            heights.extend(group.items.iter().map(|_| Some(h)));
                        }
                        None => heights.push(Some(h)),
                    }
                    elements.push(el);
                }
                Panel::with_elements(elements)
            })
            .collect();
        let deck = Deck::new(vec![Section::new(SectionMeta::default(), panels)], false);
        let mut table = MeasurementTable::new().with_default_box(PanelBox::new(500.0, 400.0));
        for (i, h) in heights.into_iter().enumerate() {
            if let Some(h) = h {
                table.set_height(ElementId(i as u32), h);
            }
        }
        (deck, table)
    }

    fn detector() -> OverflowDetector {
        OverflowDetector::new(OverflowConfig {
            gap_reserve: 0.0,
            policy: PackingPolicy::Greedy,
        })
    }

    fn stats(n: usize) -> ContentElement {
        let mut attrs = BTreeMap::new();
        attrs.insert("data-stagger".to_string(), "true".to_string());
        ContentElement::stats(StatGroup {
            attrs,
            items: (0..n).map(|i| StatItem::new(10.0 * i as f32, format!("s{i}"))).collect(),
        })
    }

    #[test]
    fn fitting_panels_are_untouched() {
        let (mut deck, table) = deck_with(vec![vec![(ContentElement::body("a"), 200.0)]]);
        let report = detector().run(&mut deck, &table);
        assert!(!report.changed());
        assert_eq!(report.split_count(), 0);
        assert_eq!(deck.counts(), vec![1]);
    }

    #[test]
    fn overflowing_middle_panel_splits_in_order() {
        let (mut deck, table) = deck_with(vec![
            vec![(ContentElement::body("p0"), 400.0)],
            vec![
                (ContentElement::heading(2, "h"), 100.0),
                (ContentElement::body("b1"), 300.0),
                (ContentElement::pretitle("pre"), 50.0),
                (ContentElement::heading(3, "h2"), 100.0),
                (ContentElement::body("b2"), 350.0),
            ],
            vec![(ContentElement::body("p2"), 300.0)],
        ]);
        let report = detector().run(&mut deck, &table);
        assert_eq!(report.counts_before(), vec![3]);
        assert_eq!(report.counts_after(), vec![4]);
        assert_eq!(
            report.sections[0].split,
            vec![PanelSplit {
                source: 1,
                parts: 2
            }]
        );

        let panels = deck.sections()[0].panels();
        let ids: Vec<Vec<u32>> = panels
            .iter()
            .map(|p| p.elements.iter().map(|e| e.id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![0], vec![1, 2], vec![3, 4, 5], vec![6]]);
        assert!(panels[2].origin.is_continuation());
        assert_eq!(panels[2].origin.source, 1);
        assert_eq!(panels[3].origin.source, 2);
    }

    #[test]
    fn one_extra_stat_adds_one_panel() {
        let (mut deck, table) = deck_with(vec![vec![
            (ContentElement::heading(1, "h"), 100.0),
            (ContentElement::body("b"), 100.0),
            (stats(4), 100.0),
        ]]);
        detector().run(&mut deck, &table);
        let panels = deck.sections()[0].panels();
        assert_eq!(panels.len(), 2);
        assert!(panels[0].elements[0].is_heading());
        assert!(matches!(panels[0].elements[1].kind, ElementKind::Body { .. }));

        let first = panels[0].elements[2].as_stats().unwrap();
        let second = panels[1].elements[0].as_stats().unwrap();
        assert_eq!(first.items.len(), 3);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.attrs.get("data-stagger").map(String::as_str), Some("true"));
        assert_eq!(panels[1].elements[0].id, panels[0].elements[2].id);
        assert_eq!(panels[1].title, None);
    }

    #[test]
    fn rerun_is_idempotent() {
        let (mut deck, table) = deck_with(vec![vec![
            (ContentElement::body("a"), 450.0),
            (ContentElement::body("b"), 450.0),
        ]]);
        let first = detector().run(&mut deck, &table);
        let snapshot = deck.clone();
        let second = detector().run(&mut deck, &table);
        assert_eq!(first.counts_after(), vec![2]);
        assert_eq!(second.counts_before(), vec![2]);
        assert_eq!(second.counts_after(), vec![2]);
        assert!(!second.changed());
        assert_eq!(deck, snapshot);
    }

    #[test]
    fn resplit_after_growth_replaces_previous_split() {
        let (mut deck, mut table) = deck_with(vec![vec![
            (ContentElement::body("a"), 300.0),
            (ContentElement::body("b"), 300.0),
        ]]);
        detector().run(&mut deck, &table);
        assert_eq!(deck.counts(), vec![2]);

        table = table.with_default_box(PanelBox::new(1000.0, 400.0));
        let report = detector().run(&mut deck, &table);
        assert_eq!(deck.counts(), vec![1]);
        assert!(report.changed());
    }

    #[test]
    fn trailing_heading_moves_with_its_content() {
        let (mut deck, table) = deck_with(vec![vec![
            (ContentElement::body("a"), 300.0),
            (ContentElement::heading(2, "next"), 100.0),
            (ContentElement::body("b"), 300.0),
        ]]);
        detector().run(&mut deck, &table);
        let ids: Vec<Vec<u32>> = deck.sections()[0]
            .panels()
            .iter()
            .map(|p| p.elements.iter().map(|e| e.id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn trailing_heading_stays_when_it_cannot_share_a_part() {
        let (mut deck, table) = deck_with(vec![vec![
            (ContentElement::body("a"), 300.0),
            (ContentElement::heading(2, "next"), 100.0),
            (ContentElement::body("b"), 450.0),
        ]]);
        detector().run(&mut deck, &table);
        let ids: Vec<Vec<u32>> = deck.sections()[0]
            .panels()
            .iter()
            .map(|p| p.elements.iter().map(|e| e.id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn heading_before_sub_split_content_opens_the_part() {
        let (mut deck, table) = deck_with(vec![vec![
            (ContentElement::body("a"), 300.0),
            (ContentElement::heading(2, "list"), 100.0),
            (ContentElement::body("b"), 300.0),
            (ContentElement::body("c"), 300.0),
        ]]);
        detector().run(&mut deck, &table);
        let ids: Vec<Vec<u32>> = deck.sections()[0]
            .panels()
            .iter()
            .map(|p| p.elements.iter().map(|e| e.id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![0], vec![1, 2], vec![3]]);
    }

    #[test]
    fn unsplittable_over_tall_group_sits_alone() {
        let (mut deck, table) = deck_with(vec![vec![
            (ContentElement::body("a"), 100.0),
            (ContentElement::heading(1, "huge"), 700.0),
            (ContentElement::body("b"), 100.0),
        ]]);
        detector().run(&mut deck, &table);
        let ids: Vec<Vec<u32>> = deck.sections()[0]
            .panels()
            .iter()
            .map(|p| p.elements.iter().map(|e| e.id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn over_tall_pretitle_group_splits_at_panel_starts() {
        let (mut deck, table) = deck_with(vec![vec![
            (ContentElement::body("a"), 100.0),
            (ContentElement::pretitle("p"), 300.0),
            (ContentElement::heading(1, "h"), 300.0),
            (ContentElement::body("b"), 100.0),
        ]]);
        detector().run(&mut deck, &table);
        let panels = deck.sections()[0].panels();
        assert_eq!(panels.len(), 3);
        assert!(panels[1].elements[0].is_pretitle());
        assert_eq!(panels[1].elements.len(), 1);
        assert!(panels[2].elements[0].is_heading());
        assert_eq!(panels[2].elements.len(), 2);
    }

    #[test]
    fn measurement_failure_leaves_panel_unsplit() {
        let (mut deck, _) = deck_with(vec![vec![
            (ContentElement::body("a"), 450.0),
            (ContentElement::body("b"), 450.0),
        ]]);
        let table = MeasurementTable::new().with_default_box(PanelBox::new(500.0, 400.0));
        let report = detector().run(&mut deck, &table);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(deck.counts(), vec![1]);
    }

    #[test]
    fn sparse_tail_policy_rebalances() {
        let elements = vec![
            (ContentElement::heading(1, "h"), 100.0),
            (ContentElement::body("a"), 150.0),
            (ContentElement::heading(2, "h2"), 100.0),
            (ContentElement::heading(2, "h3"), 100.0),
            (ContentElement::heading(2, "h4"), 100.0),
        ];
        let (mut greedy_deck, table) = deck_with(vec![elements.clone()]);
        detector().run(&mut greedy_deck, &table);
        let greedy: Vec<usize> = greedy_deck.sections()[0]
            .panels()
            .iter()
            .map(|p| p.elements.len())
            .collect();
        assert_eq!(greedy, vec![4, 1]);

        let (mut deck, table) = deck_with(vec![elements]);
        OverflowDetector::new(OverflowConfig {
            gap_reserve: 0.0,
            policy: PackingPolicy::AvoidSparseTail { min_fill: 0.5 },
        })
        .run(&mut deck, &table);
        let balanced: Vec<usize> = deck.sections()[0]
            .panels()
            .iter()
            .map(|p| p.elements.len())
            .collect();
        assert_eq!(balanced, vec![2, 3]);
    }

    #[test]
    fn gap_reserve_reduces_available_height() {
        let (mut deck, table) = deck_with(vec![vec![
            (ContentElement::body("a"), 250.0),
            (ContentElement::body("b"), 240.0),
        ]]);
        OverflowDetector::new(OverflowConfig {
            gap_reserve: 20.0,
            policy: PackingPolicy::Greedy,
        })
        .run(&mut deck, &table);
        assert_eq!(deck.counts(), vec![2]);
    }
}
