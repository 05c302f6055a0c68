//! Property-based invariant tests for the overflow detector.
//!
//! 1. Running the detector twice yields identical structure.
//! 2. Reading order is preserved: flattening the live panels reproduces the
//!    authored elements (stats expanded to items).
//! 3. A pretitle and its heading share a panel unless both open
//!    consecutive panels.
//! 4. A live panel taller than the available height holds one element.
//! 5. Continuation panels follow their source and carry no title override.

use proptest::prelude::*;
use scrolldeck_core::content::{
    ContentElement, Deck, ElementId, ElementKind, Panel, Section, SectionMeta, StatGroup, StatItem,
};
use scrolldeck_core::geometry::PanelBox;
use scrolldeck_layout::{MeasurementTable, Measurer, OverflowConfig, OverflowDetector, PackingPolicy};

const AVAILABLE: f32 = 500.0;

// ── Helpers ─────────────────────────────────────────────────────────────

fn element_strategy() -> impl Strategy<Value = ContentElement> {
    prop_oneof![
        Just(ContentElement::pretitle("pre")),
        (1u8..=3).prop_map(|level| ContentElement::heading(level, "heading")),
        Just(ContentElement::body("body")),
        (1usize..=4).prop_map(|n| ContentElement::stats(StatGroup {
            attrs: Default::default(),
            items: (0..n).map(|i| StatItem::new(i as f32, "stat")).collect(),
        })),
    ]
}

fn panel_strategy() -> impl Strategy<Value = Panel> {
    prop::collection::vec(element_strategy(), 1..10)
        .prop_map(|elements| Panel::with_elements(elements).titled("T"))
}

fn deck_strategy() -> impl Strategy<Value = (Deck, MeasurementTable)> {
    (
        prop::collection::vec(panel_strategy(), 1..4),
        prop::collection::vec(10.0f32..600.0, 64),
        any::<bool>(),
    )
        .prop_map(|(panels, heights, sparse)| {
            let deck = Deck::new(vec![Section::new(SectionMeta::default(), panels)], sparse);
            // Containers get no entry so they measure as the sum of their items.
            let containers: Vec<ElementId> = deck.sections()[0]
                .authored()
                .iter()
                .flat_map(|p| p.elements.iter())
                .filter(|e| e.as_stats().is_some())
                .map(|e| e.id)
                .collect();
            let mut table =
                MeasurementTable::new().with_default_box(PanelBox::new(AVAILABLE, 400.0));
            for i in 0..deck.element_count() {
                let id = ElementId(i as u32);
                if !containers.contains(&id) {
                    table.set_height(id, heights[i % heights.len()]);
                }
            }
            (deck, table)
        })
}

fn detector(deck: &Deck) -> OverflowDetector {
    // The section-pagination flag doubles as a policy coin flip.
    let policy = if deck.section_pagination() {
        PackingPolicy::AvoidSparseTail { min_fill: 0.5 }
    } else {
        PackingPolicy::Greedy
    };
    OverflowDetector::new(OverflowConfig {
        gap_reserve: 0.0,
        policy,
    })
}

/// Flattened ids: elements, with stats containers replaced by item ids.
fn flat_ids(panels: &[Panel]) -> Vec<ElementId> {
    panels
        .iter()
        .flat_map(|p| p.elements.iter())
        .flat_map(|e| match &e.kind {
            ElementKind::Stats(group) => group.items.iter().map(|i| i.id).collect::<Vec<_>>(),
            _ => vec![e.id],
        })
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rerun_is_idempotent((mut deck, table) in deck_strategy()) {
        let d = detector(&deck);
        d.run(&mut deck, &table);
        let once = deck.clone();
        let report = d.run(&mut deck, &table);
        prop_assert!(!report.changed());
        prop_assert_eq!(deck, once);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Reading order
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reading_order_is_preserved((mut deck, table) in deck_strategy()) {
        detector(&deck).run(&mut deck, &table);
        let section = &deck.sections()[0];
        prop_assert_eq!(flat_ids(section.panels()), flat_ids(section.authored()));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Pretitle adjacency
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pretitle_stays_with_heading((mut deck, table) in deck_strategy()) {
        detector(&deck).run(&mut deck, &table);
        let panels = deck.sections()[0].panels();
        for (p, panel) in panels.iter().enumerate() {
            for (e, el) in panel.elements.iter().enumerate() {
                if !el.is_pretitle() {
                    continue;
                }
                let authored_next = el.id.0 + 1;
                let next_in_panel = panel.elements.get(e + 1);
                match next_in_panel {
                    Some(next) => {
                        // Same panel: whatever follows is the next authored unit.
                        let first = match &next.kind {
                            ElementKind::Stats(g) => g.items.first().map_or(next.id, |i| i.id),
                            _ => next.id,
                        };
                        prop_assert!(first.0 >= authored_next);
                    }
                    None => {
                        // Pretitle ends its panel: if a heading follows it in
                        // authored order, the pretitle opened this panel and the
                        // heading opens the next one.
                        if let Some(next_panel) = panels.get(p + 1)
                            && let Some(first) = next_panel.elements.first()
                            && first.is_heading()
                            && first.id.0 == authored_next
                        {
                            prop_assert_eq!(e, 0, "pretitle split from heading mid-panel");
                        }
                    }
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-5. Part heights and continuation metadata
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn over_tall_panels_hold_one_element((mut deck, table) in deck_strategy()) {
        detector(&deck).run(&mut deck, &table);
        for panel in deck.sections()[0].panels() {
            let height = table.content_height(panel, 400.0).unwrap();
            if height > AVAILABLE + 0.01 {
                let units = flat_ids(std::slice::from_ref(panel)).len();
                prop_assert_eq!(units, 1, "over-tall panel with {} units", units);
            }
        }
    }

    #[test]
    fn continuations_follow_their_source((mut deck, table) in deck_strategy()) {
        detector(&deck).run(&mut deck, &table);
        let panels = deck.sections()[0].panels();
        for (i, panel) in panels.iter().enumerate() {
            if panel.origin.is_continuation() {
                prop_assert!(i > 0);
                let prev = &panels[i - 1];
                prop_assert_eq!(prev.origin.source, panel.origin.source);
                prop_assert_eq!(prev.origin.part + 1, panel.origin.part);
                prop_assert_eq!(panel.title.as_deref(), None);
            } else {
                prop_assert_eq!(panel.title.as_deref(), Some("T"));
            }
        }
    }
}
