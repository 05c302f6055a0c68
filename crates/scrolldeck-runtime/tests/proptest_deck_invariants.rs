//! Property-based invariant tests for `DeckRuntime` under arbitrary input.
//!
//! 1. The position is always valid for the live panel counts.
//! 2. The animation flag is set exactly while a transition plan is active.
//! 3. Panel dots of every paginated section equal its live panel count.
//! 4. When idle, the active dots match the position and nothing is loading.
//! 5. No panics on arbitrary event sequences, including resizes mid-flight.

use std::time::Duration;

use proptest::prelude::*;
use scrolldeck_core::content::{
    BackgroundSpec, ContentElement, Deck, Panel, Section, SectionMeta,
};
use scrolldeck_core::event::{
    DotTarget, Event, KeyCode, KeyEvent, TouchEvent, TouchPhase, WheelEvent,
};
use scrolldeck_core::geometry::Viewport;
use scrolldeck_layout::EstimatingMeasurer;
use scrolldeck_runtime::{DeckConfig, DeckRuntime, DotKind, NullStage};

// ── Strategies ────────────────────────────────────────────────────────────

/// Per section: (paragraphs per authored panel, image index, pagination).
fn deck_strategy() -> impl Strategy<Value = Vec<(Vec<usize>, usize, bool)>> {
    prop::collection::vec(
        (
            prop::collection::vec(1usize..=12, 1..=4),
            0usize..3,
            any::<bool>(),
        ),
        1..=5,
    )
}

fn build_deck(shape: &[(Vec<usize>, usize, bool)], section_dots: bool) -> Deck {
    let sections = shape
        .iter()
        .enumerate()
        .map(|(s, (panels, image, paginated))| {
            let panels = panels
                .iter()
                .map(|n| {
                    Panel::with_elements(
                        (0..*n)
                            .map(|i| {
                                ContentElement::body(format!(
                                    "Section {s} paragraph {i} with enough words to wrap \
                                     on a narrow phone screen at least once or twice."
                                ))
                            })
                            .collect(),
                    )
                })
                .collect();
            Section::new(
                SectionMeta {
                    title: format!("Section {s}"),
                    background: Some(BackgroundSpec::new(format!("img{image}.jpg"))),
                    use_pagination: *paginated,
                    ..Default::default()
                },
                panels,
            )
        })
        .collect();
    Deck::new(sections, section_dots)
}

#[derive(Debug, Clone)]
enum Op {
    Key(KeyCode),
    Wheel(f32),
    Swipe(f32),
    Dot(DotTarget),
    Resize(f32, f32),
    Rotate,
    Wait(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop_oneof![
            Just(KeyCode::Down),
            Just(KeyCode::Up),
            Just(KeyCode::Home),
            Just(KeyCode::End),
            Just(KeyCode::Char(' ')),
        ]
        .prop_map(Op::Key),
        2 => (-80.0f32..80.0).prop_map(Op::Wheel),
        1 => (-200.0f32..200.0).prop_map(Op::Swipe),
        2 => prop_oneof![
            (0usize..6).prop_map(DotTarget::Section),
            (0usize..6, 0usize..12)
                .prop_map(|(section, panel)| DotTarget::Panel { section, panel }),
        ]
        .prop_map(Op::Dot),
        1 => (320.0f32..1600.0, 480.0f32..1000.0).prop_map(|(w, h)| Op::Resize(w, h)),
        1 => Just(Op::Rotate),
        4 => (1u64..400).prop_map(Op::Wait),
    ]
}

// ── Harness ───────────────────────────────────────────────────────────────

fn run(
    rt: &mut DeckRuntime<NullStage, EstimatingMeasurer>,
    op: &Op,
    now: &mut Duration,
    viewport: &mut Viewport,
) {
    match op {
        Op::Key(code) => {
            rt.handle_event(&Event::Key(KeyEvent::new(*code)), *now);
        }
        Op::Wheel(dy) => {
            rt.handle_event(&Event::Wheel(WheelEvent::new(*dy)), *now);
        }
        Op::Swipe(dy) => {
            rt.handle_event(&Event::Touch(TouchEvent::new(TouchPhase::Start, 500.0)), *now);
            rt.handle_event(
                &Event::Touch(TouchEvent::new(TouchPhase::End, 500.0 - dy)),
                *now,
            );
        }
        Op::Dot(target) => {
            rt.handle_event(&Event::DotActivated(*target), *now);
        }
        Op::Resize(w, h) => {
            *viewport = Viewport::new(*w, *h);
            rt.handle_event(&Event::Resize(*viewport), *now);
        }
        Op::Rotate => {
            *viewport = Viewport::new(viewport.height, viewport.width);
            rt.handle_event(&Event::OrientationChange(*viewport), *now);
        }
        Op::Wait(ms) => {
            let end = *now + Duration::from_millis(*ms);
            while *now < end {
                *now += Duration::from_millis(16);
                rt.handle_event(&Event::Tick, *now);
            }
        }
    }
    *now += Duration::from_millis(1);
}

fn check(rt: &DeckRuntime<NullStage, EstimatingMeasurer>) -> Result<(), TestCaseError> {
    let counts = rt.deck().counts();
    let position = rt.position();
    prop_assert!(
        position.is_valid_in(&counts),
        "position {position} invalid for {counts:?}"
    );
    prop_assert_eq!(rt.is_animating(), rt.active_plan().is_some());

    for (index, section) in rt.deck().sections().iter().enumerate() {
        let dots = rt.pagination().panel_dots(index).count();
        if section.meta().use_pagination {
            prop_assert_eq!(dots, counts[index]);
        } else {
            prop_assert_eq!(dots, 0);
        }
    }

    if !rt.is_animating() {
        prop_assert!(!rt.pagination().is_loading());
        for dot in rt.pagination().dots() {
            let expected = match dot.kind {
                DotKind::Section => dot.section == position.section,
                DotKind::Panel => {
                    dot.section == position.section && dot.panel == Some(position.panel)
                }
            };
            prop_assert_eq!(dot.active, expected, "dot {:?} at {}", dot, position);
        }
    }
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// Invariants 1-5 under arbitrary input
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn runtime_invariants_hold(
        shape in deck_strategy(),
        section_dots in any::<bool>(),
        instant in any::<bool>(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut config = DeckConfig::default();
        config.navigation.cooldown = Duration::from_millis(100);
        if instant {
            config.timings = config.timings.scaled(0.0);
        }
        let mut viewport = Viewport::new(1280.0, 800.0);
        let mut rt = DeckRuntime::new(
            build_deck(&shape, section_dots),
            config,
            viewport,
            NullStage,
            EstimatingMeasurer::for_viewport(viewport, 24.0),
        );
        rt.mount();
        check(&rt)?;

        let mut now = Duration::ZERO;
        for op in &ops {
            run(&mut rt, op, &mut now, &mut viewport);
            check(&rt)?;
        }

        rt.fast_forward();
        prop_assert!(!rt.is_animating());
        check(&rt)?;
    }
}
