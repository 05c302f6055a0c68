#![forbid(unsafe_code)]

//! Transition planning and execution.
//!
//! A navigation step becomes a [`TransitionPlan`]: an explicit, ordered list
//! of [`TransitionStep`]s on one timeline, computed up front. A
//! [`TransitionRunner`] advances the plan on a frame clock and yields one
//! [`Cue`] per active step per frame.
//!
//! # Timeline
//!
//! ```text
//! 0                         E              E+b                 end
//! |-- border out --|        |-- border in --|
//! |---- content exit -------|               |-- content enter --|
//! |---- background (section change only) -------|
//!                           |-- title clone / original out --|+replace
//!                           |hide, reset stats, show, dots
//!                                           |-- stat charge (staggered) --|
//! ```
//!
//! `E` is the end of the exit phase: the later of content exit and border
//! out. `b` is the border-in duration.
//!
//! # Invariants
//!
//! 1. Steps are sorted by offset; equal offsets keep planning order.
//! 2. Border-in starts at or after border-out ends; content-in starts at or
//!    after border-in ends.
//! 3. Background steps start at offset zero and exist only when the
//!    section changes.
//! 4. The stat reset precedes the panel show, at the same offset.
//! 5. Exit and enter motion are signed by one direction: forward content
//!    exits upward and enters from below.

use std::fmt;
use std::time::Duration;

use scrolldeck_core::animation::{Animation, Easing, StaggerMode, Track, TrackEvent, stagger_offsets};
use scrolldeck_core::content::{Deck, ElementId, TitleAnimation};
use scrolldeck_core::logging::TARGET_TRANSITION;
use scrolldeck_core::navigation::{Direction, Position};

use crate::background::{BackgroundLayerStack, LayerChange, LayerId};
use crate::pagination::{DotCommand, PaginationManager};

// ---------------------------------------------------------------------------
// Timings
// ---------------------------------------------------------------------------

/// Durations, distances, and curves of one transition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionTimings {
    pub content_exit: Duration,
    pub border_out: Duration,
    pub border_in: Duration,
    pub content_enter: Duration,
    pub background: Duration,
    pub title: Duration,
    pub dots: Duration,
    pub stat_charge: Duration,
    /// Delay between consecutive stat charge-ups.
    pub stat_stagger: Duration,
    /// Vertical travel of exiting and entering content, in px.
    pub travel: f32,
    pub exit_easing: Easing,
    pub enter_easing: Easing,
    pub background_easing: Easing,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            content_exit: Duration::from_millis(350),
            border_out: Duration::from_millis(250),
            border_in: Duration::from_millis(300),
            content_enter: Duration::from_millis(500),
            background: Duration::from_millis(900),
            title: Duration::from_millis(450),
            dots: Duration::from_millis(250),
            stat_charge: Duration::from_millis(1200),
            stat_stagger: Duration::from_millis(120),
            travel: 40.0,
            exit_easing: Easing::EaseIn,
            enter_easing: Easing::EaseOutCubic,
            background_easing: Easing::EaseInOut,
        }
    }
}

impl TransitionTimings {
    /// Every duration multiplied by `factor`, clamped to `[0, 100]`.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(0.0, 100.0)
        } else {
            1.0
        };
        let s = |d: Duration| d.mul_f32(factor);
        Self {
            content_exit: s(self.content_exit),
            border_out: s(self.border_out),
            border_in: s(self.border_in),
            content_enter: s(self.content_enter),
            background: s(self.background),
            title: s(self.title),
            dots: s(self.dots),
            stat_charge: s(self.stat_charge),
            stat_stagger: s(self.stat_stagger),
            ..self.clone()
        }
    }

    /// End of the exit phase, where panel visibility switches.
    #[must_use]
    pub fn switch_offset(&self) -> Duration {
        self.content_exit.max(self.border_out)
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// What a step animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Actor {
    /// Content container of a panel.
    Content(Position),
    /// Decorative border of a panel.
    Border(Position),
    /// Panel visibility.
    Panel(Position),
    /// Statistic donuts of a panel.
    Stats(Position),
    Background(LayerId),
    /// The visible section title.
    Title,
    /// The temporary duplicate used during a title swap.
    TitleClone,
    /// Panel-dot groups.
    Dots,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(p) => write!(f, "content {p}"),
            Self::Border(p) => write!(f, "border {p}"),
            Self::Panel(p) => write!(f, "panel {p}"),
            Self::Stats(p) => write!(f, "stats {p}"),
            Self::Background(id) => write!(f, "background {id}"),
            Self::Title => f.write_str("title"),
            Self::TitleClone => f.write_str("title clone"),
            Self::Dots => f.write_str("dots"),
        }
    }
}

/// What a step does to its actor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// Fade out while moving from rest to `offset_y`.
    Exit { offset_y: f32 },
    /// Fade in while moving from `offset_y` to rest.
    Enter { offset_y: f32 },
    FadeOut,
    FadeIn,
    Hide,
    Show,
    /// Set every donut to zero.
    ResetStats,
    /// Charge one donut up to `progress` in [0, 1].
    ChargeStat { id: ElementId, progress: f32 },
    Layer(LayerChange),
    /// Animate a duplicate title in over the original.
    CloneTitle {
        text: String,
        animation: TitleAnimation,
    },
    /// Put `text` into the original title and discard the duplicate.
    ReplaceTitle { text: String },
    Dots(DotCommand),
}

impl Action {
    /// Short stable name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Exit { .. } => "exit",
            Self::Enter { .. } => "enter",
            Self::FadeOut => "fade-out",
            Self::FadeIn => "fade-in",
            Self::Hide => "hide",
            Self::Show => "show",
            Self::ResetStats => "reset-stats",
            Self::ChargeStat { .. } => "charge-stat",
            Self::Layer(_) => "layer",
            Self::CloneTitle { .. } => "clone-title",
            Self::ReplaceTitle { .. } => "replace-title",
            Self::Dots(_) => "dots",
        }
    }
}

/// One entry of a plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionStep {
    pub actor: Actor,
    pub action: Action,
    pub offset: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl TransitionStep {
    /// End of the step on the timeline.
    #[must_use]
    pub fn end(&self) -> Duration {
        self.offset.saturating_add(self.duration)
    }
}

/// Ordered steps of one transition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionPlan {
    pub from: Position,
    pub to: Position,
    pub direction: Direction,
    pub steps: Vec<TransitionStep>,
}

impl TransitionPlan {
    /// Time at which the last step ends.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.steps
            .iter()
            .map(TransitionStep::end)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the plan crosses a section boundary.
    #[must_use]
    pub fn changes_section(&self) -> bool {
        self.from.section != self.to.section
    }

    /// First step matching `actor` and action `name`.
    #[must_use]
    pub fn find(&self, actor: Actor, name: &str) -> Option<&TransitionStep> {
        self.steps
            .iter()
            .find(|s| s.actor == actor && s.action.name() == name)
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Builds transition plans.
#[derive(Debug, Clone, Default)]
pub struct TransitionCoordinator {
    timings: TransitionTimings,
}

impl TransitionCoordinator {
    /// Coordinator with the given timings.
    #[must_use]
    pub fn new(timings: TransitionTimings) -> Self {
        Self { timings }
    }

    /// Current timings.
    #[must_use]
    pub fn timings(&self) -> &TransitionTimings {
        &self.timings
    }

    /// Plan the transition `from → to`.
    ///
    /// Commits the background and dot-group bookkeeping for the step.
    pub fn plan(
        &self,
        deck: &Deck,
        from: Position,
        to: Position,
        direction: Direction,
        backgrounds: &mut BackgroundLayerStack,
        pagination: &mut PaginationManager,
    ) -> TransitionPlan {
        let t = &self.timings;
        let sign = f32::from(direction.sign());
        let switch = t.switch_offset();
        let enter = switch.saturating_add(t.border_in);
        let section_change = from.section != to.section;
        let mut steps = Vec::new();
        let mut push = |actor, action, offset, duration, easing| {
            steps.push(TransitionStep {
                actor,
                action,
                offset,
                duration,
                easing,
            });
        };

        // Exit
        push(
            Actor::Border(from),
            Action::FadeOut,
            Duration::ZERO,
            t.border_out,
            t.exit_easing,
        );
        push(
            Actor::Content(from),
            Action::Exit {
                offset_y: -sign * t.travel,
            },
            Duration::ZERO,
            t.content_exit,
            t.exit_easing,
        );

        // Background and dot groups
        if section_change {
            for cmd in backgrounds.transition(from.section, to.section) {
                let duration = match cmd.change {
                    LayerChange::Restack { .. } => Duration::ZERO,
                    _ => t.background,
                };
                push(
                    Actor::Background(cmd.layer),
                    Action::Layer(cmd.change),
                    Duration::ZERO,
                    duration,
                    t.background_easing,
                );
            }
            for cmd in pagination.leave_section(from.section, to.section) {
                let duration = match cmd {
                    DotCommand::Hide { .. } | DotCommand::Show { animate: false, .. } => {
                        Duration::ZERO
                    }
                    _ => t.dots,
                };
                push(Actor::Dots, Action::Dots(cmd), switch, duration, Easing::EaseOut);
            }
        }

        // Title
        let old_title = title_at(deck, from);
        let new_title = title_at(deck, to);
        if old_title != new_title {
            let animation = deck
                .section(to.section)
                .map(|s| s.meta().title_animation)
                .unwrap_or_default();
            push(
                Actor::TitleClone,
                Action::CloneTitle {
                    text: new_title.to_string(),
                    animation,
                },
                switch,
                t.title,
                t.enter_easing,
            );
            push(Actor::Title, Action::FadeOut, switch, t.title, t.exit_easing);
            push(
                Actor::Title,
                Action::ReplaceTitle {
                    text: new_title.to_string(),
                },
                switch.saturating_add(t.title),
                Duration::ZERO,
                Easing::Linear,
            );
        }

        // Panel visibility
        push(
            Actor::Panel(from),
            Action::Hide,
            switch,
            Duration::ZERO,
            Easing::Linear,
        );
        let panel = deck.section(to.section).and_then(|s| s.panel(to.panel));
        let stats: Vec<_> = panel.map(|p| p.stat_items().collect()).unwrap_or_default();
        if !stats.is_empty() {
            push(
                Actor::Stats(to),
                Action::ResetStats,
                switch,
                Duration::ZERO,
                Easing::Linear,
            );
        }
        push(
            Actor::Panel(to),
            Action::Show,
            switch,
            Duration::ZERO,
            Easing::Linear,
        );

        // Enter
        push(
            Actor::Border(to),
            Action::FadeIn,
            switch,
            t.border_in,
            t.enter_easing,
        );
        push(
            Actor::Content(to),
            Action::Enter {
                offset_y: sign * t.travel,
            },
            enter,
            t.content_enter,
            t.enter_easing,
        );
        let offsets = stagger_offsets(stats.len(), t.stat_stagger, StaggerMode::Linear);
        for (item, offset) in stats.iter().zip(offsets) {
            push(
                Actor::Stats(to),
                Action::ChargeStat {
                    id: item.id,
                    progress: item.progress(),
                },
                enter.saturating_add(offset),
                t.stat_charge,
                Easing::EaseOutCubic,
            );
        }

        steps.sort_by_key(|s| s.offset);
        let plan = TransitionPlan {
            from,
            to,
            direction,
            steps,
        };
        tracing::debug!(
            target: TARGET_TRANSITION,
            %from,
            %to,
            steps = plan.steps.len(),
            total_ms = plan.total_duration().as_millis() as u64,
            "transition planned"
        );
        plan
    }
}

pub(crate) fn title_at(deck: &Deck, position: Position) -> &str {
    deck.section(position.section)
        .map_or("", |s| s.effective_title(position.panel))
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// One step's progress sample, delivered to the stage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cue {
    /// Index of the step in the plan.
    pub step: usize,
    pub actor: Actor,
    pub action: Action,
    /// Eased progress in [0, 1].
    pub progress: f32,
    /// True on the step's final cue.
    pub done: bool,
}

impl Cue {
    /// `"<actor> <action>"`, for logs and errors.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{} {}", self.actor, self.action.name())
    }
}

/// Advances a plan on a frame clock.
#[derive(Debug, Clone)]
pub struct TransitionRunner {
    plan: TransitionPlan,
    tracks: Vec<Track>,
    done: Vec<bool>,
    elapsed: Duration,
}

impl TransitionRunner {
    /// Runner at time zero of `plan`.
    #[must_use]
    pub fn new(plan: TransitionPlan) -> Self {
        let tracks: Vec<Track> = plan
            .steps
            .iter()
            .map(|s| Track::new(s.offset, s.duration, s.easing))
            .collect();
        let done = vec![false; tracks.len()];
        Self {
            plan,
            tracks,
            done,
            elapsed: Duration::ZERO,
        }
    }

    /// The plan being run.
    #[must_use]
    pub fn plan(&self) -> &TransitionPlan {
        &self.plan
    }

    /// Time since the plan started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether every step has delivered its final cue.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.done.iter().all(|d| *d)
    }

    /// Advance by `dt`; cues for every started step that has not finished,
    /// in plan order.
    pub fn advance(&mut self, dt: Duration) -> Vec<Cue> {
        self.elapsed = self.elapsed.saturating_add(dt);
        for track in &mut self.tracks {
            track.tick(dt);
        }
        self.collect()
    }

    /// Jump every step to its end state; final cues for the steps that had
    /// not finished, in plan order.
    pub fn finish(&mut self) -> Vec<Cue> {
        self.elapsed = self.elapsed.max(self.plan.total_duration());
        for track in &mut self.tracks {
            track.finish();
        }
        self.collect()
    }

    fn collect(&mut self) -> Vec<Cue> {
        let mut cues = Vec::new();
        for (index, track) in self.tracks.iter_mut().enumerate() {
            let events = track.drain_events();
            if self.done[index] || !track.has_started() {
                continue;
            }
            let done = events.contains(&TrackEvent::Completed) || track.is_complete();
            let step = &self.plan.steps[index];
            cues.push(Cue {
                step: index,
                actor: step.actor,
                action: step.action.clone(),
                progress: track.progress(),
                done,
            });
            self.done[index] = done;
        }
        cues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrolldeck_core::content::{
        BackgroundSpec, ContentElement, Panel, Section, SectionMeta, StatGroup, StatItem,
    };

    const MS_100: Duration = Duration::from_millis(100);

    fn section(title: &str, image: &str, panels: Vec<Panel>) -> Section {
        Section::new(
            SectionMeta {
                title: title.into(),
                background: Some(BackgroundSpec::new(image)),
                use_pagination: true,
                ..SectionMeta::default()
            },
            panels,
        )
    }

    fn stats_panel() -> Panel {
        Panel::with_elements(vec![ContentElement::stats(StatGroup {
            attrs: Default::default(),
            items: vec![
                StatItem::new(40.0, "a"),
                StatItem::new(75.0, "b"),
                StatItem::new(10.0, "c"),
            ],
        })])
    }

    fn deck() -> Deck {
        Deck::new(
            vec![
                section(
                    "Intro",
                    "a.jpg",
                    vec![Panel::default(), Panel::default().titled("Detail")],
                ),
                section("Results", "b.jpg", vec![stats_panel()]),
            ],
            true,
        )
    }

    fn plan(deck: &Deck, from: Position, to: Position) -> TransitionPlan {
        let mut backgrounds = BackgroundLayerStack::new(deck);
        backgrounds.initial();
        let mut pagination = PaginationManager::new(deck, from);
        let direction = Direction::between(from, to).unwrap_or(Direction::Forward);
        TransitionCoordinator::default().plan(
            deck,
            from,
            to,
            direction,
            &mut backgrounds,
            &mut pagination,
        )
    }

    #[test]
    fn border_and_content_ordering() {
        let d = deck();
        let p = plan(&d, Position::new(0, 0), Position::new(0, 1));
        let border_out = p.find(Actor::Border(p.from), "fade-out").unwrap();
        let border_in = p.find(Actor::Border(p.to), "fade-in").unwrap();
        let content_in = p.find(Actor::Content(p.to), "enter").unwrap();
        assert!(border_in.offset >= border_out.end());
        assert!(content_in.offset >= border_in.end());
    }

    #[test]
    fn steps_are_sorted_by_offset() {
        let d = deck();
        let p = plan(&d, Position::new(0, 1), Position::new(1, 0));
        assert!(p.steps.windows(2).all(|w| w[0].offset <= w[1].offset));
    }

    #[test]
    fn background_only_on_section_change() {
        let d = deck();
        let within = plan(&d, Position::new(0, 0), Position::new(0, 1));
        assert!(
            within
                .steps
                .iter()
                .all(|s| !matches!(s.actor, Actor::Background(_)))
        );

        let across = plan(&d, Position::new(0, 1), Position::new(1, 0));
        let bg: Vec<_> = across
            .steps
            .iter()
            .filter(|s| matches!(s.actor, Actor::Background(_)))
            .collect();
        assert!(!bg.is_empty());
        assert!(bg.iter().all(|s| s.offset == Duration::ZERO));
    }

    #[test]
    fn stat_reset_precedes_panel_show() {
        let d = deck();
        let p = plan(&d, Position::new(0, 1), Position::new(1, 0));
        let reset = p
            .steps
            .iter()
            .position(|s| s.action == Action::ResetStats)
            .unwrap();
        let show = p
            .steps
            .iter()
            .position(|s| s.actor == Actor::Panel(p.to) && s.action == Action::Show)
            .unwrap();
        assert!(reset < show);
        assert_eq!(p.steps[reset].offset, p.steps[show].offset);
    }

    #[test]
    fn stat_charges_are_staggered_after_content_enters() {
        let d = deck();
        let p = plan(&d, Position::new(0, 1), Position::new(1, 0));
        let content_in = p.find(Actor::Content(p.to), "enter").unwrap().offset;
        let charges: Vec<_> = p
            .steps
            .iter()
            .filter(|s| s.action.name() == "charge-stat")
            .map(|s| s.offset)
            .collect();
        let stagger = Duration::from_millis(120);
        assert_eq!(
            charges,
            vec![content_in, content_in + stagger, content_in + 2 * stagger]
        );
    }

    #[test]
    fn direction_signs_motion() {
        let d = deck();
        let fwd = plan(&d, Position::new(0, 0), Position::new(0, 1));
        assert_eq!(
            fwd.find(Actor::Content(fwd.from), "exit").unwrap().action,
            Action::Exit { offset_y: -40.0 }
        );
        assert_eq!(
            fwd.find(Actor::Content(fwd.to), "enter").unwrap().action,
            Action::Enter { offset_y: 40.0 }
        );

        let back = plan(&d, Position::new(0, 1), Position::new(0, 0));
        assert_eq!(
            back.find(Actor::Content(back.from), "exit").unwrap().action,
            Action::Exit { offset_y: 40.0 }
        );
    }

    #[test]
    fn title_swap_clones_then_replaces() {
        let d = deck();
        let p = plan(&d, Position::new(0, 0), Position::new(0, 1));
        let clone = p.find(Actor::TitleClone, "clone-title").unwrap();
        let replace = p.find(Actor::Title, "replace-title").unwrap();
        assert_eq!(
            clone.action,
            Action::CloneTitle {
                text: "Detail".into(),
                animation: TitleAnimation::FadeUp
            }
        );
        assert!(replace.offset >= clone.end());
        assert_eq!(replace.duration, Duration::ZERO);
    }

    #[test]
    fn continuation_swaps_back_to_section_title() {
        let mut d = deck();
        let section = &mut d.sections_mut()[0];
        let titled = section.authored()[1].clone();
        let cont = titled.continuation(1, vec![ContentElement::body("more")]);
        let first = section.authored()[0].clone();
        assert!(section.replace_panels(vec![first, titled, cont]));

        let p = plan(&d, Position::new(0, 1), Position::new(0, 2));
        let clone = p.find(Actor::TitleClone, "clone-title").unwrap();
        assert_eq!(
            clone.action,
            Action::CloneTitle {
                text: "Intro".into(),
                animation: TitleAnimation::FadeUp
            }
        );
        assert_eq!(
            p.find(Actor::Title, "replace-title").map(|s| &s.action),
            Some(&Action::ReplaceTitle {
                text: "Intro".into()
            })
        );
    }

    #[test]
    fn unchanged_title_is_not_swapped() {
        let d = Deck::new(
            vec![section("Same", "a.jpg", vec![Panel::default(), Panel::default()])],
            false,
        );
        let p = plan(&d, Position::new(0, 0), Position::new(0, 1));
        assert!(p.steps.iter().all(|s| s.actor != Actor::TitleClone));
    }

    #[test]
    fn runner_emits_cues_until_done() {
        let d = deck();
        let p = plan(&d, Position::new(0, 0), Position::new(0, 1));
        let total = p.total_duration();
        let mut runner = TransitionRunner::new(p);

        let first = runner.advance(Duration::ZERO);
        assert!(first.iter().all(|c| runner.plan().steps[c.step].offset == Duration::ZERO));
        assert!(!runner.is_complete());

        let mut now = Duration::ZERO;
        while now < total {
            runner.advance(MS_100);
            now += MS_100;
        }
        assert!(runner.is_complete());
        assert!(runner.advance(MS_100).is_empty());
    }

    #[test]
    fn every_step_ends_with_a_done_cue() {
        let d = deck();
        let p = plan(&d, Position::new(0, 1), Position::new(1, 0));
        let steps = p.steps.len();
        let mut runner = TransitionRunner::new(p);
        let mut cues = runner.advance(Duration::ZERO);
        cues.extend(runner.advance(Duration::from_millis(400)));

        let mut done = vec![false; steps];
        for cue in cues.iter().chain(runner.finish().iter()) {
            assert!(!done[cue.step], "cue after done for step {}", cue.step);
            done[cue.step] = cue.done;
        }
        assert!(done.iter().all(|d| *d));
        assert!(runner.is_complete());
        assert!(runner.finish().is_empty());
    }

    #[test]
    fn scaled_timings() {
        let t = TransitionTimings::default().scaled(0.0);
        assert_eq!(t.switch_offset(), Duration::ZERO);
        assert_eq!(t.travel, 40.0);
        let d = deck();
        let mut backgrounds = BackgroundLayerStack::new(&d);
        let mut pagination = PaginationManager::new(&d, Position::new(0, 0));
        let p = TransitionCoordinator::new(t).plan(
            &d,
            Position::new(0, 0),
            Position::new(0, 1),
            Direction::Forward,
            &mut backgrounds,
            &mut pagination,
        );
        let mut runner = TransitionRunner::new(p);
        runner.advance(Duration::ZERO);
        assert!(runner.is_complete());
    }
}
