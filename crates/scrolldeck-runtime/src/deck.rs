#![forbid(unsafe_code)]

//! The deck runtime: input in, render cues out.
//!
//! [`DeckRuntime`] owns the content [`Deck`], the [`NavigationState`], and
//! every coordinator. Hosts feed it [`Event`]s with a monotonic timestamp and
//! it drives the [`Stage`] synchronously.
//!
//! # Event Flow
//!
//! ```text
//! Event ─► GestureRecognizer ─► Intent
//!            Step/First/Last/Dot ─► gate ─► TransitionCoordinator::plan ─► TransitionRunner
//!            Resize/Orientation  ─► ResizeDebouncer ─► OverflowDetector ─► PaginationManager
//!            Tick                ─► runner.advance ─► Stage::apply ─► completion
//! ```
//!
//! # Invariants
//!
//! 1. `state().is_animating()` is true exactly while a runner is active.
//! 2. `position()` is always valid for the live panel counts, including
//!    after a re-split.
//! 3. On completion the dots are refreshed before the animation flag clears;
//!    the announcer runs after that.
//! 4. A new transition never starts while another is running: the old one is
//!    fast-forwarded to its end state first.
//!
//! # Failure Modes
//!
//! | Failure | Handling |
//! |---------|----------|
//! | Stage rejects a cue | Reported, transition continues |
//! | Stage or markup references an absent node | Reported as missing, skipped |
//! | Panel cannot be measured | Reported, panel left unsplit |
//! | Transition never completes | Safety timeout lets the next navigation fast-forward it |
//! | Announcer fails | Logged at warn |

use std::time::Duration;

use scrolldeck_core::content::Deck;
use scrolldeck_core::dom::{DomWarning, ParsedDeck};
use scrolldeck_core::event::{DotTarget, Event};
use scrolldeck_core::geometry::Viewport;
use scrolldeck_core::gesture::{GestureRecognizer, Intent};
use scrolldeck_core::logging::{TARGET_NAV, TARGET_OVERFLOW, TARGET_TRANSITION};
use scrolldeck_core::navigation::{
    Direction, Gate, NavigationState, Position, panel_target, section_target, step_target,
};
use scrolldeck_layout::{Measurer, OverflowDetector, SplitReport};

use crate::announce::{Announcer, LogAnnouncer};
use crate::background::BackgroundLayerStack;
use crate::config::DeckConfig;
use crate::error::{DeckError, ErrorReporter};
use crate::pagination::{DotActivation, PaginationManager};
use crate::resize_debounce::{DebounceAction, ResizeDebouncer};
use crate::stage::{Stage, StageError};
use crate::transition::{Cue, TransitionCoordinator, TransitionPlan, TransitionRunner, title_at};

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateOutcome {
    /// A transition started.
    Started {
        from: Position,
        to: Position,
        direction: Direction,
    },
    /// Rejected by the cooldown or an in-progress transition.
    Throttled(Gate),
    /// Already at the first or last panel of the deck.
    AtBoundary(Direction),
    /// The target is the current position (or does not exist).
    Unchanged,
}

impl NavigateOutcome {
    /// Whether a transition started.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

/// What one frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Cues delivered to the stage.
    pub cues: usize,
    /// A transition completed this frame.
    pub completed: bool,
    /// A debounced resize was applied this frame.
    pub resplit: bool,
}

/// Result of [`DeckRuntime::handle_event`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOutcome {
    /// The event produced no intent (sub-threshold wheel, ignored key, ...).
    Ignored,
    Navigate(NavigateOutcome),
    /// The activated dot was already the current one.
    DotAlreadyActive,
    Resize(DebounceAction),
    Frame(FrameReport),
}

struct ActiveTransition {
    runner: TransitionRunner,
    span: tracing::Span,
    had_errors: bool,
}

/// The scroll-driven deck controller.
pub struct DeckRuntime<S, M> {
    config: DeckConfig,
    deck: Deck,
    state: NavigationState,
    gestures: GestureRecognizer,
    coordinator: TransitionCoordinator,
    backgrounds: BackgroundLayerStack,
    pagination: PaginationManager,
    detector: OverflowDetector,
    debouncer: ResizeDebouncer,
    reporter: ErrorReporter,
    active: Option<ActiveTransition>,
    last_tick: Option<Duration>,
    last_split: Option<SplitReport>,
    stage: S,
    measurer: M,
    announcer: Box<dyn Announcer>,
}

impl<S: Stage, M: Measurer> DeckRuntime<S, M> {
    /// Runtime for `deck` laid out for `viewport`. Call [`mount`](Self::mount)
    /// before feeding events.
    pub fn new(deck: Deck, config: DeckConfig, viewport: Viewport, stage: S, measurer: M) -> Self {
        let mut state = NavigationState::new().with_safety_timeout(config.navigation.safety_timeout);
        state.clamp_to(&deck);
        let position = state.position();
        Self {
            gestures: GestureRecognizer::new(config.gestures.clone()),
            coordinator: TransitionCoordinator::new(config.timings.clone()),
            backgrounds: BackgroundLayerStack::new(&deck),
            pagination: PaginationManager::new(&deck, position),
            detector: OverflowDetector::new(config.overflow),
            debouncer: ResizeDebouncer::new(config.resize.clone(), viewport),
            reporter: ErrorReporter::new(config.errors.clone()),
            active: None,
            last_tick: None,
            last_split: None,
            announcer: Box::new(LogAnnouncer),
            config,
            deck,
            state,
            stage,
            measurer,
        }
    }

    /// Runtime for a deck parsed from markup. Parse warnings go to the
    /// error reporter as missing nodes before the first event.
    pub fn from_parsed(
        parsed: ParsedDeck,
        config: DeckConfig,
        viewport: Viewport,
        stage: S,
        measurer: M,
    ) -> Self {
        let mut runtime = Self::new(parsed.deck, config, viewport, stage, measurer);
        runtime.report_content_warnings(&parsed.warnings);
        runtime
    }

    /// Report content-contract warnings (absent nodes, unparsable
    /// attributes). The affected values were already defaulted.
    pub fn report_content_warnings(&mut self, warnings: &[DomWarning]) {
        for warning in warnings {
            self.reporter.report(DeckError::from(warning));
        }
    }

    /// Replace the announcer (builder).
    #[must_use]
    pub fn with_announcer(mut self, announcer: impl Announcer + 'static) -> Self {
        self.announcer = Box::new(announcer);
        self
    }

    /// Initial overflow pass, background layers, and dots.
    pub fn mount(&mut self) -> SplitReport {
        let report = self.resplit();
        let layers = self.backgrounds.initial();
        if !layers.is_empty()
            && let Err(err) = self.stage.apply_layers(&layers)
        {
            self.report_stage("initial backgrounds", err);
        }
        tracing::info!(
            target: TARGET_NAV,
            sections = self.deck.sections().len(),
            panels = self.deck.counts().iter().sum::<usize>(),
            layers = self.backgrounds.len(),
            "deck mounted"
        );
        report
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Feed one host event observed at `now`.
    pub fn handle_event(&mut self, event: &Event, now: Duration) -> EventOutcome {
        let Some(intent) = self.gestures.process(event, now) else {
            return EventOutcome::Ignored;
        };
        match intent {
            Intent::Step(direction) => {
                EventOutcome::Navigate(self.throttled_navigate(direction, now))
            }
            Intent::First => EventOutcome::Navigate(self.go_to_section(0, now)),
            Intent::Last => {
                let last = self.deck.sections().len().saturating_sub(1);
                EventOutcome::Navigate(self.go_to_section(last, now))
            }
            Intent::Dot(target) => self.activate_dot(target, now),
            Intent::Resize(viewport) => {
                let action = self.debouncer.handle_resize(viewport, now);
                self.apply_debounce(action);
                EventOutcome::Resize(action)
            }
            Intent::OrientationChange(viewport) => {
                let action = self.debouncer.handle_orientation_change(viewport, now);
                self.apply_debounce(action);
                EventOutcome::Resize(action)
            }
            Intent::Tick => EventOutcome::Frame(self.tick(now)),
        }
    }

    /// Step one panel in `direction`, subject to the navigation gate.
    pub fn throttled_navigate(&mut self, direction: Direction, now: Duration) -> NavigateOutcome {
        if let Err(rejected) = self.admit(now) {
            return rejected;
        }
        self.navigate(direction, now)
    }

    /// Step one panel in `direction` without consulting the gate.
    pub fn navigate(&mut self, direction: Direction, now: Duration) -> NavigateOutcome {
        let from = self.state.position();
        match step_target(from, direction, &self.deck) {
            Some(to) => self.start_transition(to, direction, now),
            None => {
                tracing::debug!(target: TARGET_NAV, %from, ?direction, "at deck boundary");
                NavigateOutcome::AtBoundary(direction)
            }
        }
    }

    /// Jump to panel 0 of `section`.
    pub fn go_to_section(&mut self, section: usize, now: Duration) -> NavigateOutcome {
        let Some((to, direction)) = section_target(self.state.position(), section, &self.deck)
        else {
            return NavigateOutcome::Unchanged;
        };
        if let Err(rejected) = self.admit(now) {
            return rejected;
        }
        self.start_transition(to, direction, now)
    }

    /// Jump to `to`, which may be in another section.
    pub fn go_to_panel(&mut self, to: Position, now: Duration) -> NavigateOutcome {
        let Some((to, direction)) = panel_target(self.state.position(), to, &self.deck) else {
            return NavigateOutcome::Unchanged;
        };
        if let Err(rejected) = self.admit(now) {
            return rejected;
        }
        self.start_transition(to, direction, now)
    }

    fn activate_dot(&mut self, target: DotTarget, now: Duration) -> EventOutcome {
        match self.pagination.activate(target, self.state.position()) {
            DotActivation::Unknown => {
                tracing::debug!(target: TARGET_NAV, ?target, "no such dot");
                EventOutcome::Ignored
            }
            DotActivation::AlreadyActive => {
                self.push_dots();
                EventOutcome::DotAlreadyActive
            }
            DotActivation::Jump(target) => {
                let outcome = match target {
                    DotTarget::Section(section) => self.go_to_section(section, now),
                    DotTarget::Panel { section, panel } => {
                        self.go_to_panel(Position::new(section, panel), now)
                    }
                };
                if !outcome.is_started() {
                    self.pagination.clear_loading();
                }
                self.push_dots();
                EventOutcome::Navigate(outcome)
            }
        }
    }

    /// Check the gate; a stale transition is fast-forwarded.
    fn admit(&mut self, now: Duration) -> Result<(), NavigateOutcome> {
        match self.state.gate(now, self.config.navigation.cooldown) {
            Gate::Open => Ok(()),
            Gate::SafetyOverride { stale_for } => {
                tracing::warn!(
                    target: TARGET_NAV,
                    stale_ms = stale_for.as_millis() as u64,
                    "transition exceeded safety timeout; fast-forwarding"
                );
                self.fast_forward();
                Ok(())
            }
            gate => {
                tracing::trace!(target: TARGET_NAV, ?gate, "navigation throttled");
                Err(NavigateOutcome::Throttled(gate))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn start_transition(
        &mut self,
        to: Position,
        direction: Direction,
        now: Duration,
    ) -> NavigateOutcome {
        self.fast_forward();
        let from = self.state.position();
        let span = tracing::info_span!(
            target: TARGET_TRANSITION,
            "scrolldeck.transition",
            %from,
            %to,
            ?direction
        );
        let plan = {
            let _enter = span.enter();
            tracing::info!(target: TARGET_NAV, %from, %to, ?direction, "navigation started");
            self.coordinator.plan(
                &self.deck,
                from,
                to,
                direction,
                &mut self.backgrounds,
                &mut self.pagination,
            )
        };
        self.state.begin_transition(to, now);
        self.last_tick = Some(now);

        let mut active = ActiveTransition {
            runner: TransitionRunner::new(plan),
            span,
            had_errors: false,
        };
        self.step(&mut active, Duration::ZERO);
        if active.runner.is_complete() {
            self.complete(active);
        } else {
            self.active = Some(active);
        }
        NavigateOutcome::Started {
            from,
            to,
            direction,
        }
    }

    /// Advance animations to `now`, applying any due resize first.
    pub fn tick(&mut self, now: Duration) -> FrameReport {
        let dt = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_tick = Some(now);

        let mut report = FrameReport::default();
        let action = self.debouncer.tick(now);
        report.resplit = self.apply_debounce(action);

        if let Some(mut active) = self.active.take() {
            report.cues = self.step(&mut active, dt);
            if active.runner.is_complete() {
                self.complete(active);
                report.completed = true;
            } else {
                self.active = Some(active);
            }
        }
        report
    }

    /// Jump the running transition, if any, to its end state and complete it.
    pub fn fast_forward(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        let cues = {
            let _enter = active.span.enter();
            tracing::debug!(
                target: TARGET_TRANSITION,
                elapsed_ms = active.runner.elapsed().as_millis() as u64,
                "fast-forwarding transition"
            );
            active.runner.finish()
        };
        self.apply_cues(&mut active, &cues);
        self.complete(active);
    }

    fn step(&mut self, active: &mut ActiveTransition, dt: Duration) -> usize {
        let cues = active.runner.advance(dt);
        self.apply_cues(active, &cues);
        cues.len()
    }

    fn apply_cues(&mut self, active: &mut ActiveTransition, cues: &[Cue]) {
        let _enter = active.span.enter();
        for cue in cues {
            if let Err(source) = self.stage.apply(cue) {
                self.reporter.report(DeckError::from_stage(cue.describe(), source));
                active.had_errors = true;
            }
        }
    }

    fn complete(&mut self, active: ActiveTransition) {
        let _enter = active.span.enter();
        let position = self.state.position();
        self.pagination.refresh(position);
        let dots_ok = self.push_dots();
        self.state.finish_transition();
        if dots_ok && !active.had_errors {
            self.reporter.end_run();
        }
        tracing::info!(
            target: TARGET_TRANSITION,
            %position,
            elapsed_ms = active.runner.elapsed().as_millis() as u64,
            had_errors = active.had_errors,
            "transition complete"
        );
        if let Err(err) = self.announcer.announce(position.section, position.panel) {
            tracing::warn!(target: TARGET_NAV, %err, "announcement failed");
        }
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    fn apply_debounce(&mut self, action: DebounceAction) -> bool {
        let DebounceAction::Apply {
            viewport,
            waited,
            forced_by_deadline,
        } = action
        else {
            return false;
        };
        tracing::debug!(
            target: TARGET_OVERFLOW,
            width = viewport.width,
            height = viewport.height,
            waited_ms = waited.as_millis() as u64,
            forced_by_deadline,
            "applying resize"
        );
        self.fast_forward();
        self.measurer.viewport_changed(viewport);
        self.resplit();
        true
    }

    /// Re-split every section, keep the reader on the same authored panel,
    /// and rebuild the dots.
    fn resplit(&mut self) -> SplitReport {
        let position = self.state.position();
        let source = self
            .deck
            .section(position.section)
            .and_then(|s| s.panel(position.panel))
            .map(|p| p.origin.source);

        let report = self.detector.run(&mut self.deck, &self.measurer);
        for section in &report.sections {
            for (panel, err) in &section.failures {
                self.reporter.report(DeckError::Measurement {
                    section: section.section,
                    panel: *panel,
                    source: err.clone(),
                });
            }
        }

        let remapped = source
            .and_then(|src| self.deck.section(position.section)?.live_index_of_source(src))
            .map_or(Position::new(position.section, 0), |panel| {
                Position::new(position.section, panel)
            });
        self.state.set_position(remapped, &self.deck);
        let position = self.state.position();
        if report.changed() {
            tracing::info!(
                target: TARGET_OVERFLOW,
                splits = report.split_count(),
                %position,
                "panel structure changed"
            );
        }

        self.pagination.rebuild(&self.deck, position);
        let title = title_at(&self.deck, position).to_string();
        if let Err(err) = self.stage.structure_changed(&self.deck, position, &title) {
            self.report_stage("structure", err);
        }
        self.push_dots();
        self.last_split = Some(report.clone());
        report
    }

    fn push_dots(&mut self) -> bool {
        match self.stage.refresh_dots(self.pagination.dots()) {
            Ok(()) => true,
            Err(err) => {
                self.report_stage("dots", err);
                false
            }
        }
    }

    fn report_stage(&mut self, step: &str, source: StageError) {
        self.reporter.report(DeckError::from_stage(step, source));
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The content model with live panels.
    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Current position (the target while a transition runs).
    #[must_use]
    pub fn position(&self) -> Position {
        self.state.position()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.state.is_animating()
    }

    /// Plan of the running transition.
    #[must_use]
    pub fn active_plan(&self) -> Option<&TransitionPlan> {
        self.active.as_ref().map(|a| a.runner.plan())
    }

    #[must_use]
    pub fn pagination(&self) -> &PaginationManager {
        &self.pagination
    }

    #[must_use]
    pub fn backgrounds(&self) -> &BackgroundLayerStack {
        &self.backgrounds
    }

    #[must_use]
    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    #[must_use]
    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// Viewport the current layout was computed for.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.debouncer.applied()
    }

    /// Time until a pending resize applies, if one is pending.
    #[must_use]
    pub fn time_until_resize(&self, now: Duration) -> Option<Duration> {
        self.debouncer.time_until_apply(now)
    }

    /// Report from the most recent overflow pass.
    #[must_use]
    pub fn last_split(&self) -> Option<&SplitReport> {
        self.last_split.as_ref()
    }

    #[must_use]
    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    #[must_use]
    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    pub fn measurer_mut(&mut self) -> &mut M {
        &mut self.measurer
    }
}
