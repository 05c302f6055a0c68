#![forbid(unsafe_code)]

//! Pagination dots.
//!
//! Dots are always derived from the live panel structure: one section dot
//! per section when the deck enables section dots, plus one panel dot per
//! live panel of every section with pagination enabled. Panel dots are
//! grouped per section; a group's visibility follows where the reader has
//! been:
//!
//! | Group | State |
//! |-------|-------|
//! | active section | shown |
//! | visited, not active | hidden (`display: none`), restored without animation |
//! | never visited, not active | shown until the reader first leaves a section whose dots were shown, then animated out |
//!
//! # Invariants
//!
//! 1. After [`PaginationManager::rebuild`] the panel dots of a section equal
//!    its live panel count.
//! 2. Exactly one section dot and at most one panel dot are active.
//! 3. Loading flags clear when a transition completes.

use scrolldeck_core::content::Deck;
use scrolldeck_core::event::DotTarget;
use scrolldeck_core::logging::TARGET_PAGINATION;
use scrolldeck_core::navigation::Position;
use smallvec::SmallVec;

/// Whether a dot targets a section or a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DotKind {
    Section,
    Panel,
}

/// One pagination dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaginationDot {
    pub kind: DotKind,
    pub section: usize,
    pub panel: Option<usize>,
    pub active: bool,
    pub loading: bool,
}

impl PaginationDot {
    /// Navigation target behind the dot.
    #[must_use]
    pub fn target(&self) -> DotTarget {
        match self.panel {
            Some(panel) => DotTarget::Panel {
                section: self.section,
                panel,
            },
            None => DotTarget::Section(self.section),
        }
    }

    fn matches(&self, target: DotTarget) -> bool {
        self.target() == target
    }
}

/// Visibility of a section's panel-dot group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupVisibility {
    Shown,
    /// `display: none`; restored without animation.
    Hidden,
    /// Animated out; re-showing animates in.
    AnimatedOut,
}

/// A visibility change for a panel-dot group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DotCommand {
    /// Show the group; `animate` is false when restoring a visited group.
    Show { section: usize, animate: bool },
    /// Hide the group instantly.
    Hide { section: usize },
    /// Animate the group out.
    AnimateOut { section: usize },
}

/// Result of activating a dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotActivation {
    /// Jump to the dot's target; the dot is now loading.
    Jump(DotTarget),
    /// The dot was already active; loading cleared, nothing to do.
    AlreadyActive,
    /// No such dot.
    Unknown,
}

#[derive(Debug, Clone, Copy)]
struct GroupState {
    enabled: bool,
    visited: bool,
    visibility: GroupVisibility,
}

/// Pagination dot bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct PaginationManager {
    dots: Vec<PaginationDot>,
    groups: Vec<GroupState>,
}

impl PaginationManager {
    /// Dots for `deck` with `position` active and its section visited.
    #[must_use]
    pub fn new(deck: &Deck, position: Position) -> Self {
        let mut manager = Self::default();
        manager.rebuild(deck, position);
        if let Some(group) = manager.groups.get_mut(position.section) {
            group.visited = true;
        }
        manager
    }

    /// Regenerate all dots from the live structure, keeping group state.
    pub fn rebuild(&mut self, deck: &Deck, position: Position) {
        let sections = deck.sections();
        self.groups.truncate(sections.len());
        while self.groups.len() < sections.len() {
            self.groups.push(GroupState {
                enabled: false,
                visited: false,
                visibility: GroupVisibility::Shown,
            });
        }

        self.dots.clear();
        if deck.section_pagination() {
            self.dots
                .extend((0..sections.len()).map(|section| PaginationDot {
                    kind: DotKind::Section,
                    section,
                    panel: None,
                    active: false,
                    loading: false,
                }));
        }
        for (index, section) in sections.iter().enumerate() {
            let enabled = section.meta().use_pagination;
            self.groups[index].enabled = enabled;
            if !enabled {
                continue;
            }
            self.dots
                .extend((0..section.panel_count()).map(|panel| PaginationDot {
                    kind: DotKind::Panel,
                    section: index,
                    panel: Some(panel),
                    active: false,
                    loading: false,
                }));
        }
        self.mark_active(position);

        tracing::debug!(
            target: TARGET_PAGINATION,
            dots = self.dots.len(),
            "pagination rebuilt"
        );
    }

    /// All dots: section dots first, then panel dots in reading order.
    #[must_use]
    pub fn dots(&self) -> &[PaginationDot] {
        &self.dots
    }

    /// Panel dots of `section`.
    pub fn panel_dots(&self, section: usize) -> impl Iterator<Item = &PaginationDot> {
        self.dots
            .iter()
            .filter(move |d| d.kind == DotKind::Panel && d.section == section)
    }

    /// Visibility of a section's panel-dot group, if it has one.
    #[must_use]
    pub fn group_visibility(&self, section: usize) -> Option<GroupVisibility> {
        self.groups
            .get(section)
            .filter(|g| g.enabled)
            .map(|g| g.visibility)
    }

    /// Whether the reader has been in `section`.
    #[must_use]
    pub fn is_visited(&self, section: usize) -> bool {
        self.groups.get(section).is_some_and(|g| g.visited)
    }

    /// Whether any dot is loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.dots.iter().any(|d| d.loading)
    }

    /// Group visibility changes for leaving section `from` for `to`.
    pub fn leave_section(&mut self, from: usize, to: usize) -> SmallVec<[DotCommand; 4]> {
        let mut commands = SmallVec::new();
        if from == to || to >= self.groups.len() {
            return commands;
        }

        let from_was_shown = self
            .groups
            .get(from)
            .is_some_and(|g| g.enabled && g.visibility == GroupVisibility::Shown);

        for (section, group) in self.groups.iter_mut().enumerate() {
            if !group.enabled || section == to {
                continue;
            }
            if section == from {
                if group.visibility == GroupVisibility::Shown {
                    group.visibility = GroupVisibility::Hidden;
                    commands.push(DotCommand::Hide { section });
                }
            } else if from_was_shown && !group.visited && group.visibility == GroupVisibility::Shown
            {
                group.visibility = GroupVisibility::AnimatedOut;
                commands.push(DotCommand::AnimateOut { section });
            }
        }

        let target = &mut self.groups[to];
        if target.enabled && target.visibility != GroupVisibility::Shown {
            commands.push(DotCommand::Show {
                section: to,
                animate: target.visibility == GroupVisibility::AnimatedOut,
            });
            target.visibility = GroupVisibility::Shown;
        }
        target.visited = true;

        if !commands.is_empty() {
            tracing::debug!(
                target: TARGET_PAGINATION,
                from,
                to,
                commands = commands.len(),
                "dot groups updated"
            );
        }
        commands
    }

    /// Activate the dot for `target` while at `current`.
    pub fn activate(&mut self, target: DotTarget, current: Position) -> DotActivation {
        let Some(index) = self.dots.iter().position(|d| d.matches(target)) else {
            return DotActivation::Unknown;
        };
        let already = match target {
            DotTarget::Section(section) => section == current.section,
            DotTarget::Panel { section, panel } => Position::new(section, panel) == current,
        };
        if already {
            self.clear_loading();
            return DotActivation::AlreadyActive;
        }
        self.dots[index].loading = true;
        DotActivation::Jump(target)
    }

    /// Restyle for `position` and clear loading flags. Called when a
    /// transition completes.
    pub fn refresh(&mut self, position: Position) {
        self.mark_active(position);
        self.clear_loading();
    }

    /// Clear every loading flag.
    pub fn clear_loading(&mut self) {
        for dot in &mut self.dots {
            dot.loading = false;
        }
    }

    fn mark_active(&mut self, position: Position) {
        for dot in &mut self.dots {
            dot.active = match dot.kind {
                DotKind::Section => dot.section == position.section,
                DotKind::Panel => {
                    dot.section == position.section && dot.panel == Some(position.panel)
                }
            };
        }
    }
}
