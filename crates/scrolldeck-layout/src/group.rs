#![forbid(unsafe_code)]

//! Semantic grouping of panel content prior to splitting.
//!
//! Elements are decomposed into contiguous groups that move between panels
//! together:
//!
//! - a heading starts a [`GroupKind::Heading`] group;
//! - a pretitle starts a [`GroupKind::PretitleHeading`] group that absorbs
//!   the immediately following heading;
//! - a stats container is atomized into one [`GroupKind::IndividualStat`]
//!   group per item;
//! - any other element continues the current [`GroupKind::Content`] group,
//!   or starts one.
//!
//! # Invariants
//!
//! 1. Concatenating the units of all groups yields the input elements in
//!    order, with stats containers expanded to their items.
//! 2. A pretitle and its immediately following heading are always in the
//!    same group.

use scrolldeck_core::content::{ContentElement, ElementId, ElementKind, StatItem};

use crate::measure::{MeasureError, Measurer};

/// Kind of a semantic group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Heading,
    PretitleHeading,
    Content,
    IndividualStat,
}

/// Smallest piece of content the packer moves.
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    /// A whole content element.
    Element(ContentElement),
    /// One statistic lifted out of the container `container`.
    Stat { container: ElementId, item: StatItem },
}

/// A unit with its measured height.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredUnit {
    pub unit: Unit,
    pub height: f32,
}

/// A contiguous run of units that stays together unless sub-split.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticGroup {
    pub kind: GroupKind,
    pub units: Vec<MeasuredUnit>,
    /// Whether the group may be sub-split element by element.
    pub splittable: bool,
}

impl SemanticGroup {
    fn new(kind: GroupKind, first: MeasuredUnit) -> Self {
        Self {
            kind,
            units: vec![first],
            splittable: false,
        }
    }

    fn push(&mut self, unit: MeasuredUnit) {
        self.units.push(unit);
        self.splittable = matches!(self.kind, GroupKind::PretitleHeading | GroupKind::Content);
    }

    /// Total height of the group.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.units.iter().map(|u| u.height).sum()
    }
}

/// Decompose `elements` into semantic groups, measuring every unit at
/// `width`.
pub fn group_elements(
    elements: &[ContentElement],
    measurer: &impl Measurer,
    width: f32,
) -> Result<Vec<SemanticGroup>, MeasureError> {
    let mut groups: Vec<SemanticGroup> = Vec::new();

    for element in elements {
        if let ElementKind::Stats(stats) = &element.kind
            && !stats.items.is_empty()
        {
            for item in &stats.items {
                let height = measurer.stat_height(item, width)?;
                groups.push(SemanticGroup::new(
                    GroupKind::IndividualStat,
                    MeasuredUnit {
                        unit: Unit::Stat {
                            container: element.id,
                            item: item.clone(),
                        },
                        height,
                    },
                ));
            }
            continue;
        }

        let unit = MeasuredUnit {
            height: measurer.element_height(element, width)?,
            unit: Unit::Element(element.clone()),
        };

        if element.is_heading() {
            match groups.last_mut() {
                Some(last) if last.kind == GroupKind::PretitleHeading && last.units.len() == 1 => {
                    last.push(unit);
                }
                _ => groups.push(SemanticGroup::new(GroupKind::Heading, unit)),
            }
        } else if element.is_pretitle() {
            groups.push(SemanticGroup::new(GroupKind::PretitleHeading, unit));
        } else {
            match groups.last_mut() {
                Some(last) if last.kind == GroupKind::Content => last.push(unit),
                _ => groups.push(SemanticGroup::new(GroupKind::Content, unit)),
            }
        }
    }

    Ok(groups)
}
