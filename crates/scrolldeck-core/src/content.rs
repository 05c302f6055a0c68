#![forbid(unsafe_code)]

//! Typed content model: sections, panels, and content elements.
//!
//! A [`Deck`] is an ordered list of [`Section`]s; each section owns its
//! *authored* panels (as delivered by the content source) and its *live*
//! panels (authored panels possibly split into continuation panels by the
//! overflow detector). Downstream logic reads typed values only; nothing
//! re-queries a DOM.
//!
//! Attribute value parsers for the declarative contract live here too:
//! [`KeyframePair::parse`], [`parse_markers`], [`parse_stat_sources`],
//! [`TitleAnimation::parse`], and [`parse_flag`].
//!
//! # Invariants
//!
//! 1. Element ids are unique within a deck and follow reading order; they
//!    are (re)assigned by [`Deck::new`].
//! 2. Live panels of a section always cover every authored panel, in order:
//!    part 0 of authored panel `i` precedes part 0 of authored panel `i + 1`.
//! 3. A section always has at least one authored panel; [`Section::new`]
//!    inserts an empty one otherwise.

use std::collections::BTreeMap;
use std::fmt;

use crate::navigation::PanelCounts;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Malformed attribute value in the content contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// A keyframe attribute was not one or two numbers.
    InvalidKeyframe { value: String },
    /// A marker entry was not `shape,x,y`.
    InvalidMarker { entry: String },
    /// A stat source entry was not `path,alt`.
    InvalidStatSource { entry: String },
    /// Unknown title animation kind.
    InvalidTitleAnimation { value: String },
    /// A boolean flag was neither `true` nor `false`.
    InvalidFlag { value: String },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyframe { value } => write!(f, "invalid keyframe pair: {value:?}"),
            Self::InvalidMarker { entry } => write!(f, "invalid marker entry: {entry:?}"),
            Self::InvalidStatSource { entry } => write!(f, "invalid stat source: {entry:?}"),
            Self::InvalidTitleAnimation { value } => {
                write!(f, "unknown title animation: {value:?}")
            }
            Self::InvalidFlag { value } => write!(f, "invalid boolean flag: {value:?}"),
        }
    }
}

impl std::error::Error for ContentError {}

// ---------------------------------------------------------------------------
// Attribute value types
// ---------------------------------------------------------------------------

/// A `from → to` keyframe pair, parsed from `"from to"` or a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyframePair {
    pub from: f32,
    pub to: f32,
}

impl KeyframePair {
    /// A pair with identical endpoints.
    #[must_use]
    pub const fn constant(value: f32) -> Self {
        Self {
            from: value,
            to: value,
        }
    }

    /// Create a pair.
    #[must_use]
    pub const fn new(from: f32, to: f32) -> Self {
        Self { from, to }
    }

    /// Parse `"1.6 1.0"` (from 1.6 to 1.0) or `"1.2"` (constant).
    ///
    /// Unit suffixes `px` and `deg` are accepted and stripped.
    pub fn parse(value: &str) -> Result<Self, ContentError> {
        let invalid = || ContentError::InvalidKeyframe {
            value: value.to_string(),
        };
        let mut numbers = value.split_whitespace().map(|tok| {
            tok.trim_end_matches("px")
                .trim_end_matches("deg")
                .parse::<f32>()
                .ok()
                .filter(|n| n.is_finite())
        });
        let from = numbers.next().flatten().ok_or_else(invalid)?;
        let to = match numbers.next() {
            None => from,
            Some(Some(to)) => to,
            Some(None) => return Err(invalid()),
        };
        if numbers.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { from, to })
    }

    /// Linear interpolation at `t` in [0, 1].
    #[must_use]
    pub fn lerp(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }
}

/// How a section's title swap animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TitleAnimation {
    /// New title rises into place while fading in.
    #[default]
    FadeUp,
    /// New title slides in from the left.
    SlideRight,
}

impl TitleAnimation {
    /// Parse `fade-up` / `slide-right`.
    pub fn parse(value: &str) -> Result<Self, ContentError> {
        match value.trim() {
            "fade-up" => Ok(Self::FadeUp),
            "slide-right" => Ok(Self::SlideRight),
            other => Err(ContentError::InvalidTitleAnimation {
                value: other.to_string(),
            }),
        }
    }

    /// Contract string for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FadeUp => "fade-up",
            Self::SlideRight => "slide-right",
        }
    }
}

/// Parse a `true` / `false` attribute.
pub fn parse_flag(value: &str) -> Result<bool, ContentError> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ContentError::InvalidFlag {
            value: other.to_string(),
        }),
    }
}

/// A map marker: `shape,x,y`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    pub shape: String,
    pub x: f32,
    pub y: f32,
}

/// Parse `shape,x,y;shape,x,y`. Empty entries are skipped.
pub fn parse_markers(value: &str) -> Result<Vec<Marker>, ContentError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = || ContentError::InvalidMarker {
                entry: entry.to_string(),
            };
            let parts: Vec<&str> = entry.split(',').map(str::trim).collect();
            let [shape, x, y] = parts.as_slice() else {
                return Err(invalid());
            };
            if shape.is_empty() {
                return Err(invalid());
            }
            let x = x.parse::<f32>().map_err(|_| invalid())?;
            let y = y.parse::<f32>().map_err(|_| invalid())?;
            Ok(Marker {
                shape: (*shape).to_string(),
                x,
                y,
            })
        })
        .collect()
}

/// A statistic icon source: `path,alt`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatSource {
    pub path: String,
    pub alt: String,
}

/// Parse `path,alt;path,alt`. The alt text may be empty.
pub fn parse_stat_sources(value: &str) -> Result<Vec<StatSource>, ContentError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (path, alt) = entry.split_once(',').unwrap_or((entry, ""));
            let path = path.trim();
            if path.is_empty() {
                return Err(ContentError::InvalidStatSource {
                    entry: entry.to_string(),
                });
            }
            Ok(StatSource {
                path: path.to_string(),
                alt: alt.trim().to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

/// Stable element identifier, used to key host measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// One statistic inside a stats container.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatItem {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: ElementId,
    /// Donut fill in percent, clamped to [0, 100] by [`StatItem::progress`].
    pub value: f32,
    pub label: String,
}

impl StatItem {
    /// Create a stat item (id assigned by the deck).
    #[must_use]
    pub fn new(value: f32, label: impl Into<String>) -> Self {
        Self {
            id: ElementId::default(),
            value,
            label: label.into(),
        }
    }

    /// Donut target progress in [0, 1].
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.value.is_finite() {
            (self.value / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A stats container: its own attributes (e.g. stagger markers) and items.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatGroup {
    #[cfg_attr(feature = "serde", serde(default))]
    pub attrs: BTreeMap<String, String>,
    pub items: Vec<StatItem>,
}

/// Kind and payload of a content element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "kebab-case"))]
pub enum ElementKind {
    /// Small kicker line introducing the following heading.
    Pretitle { text: String },
    /// Heading, `level` 1–6.
    Heading { level: u8, text: String },
    /// Body paragraph.
    Body { text: String },
    /// Bulleted or numbered list.
    List { ordered: bool, items: Vec<String> },
    /// Statistics container.
    Stats(StatGroup),
    /// Image or video reference.
    Media { src: String, alt: String },
    /// Anything else, kept verbatim.
    Other { tag: String, text: String },
}

/// A content element inside a panel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentElement {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: ElementId,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: ElementKind,
}

impl ContentElement {
    /// Wrap a kind (id assigned by the deck).
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::default(),
            kind,
        }
    }

    /// Pretitle element.
    #[must_use]
    pub fn pretitle(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Pretitle { text: text.into() })
    }

    /// Heading element.
    #[must_use]
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(ElementKind::Heading {
            level: level.clamp(1, 6),
            text: text.into(),
        })
    }

    /// Body paragraph.
    #[must_use]
    pub fn body(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Body { text: text.into() })
    }

    /// Unordered list.
    #[must_use]
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ElementKind::List {
            ordered: false,
            items: items.into_iter().map(Into::into).collect(),
        })
    }

    /// Stats container.
    #[must_use]
    pub fn stats(group: StatGroup) -> Self {
        Self::new(ElementKind::Stats(group))
    }

    /// Media reference.
    #[must_use]
    pub fn media(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new(ElementKind::Media {
            src: src.into(),
            alt: alt.into(),
        })
    }

    /// Whether this is a heading.
    #[must_use]
    pub fn is_heading(&self) -> bool {
        matches!(self.kind, ElementKind::Heading { .. })
    }

    /// Whether this is a pretitle.
    #[must_use]
    pub fn is_pretitle(&self) -> bool {
        matches!(self.kind, ElementKind::Pretitle { .. })
    }

    /// The stats container, if this is one.
    #[must_use]
    pub fn as_stats(&self) -> Option<&StatGroup> {
        match &self.kind {
            ElementKind::Stats(group) => Some(group),
            _ => None,
        }
    }

    /// Visible text, joined with newlines for multi-part elements.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match &self.kind {
            ElementKind::Pretitle { text }
            | ElementKind::Heading { text, .. }
            | ElementKind::Body { text }
            | ElementKind::Other { text, .. } => text.clone(),
            ElementKind::List { items, .. } => items.join("\n"),
            ElementKind::Stats(group) => group
                .items
                .iter()
                .map(|item| item.label.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            ElementKind::Media { alt, .. } => alt.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Panels and sections
// ---------------------------------------------------------------------------

/// Where a live panel came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelOrigin {
    /// Index of the authored panel within its section.
    pub source: usize,
    /// Split part; 0 is the authored panel itself.
    pub part: usize,
}

impl PanelOrigin {
    /// Whether this is a synthesized continuation panel.
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.part > 0
    }
}

/// A unit of content within a section.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Panel {
    /// Title override while this panel is active.
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub media: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub markers: Vec<Marker>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stat_sources: Vec<StatSource>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub elements: Vec<ContentElement>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub origin: PanelOrigin,
}

impl Panel {
    /// Panel with the given elements and no attributes.
    #[must_use]
    pub fn with_elements(elements: Vec<ContentElement>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    /// Set the title override (builder).
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Continuation of `self` holding `elements`.
    ///
    /// Inherits media, markers, and stat sources; carries no title override.
    #[must_use]
    pub fn continuation(&self, part: usize, elements: Vec<ContentElement>) -> Self {
        Self {
            title: None,
            media: self.media.clone(),
            markers: self.markers.clone(),
            stat_sources: self.stat_sources.clone(),
            elements,
            origin: PanelOrigin {
                source: self.origin.source,
                part,
            },
        }
    }

    /// Stat items across all stats containers, in order.
    pub fn stat_items(&self) -> impl Iterator<Item = &StatItem> {
        self.elements
            .iter()
            .filter_map(ContentElement::as_stats)
            .flat_map(|group| group.items.iter())
    }
}

/// Background image settings of a section.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BackgroundSpec {
    pub image: String,
    /// Blur radius in px; `None` or zero means no blur.
    #[cfg_attr(feature = "serde", serde(default))]
    pub blur: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default = "default_scale"))]
    pub scale: KeyframePair,
    #[cfg_attr(feature = "serde", serde(default = "default_rotate"))]
    pub rotate: KeyframePair,
    #[cfg_attr(feature = "serde", serde(default = "default_opacity"))]
    pub opacity: KeyframePair,
}

#[cfg(feature = "serde")]
fn default_scale() -> KeyframePair {
    KeyframePair::constant(1.0)
}

#[cfg(feature = "serde")]
fn default_rotate() -> KeyframePair {
    KeyframePair::constant(0.0)
}

#[cfg(feature = "serde")]
fn default_opacity() -> KeyframePair {
    KeyframePair::constant(1.0)
}

impl BackgroundSpec {
    /// Background with identity transforms and full opacity.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            blur: None,
            scale: KeyframePair::constant(1.0),
            rotate: KeyframePair::constant(0.0),
            opacity: KeyframePair::constant(1.0),
        }
    }

    /// Set the blur radius (builder).
    #[must_use]
    pub fn blurred(mut self, px: f32) -> Self {
        self.blur = Some(px);
        self
    }

    /// Blur in px with zero / invalid values normalized to `None`.
    #[must_use]
    pub fn effective_blur(&self) -> Option<f32> {
        self.blur.filter(|b| b.is_finite() && *b > 0.0)
    }
}

/// Section-level attributes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionMeta {
    /// Base title shown when the active panel has no override.
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub background: Option<BackgroundSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title_animation: TitleAnimation,
    /// Panel-level pagination dots for this section.
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_pagination: bool,
}

/// A top-level slide with its authored and live panels.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    meta: SectionMeta,
    authored: Vec<Panel>,
    panels: Vec<Panel>,
}

impl Section {
    /// Create a section. An empty panel list gets one empty panel.
    #[must_use]
    pub fn new(meta: SectionMeta, panels: Vec<Panel>) -> Self {
        let mut authored = if panels.is_empty() {
            vec![Panel::default()]
        } else {
            panels
        };
        for (index, panel) in authored.iter_mut().enumerate() {
            panel.origin = PanelOrigin {
                source: index,
                part: 0,
            };
        }
        Self {
            meta,
            panels: authored.clone(),
            authored,
        }
    }

    /// Section attributes.
    #[must_use]
    pub fn meta(&self) -> &SectionMeta {
        &self.meta
    }

    /// Panels as authored, before any overflow split.
    #[must_use]
    pub fn authored(&self) -> &[Panel] {
        &self.authored
    }

    /// Live panels (authored plus continuations).
    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Number of live panels.
    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Live panel at `index`.
    #[must_use]
    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }

    /// Replace the live panels.
    ///
    /// Ignored (returns `false`) if `panels` does not start every authored
    /// panel in order, which would break reading order.
    pub fn replace_panels(&mut self, panels: Vec<Panel>) -> bool {
        let sources: Vec<usize> = panels
            .iter()
            .filter(|p| !p.origin.is_continuation())
            .map(|p| p.origin.source)
            .collect();
        let expected: Vec<usize> = (0..self.authored.len()).collect();
        if sources != expected {
            return false;
        }
        self.panels = panels;
        true
    }

    /// Discard continuation panels and restore the authored list.
    pub fn reset_split(&mut self) {
        self.panels = self.authored.clone();
    }

    /// Live index of part 0 of authored panel `source`.
    #[must_use]
    pub fn live_index_of_source(&self, source: usize) -> Option<usize> {
        self.panels
            .iter()
            .position(|p| p.origin.source == source && p.origin.part == 0)
    }

    /// Title shown while live panel `index` is active.
    ///
    /// An explicit override wins, otherwise the section's base title.
    /// Continuation panels carry no override, so they show the base title.
    #[must_use]
    pub fn effective_title(&self, index: usize) -> &str {
        self.panels
            .get(index)
            .and_then(|panel| panel.title.as_deref())
            .unwrap_or(&self.meta.title)
    }

    /// Whether any panel carries a title override.
    #[must_use]
    pub fn has_panel_titles(&self) -> bool {
        self.authored.iter().any(|p| p.title.is_some())
    }
}

/// The whole deck.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    sections: Vec<Section>,
    section_pagination: bool,
}

impl Deck {
    /// Build a deck and assign element ids in reading order.
    #[must_use]
    pub fn new(sections: Vec<Section>, section_pagination: bool) -> Self {
        let mut deck = Self {
            sections,
            section_pagination,
        };
        deck.assign_element_ids();
        deck
    }

    /// Sections in order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Mutable sections (used by the overflow detector).
    pub fn sections_mut(&mut self) -> &mut [Section] {
        &mut self.sections
    }

    /// Section at `index`.
    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Whether section-level pagination dots are enabled.
    #[must_use]
    pub fn section_pagination(&self) -> bool {
        self.section_pagination
    }

    /// Live panel counts per section.
    #[must_use]
    pub fn counts(&self) -> Vec<usize> {
        self.sections.iter().map(Section::panel_count).collect()
    }

    /// Total number of elements and stat items (the id space).
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.authored.iter())
            .flat_map(|p| p.elements.iter())
            .map(|el| 1 + el.as_stats().map_or(0, |g| g.items.len()))
            .sum()
    }

    fn assign_element_ids(&mut self) {
        let mut next = 0u32;
        for section in &mut self.sections {
            for panel in &mut section.authored {
                for element in &mut panel.elements {
                    element.id = ElementId(next);
                    next += 1;
                    if let ElementKind::Stats(group) = &mut element.kind {
                        for item in &mut group.items {
                            item.id = ElementId(next);
                            next += 1;
                        }
                    }
                }
            }
            section.panels = section.authored.clone();
        }
    }
}

impl PanelCounts for Deck {
    fn section_count(&self) -> usize {
        self.sections.len()
    }

    fn panel_count(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, Section::panel_count)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
