#![forbid(unsafe_code)]

//! Virtual DOM parse step for the declarative content contract.
//!
//! Hosts hand over a [`VNode`] tree mirroring the page markup; [`parse_deck`]
//! turns it into a typed [`Deck`] once, at initialization. After this step
//! nothing in the workspace looks at nodes, classes, or attributes again.
//!
//! Contract:
//!
//! - `class="sections"` container; `data-use-pagination` enables
//!   section-level dots.
//! - `class="section"` children: `data-title`, `data-background`,
//!   `data-background-scale|rotate|opacity|blur`, `data-title-animation`,
//!   `data-use-pagination`.
//! - `class="panel"` children: `data-title`, `data-media`, `data-marker`,
//!   `data-stats`; elements are the children of the `class="content"` node.
//!
//! # Failure Modes
//!
//! - No `sections` container: [`DomError::MissingContainer`].
//! - Malformed attributes and missing content containers do not fail the
//!   parse; the value falls back to its default and a [`DomWarning`] is
//!   recorded (and logged under `scrolldeck::content`).

use std::collections::BTreeMap;
use std::fmt;

use crate::content::{
    BackgroundSpec, ContentElement, ContentError, Deck, ElementKind, KeyframePair, Panel,
    Section, SectionMeta, StatGroup, StatItem, TitleAnimation, parse_flag, parse_markers,
    parse_stat_sources,
};
use crate::warn;

// ---------------------------------------------------------------------------
// VNode
// ---------------------------------------------------------------------------

/// A node of the host's markup tree.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VNode {
    pub tag: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub classes: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attrs: BTreeMap<String, String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<VNode>,
    /// Direct text content.
    #[cfg_attr(feature = "serde", serde(default))]
    pub text: String,
}

impl VNode {
    /// Element with the given tag.
    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// `<div class="...">`.
    #[must_use]
    pub fn div(class: &str) -> Self {
        Self::element("div").class(class)
    }

    /// Add a class (builder).
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    /// Set an attribute (builder).
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// Set the text content (builder).
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child (builder).
    #[must_use]
    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    /// Whether the node carries `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Attribute value.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Depth-first search for the first node with `class`, including `self`.
    #[must_use]
    pub fn find_class(&self, class: &str) -> Option<&VNode> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_class(class))
    }

    /// Own text followed by all descendant text, whitespace-joined.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, out: &mut Vec<&'a str>) {
        let own = self.text.trim();
        if !own.is_empty() {
            out.push(own);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

// ---------------------------------------------------------------------------
// Errors and warnings
// ---------------------------------------------------------------------------

/// Fatal parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// No node with `class="sections"` in the tree.
    MissingContainer,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContainer => write!(f, "no element with class \"sections\" found"),
        }
    }
}

impl std::error::Error for DomError {}

/// Non-fatal problem found while parsing; the affected value was defaulted.
#[derive(Debug, Clone, PartialEq)]
pub enum DomWarning {
    /// An attribute value could not be parsed.
    Attribute {
        location: String,
        attr: &'static str,
        error: ContentError,
    },
    /// A panel has no `class="content"` node.
    MissingContent { location: String },
    /// A stat has a missing or non-numeric `data-value`.
    StatValue { location: String, value: String },
}

impl fmt::Display for DomWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute {
                location,
                attr,
                error,
            } => write!(f, "{location}: {attr}: {error}"),
            Self::MissingContent { location } => write!(f, "{location}: no content container"),
            Self::StatValue { location, value } => {
                write!(f, "{location}: invalid stat value {value:?}")
            }
        }
    }
}

/// A parsed deck plus the warnings produced along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDeck {
    pub deck: Deck,
    pub warnings: Vec<DomWarning>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a deck from the markup tree rooted at `root`.
pub fn parse_deck(root: &VNode) -> Result<ParsedDeck, DomError> {
    let container = root.find_class("sections").ok_or(DomError::MissingContainer)?;
    let mut parser = Parser::default();

    let section_pagination = parser.flag(container, "data-use-pagination", "sections");
    let sections = container
        .children
        .iter()
        .filter(|node| node.has_class("section"))
        .enumerate()
        .map(|(index, node)| parser.section(index, node))
        .collect();

    Ok(ParsedDeck {
        deck: Deck::new(sections, section_pagination),
        warnings: parser.warnings,
    })
}

#[derive(Default)]
struct Parser {
    warnings: Vec<DomWarning>,
}

impl Parser {
    fn warn(&mut self, warning: DomWarning) {
        warn!(target: crate::logging::TARGET_CONTENT, "{warning}");
        self.warnings.push(warning);
    }

    fn attr<T>(
        &mut self,
        node: &VNode,
        attr: &'static str,
        location: &str,
        parse: impl FnOnce(&str) -> Result<T, ContentError>,
    ) -> Option<T> {
        let raw = node.get_attr(attr)?;
        match parse(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                self.warn(DomWarning::Attribute {
                    location: location.to_string(),
                    attr,
                    error,
                });
                None
            }
        }
    }

    fn flag(&mut self, node: &VNode, attr: &'static str, location: &str) -> bool {
        self.attr(node, attr, location, parse_flag).unwrap_or(false)
    }

    fn keyframe(&mut self, node: &VNode, attr: &'static str, location: &str, default: f32) -> KeyframePair {
        self.attr(node, attr, location, KeyframePair::parse)
            .unwrap_or(KeyframePair::constant(default))
    }

    fn section(&mut self, index: usize, node: &VNode) -> Section {
        let location = format!("section[{index}]");
        let background = node
            .get_attr("data-background")
            .map(str::trim)
            .filter(|image| !image.is_empty())
            .map(|image| BackgroundSpec {
                image: image.to_string(),
                blur: self
                    .attr(node, "data-background-blur", &location, KeyframePair::parse)
                    .map(|pair| pair.to),
                scale: self.keyframe(node, "data-background-scale", &location, 1.0),
                rotate: self.keyframe(node, "data-background-rotate", &location, 0.0),
                opacity: self.keyframe(node, "data-background-opacity", &location, 1.0),
            });
        let meta = SectionMeta {
            title: node.get_attr("data-title").unwrap_or_default().to_string(),
            background,
            title_animation: self
                .attr(node, "data-title-animation", &location, TitleAnimation::parse)
                .unwrap_or_default(),
            use_pagination: self.flag(node, "data-use-pagination", &location),
        };

        let panels = node
            .children
            .iter()
            .filter(|child| child.has_class("panel"))
            .enumerate()
            .map(|(p, child)| self.panel(&format!("{location}.panel[{p}]"), child))
            .collect();
        Section::new(meta, panels)
    }

    fn panel(&mut self, location: &str, node: &VNode) -> Panel {
        let elements = match node.find_class("content") {
            Some(content) => content
                .children
                .iter()
                .enumerate()
                .map(|(e, child)| self.element(&format!("{location}.content[{e}]"), child))
                .collect(),
            None => {
                self.warn(DomWarning::MissingContent {
                    location: location.to_string(),
                });
                Vec::new()
            }
        };
        Panel {
            title: node
                .get_attr("data-title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            media: node
                .get_attr("data-media")
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            markers: self
                .attr(node, "data-marker", location, parse_markers)
                .unwrap_or_default(),
            stat_sources: self
                .attr(node, "data-stats", location, parse_stat_sources)
                .unwrap_or_default(),
            elements,
            ..Panel::default()
        }
    }

    fn element(&mut self, location: &str, node: &VNode) -> ContentElement {
        let kind = if node.has_class("pretitle") {
            ElementKind::Pretitle {
                text: node.text_content(),
            }
        } else if node.has_class("stats") {
            ElementKind::Stats(self.stats(location, node))
        } else {
            // Hosts may hand over uppercase tag names.
            let tag = node.tag.to_ascii_lowercase();
            match tag.as_str() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementKind::Heading {
                    level: tag[1..].parse().unwrap_or(1),
                    text: node.text_content(),
                },
                "p" => ElementKind::Body {
                    text: node.text_content(),
                },
                "ul" | "ol" => ElementKind::List {
                    ordered: tag == "ol",
                    items: node
                        .children
                        .iter()
                        .filter(|li| li.tag.eq_ignore_ascii_case("li"))
                        .map(VNode::text_content)
                        .collect(),
                },
                "img" | "video" | "figure" => ElementKind::Media {
                    src: node
                        .get_attr("src")
                        .or_else(|| node.children.iter().find_map(|c| c.get_attr("src")))
                        .unwrap_or_default()
                        .to_string(),
                    alt: node.get_attr("alt").unwrap_or_default().to_string(),
                },
                _ => ElementKind::Other {
                    tag: node.tag.clone(),
                    text: node.text_content(),
                },
            }
        };
        ContentElement::new(kind)
    }

    fn stats(&mut self, location: &str, node: &VNode) -> StatGroup {
        let mut attrs = node.attrs.clone();
        if !node.classes.is_empty() {
            attrs.insert("class".to_string(), node.classes.join(" "));
        }
        let items = node
            .children
            .iter()
            .filter(|child| child.has_class("stat"))
            .enumerate()
            .map(|(s, child)| {
                let raw = child.get_attr("data-value").unwrap_or_default();
                let value = match raw.trim().trim_end_matches('%').parse::<f32>() {
                    Ok(v) if v.is_finite() => v,
                    _ => {
                        self.warn(DomWarning::StatValue {
                            location: format!("{location}.stat[{s}]"),
                            value: raw.to_string(),
                        });
                        0.0
                    }
                };
                let label = child
                    .get_attr("data-label")
                    .map(str::to_string)
                    .unwrap_or_else(|| child.text_content());
                StatItem::new(value, label)
            })
            .collect();
        StatGroup { attrs, items }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ElementId;

    fn panel(content: Vec<VNode>) -> VNode {
        let mut c = VNode::div("content");
        c.children = content;
        VNode::div("panel").child(c)
    }

    fn sample() -> VNode {
        let intro = VNode::div("section")
            .attr("data-title", "Intro")
            .attr("data-background", "forest.jpg")
            .attr("data-background-scale", "1.6 1.0")
            .attr("data-title-animation", "slide-right")
            .child(panel(vec![
                VNode::element("p").class("pretitle").text("Chapter 1"),
                VNode::element("h2").text("The forest"),
                VNode::element("p").text("Trees everywhere."),
            ]));
        let results = VNode::div("section")
            .attr("data-title", "Results")
            .attr("data-use-pagination", "true")
            .child(
                panel(vec![
                    VNode::div("stats")
                        .attr("data-stagger", "true")
                        .child(VNode::div("stat").attr("data-value", "42").text("Cover"))
                        .child(VNode::div("stat").attr("data-value", "7%").text("Loss")),
                    VNode::element("ul")
                        .child(VNode::element("li").text("a"))
                        .child(VNode::element("li").text("b")),
                ])
                .attr("data-title", "Stats")
                .attr("data-stats", "/i/a.svg,A;/i/b.svg,B")
                .attr("data-marker", "circle,1,2"),
            );
        VNode::element("main").child(
            VNode::div("sections")
                .attr("data-use-pagination", "true")
                .child(intro)
                .child(results),
        )
    }

    #[test]
    fn parses_sections_and_panels() {
        let parsed = parse_deck(&sample()).unwrap();
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        let deck = parsed.deck;
        assert!(deck.section_pagination());
        assert_eq!(deck.sections().len(), 2);

        let intro = &deck.sections()[0];
        assert_eq!(intro.meta().title, "Intro");
        assert_eq!(intro.meta().title_animation, TitleAnimation::SlideRight);
        let bg = intro.meta().background.as_ref().unwrap();
        assert_eq!(bg.scale, KeyframePair::new(1.6, 1.0));
        assert_eq!(bg.opacity, KeyframePair::constant(1.0));

        let elements = &intro.panels()[0].elements;
        assert!(elements[0].is_pretitle());
        assert!(matches!(elements[1].kind, ElementKind::Heading { level: 2, .. }));
        assert_eq!(elements[2].id, ElementId(2));
    }

    #[test]
    fn parses_panel_attributes_and_stats() {
        let deck = parse_deck(&sample()).unwrap().deck;
        let results = &deck.sections()[1];
        assert!(results.meta().use_pagination);
        let panel = &results.panels()[0];
        assert_eq!(panel.title.as_deref(), Some("Stats"));
        assert_eq!(panel.stat_sources.len(), 2);
        assert_eq!(panel.markers[0].shape, "circle");

        let group = panel.elements[0].as_stats().unwrap();
        assert_eq!(group.attrs.get("data-stagger").map(String::as_str), Some("true"));
        assert_eq!(group.attrs.get("class").map(String::as_str), Some("stats"));
        assert_eq!(group.items.len(), 2);
        assert_eq!(group.items[1].value, 7.0);
        assert_eq!(group.items[0].label, "Cover");

        match &panel.elements[1].kind {
            ElementKind::List { ordered, items } => {
                assert!(!ordered);
                assert_eq!(items, &vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn element_tags_match_in_any_case() {
        let root = VNode::div("sections").child(VNode::div("section").child(panel(vec![
            VNode::element("H2").text("Loud"),
            VNode::element("P").text("Body"),
            VNode::element("OL").child(VNode::element("LI").text("one")),
        ])));
        let deck = parse_deck(&root).unwrap().deck;
        let elements = &deck.sections()[0].panels()[0].elements;
        assert!(matches!(elements[0].kind, ElementKind::Heading { level: 2, .. }));
        assert!(matches!(elements[1].kind, ElementKind::Body { .. }));
        match &elements[2].kind {
            ElementKind::List { ordered, items } => {
                assert!(*ordered);
                assert_eq!(items, &vec!["one".to_string()]);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn missing_container_is_an_error() {
        let root = VNode::div("page");
        assert_eq!(parse_deck(&root), Err(DomError::MissingContainer));
    }

    #[test]
    fn malformed_attributes_default_with_warning() {
        let root = VNode::div("sections").child(
            VNode::div("section")
                .attr("data-background", "a.jpg")
                .attr("data-background-rotate", "lots")
                .attr("data-title-animation", "spin")
                .child(VNode::div("panel")),
        );
        let parsed = parse_deck(&root).unwrap();
        let section = &parsed.deck.sections()[0];
        let bg = section.meta().background.as_ref().unwrap();
        assert_eq!(bg.rotate, KeyframePair::constant(0.0));
        assert_eq!(section.meta().title_animation, TitleAnimation::FadeUp);
        assert_eq!(parsed.warnings.len(), 3);
        assert!(matches!(parsed.warnings[2], DomWarning::MissingContent { .. }));
        assert_eq!(section.panel_count(), 1);
    }

    #[test]
    fn section_without_panels_gets_one() {
        let root = VNode::div("sections").child(VNode::div("section"));
        let deck = parse_deck(&root).unwrap().deck;
        assert_eq!(deck.counts(), vec![1]);
    }

    #[test]
    fn blur_uses_final_value() {
        let root = VNode::div("sections").child(
            VNode::div("section")
                .attr("data-background", "a.jpg")
                .attr("data-background-blur", "2px")
                .child(panel(Vec::new())),
        );
        let deck = parse_deck(&root).unwrap().deck;
        let bg = deck.sections()[0].meta().background.as_ref().unwrap();
        assert_eq!(bg.effective_blur(), Some(2.0));
    }

    #[test]
    fn invalid_stat_value_defaults_to_zero() {
        let root = VNode::div("sections").child(VNode::div("section").child(panel(vec![
            VNode::div("stats").child(VNode::div("stat").attr("data-value", "n/a")),
        ])));
        let parsed = parse_deck(&root).unwrap();
        assert_eq!(parsed.warnings.len(), 1);
        let group = parsed.deck.sections()[0].panels()[0].elements[0]
            .as_stats()
            .unwrap();
        assert_eq!(group.items[0].value, 0.0);
    }
}
