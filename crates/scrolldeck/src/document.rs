#![forbid(unsafe_code)]

//! Loading decks from JSON.
//!
//! Two shapes are accepted:
//!
//! - A [`DeckDocument`]: sections with their metadata flattened next to a
//!   `panels` array, deserialized straight into the content model.
//! - A markup tree ([`VNode`]) serialized as JSON, run through the same
//!   attribute parser a host uses for rendered markup.
//!
//! # Example
//!
//! ```ignore
//! let deck = scrolldeck::document::from_json_str(r#"{
//!     "use_pagination": true,
//!     "sections": [
//!         { "title": "Intro", "use_pagination": true,
//!           "panels": [{ "elements": [{ "type": "body", "text": "Hello" }] }] }
//!     ]
//! }"#)?;
//! ```

use std::io::Read;
use std::path::Path;

use scrolldeck_core::content::{Deck, Panel, Section, SectionMeta};
use scrolldeck_core::dom::{ParsedDeck, VNode, parse_deck};
use scrolldeck_core::logging::TARGET_CONTENT;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Serialized form of a deck.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeckDocument {
    /// Section-level pagination dots.
    #[serde(default)]
    pub use_pagination: bool,
    pub sections: Vec<SectionDocument>,
}

/// Serialized form of a section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionDocument {
    #[serde(flatten)]
    pub meta: SectionMeta,
    #[serde(default)]
    pub panels: Vec<Panel>,
}

impl DeckDocument {
    /// Build the content model. A deck needs at least one section.
    pub fn into_deck(self) -> Result<Deck> {
        if self.sections.is_empty() {
            return Err(Error::EmptyDeck);
        }
        let sections = self
            .sections
            .into_iter()
            .map(|s| Section::new(s.meta, s.panels))
            .collect();
        Ok(Deck::new(sections, self.use_pagination))
    }
}

/// Parse a [`DeckDocument`] from a JSON string.
pub fn from_json_str(json: &str) -> Result<Deck> {
    let document: DeckDocument = serde_json::from_str(json)?;
    document.into_deck()
}

/// Parse a [`DeckDocument`] from a reader.
pub fn from_reader<R: Read>(reader: R) -> Result<Deck> {
    let document: DeckDocument = serde_json::from_reader(reader)?;
    document.into_deck()
}

/// Read and parse a [`DeckDocument`] file.
pub fn from_path(path: impl AsRef<Path>) -> Result<Deck> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    tracing::debug!(target: TARGET_CONTENT, path = %path.display(), "loading deck");
    from_reader(std::io::BufReader::new(file))
}

/// Parse a markup tree serialized as JSON, keeping the parse warnings for
/// [`DeckRuntime::from_parsed`](scrolldeck_runtime::DeckRuntime::from_parsed).
///
/// Attribute problems are defaulted; only a missing sections container or
/// an empty deck is an error.
pub fn parse_markup_json(json: &str) -> Result<ParsedDeck> {
    let root: VNode = serde_json::from_str(json)?;
    let parsed = parse_deck(&root)?;
    if !parsed.warnings.is_empty() {
        tracing::info!(
            target: TARGET_CONTENT,
            warnings = parsed.warnings.len(),
            "markup parsed with defaulted values"
        );
    }
    if parsed.deck.sections().is_empty() {
        return Err(Error::EmptyDeck);
    }
    Ok(parsed)
}

/// Parse a markup tree serialized as JSON, dropping the warnings.
pub fn from_markup_json(json: &str) -> Result<Deck> {
    parse_markup_json(json).map(|parsed| parsed.deck)
}
