#![forbid(unsafe_code)]

//! Accessibility announcements after each transition.
//!
//! Announcement failures are logged and otherwise ignored.

use std::fmt;

use scrolldeck_core::logging::TARGET_NAV;

/// An announcer could not deliver a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceError(pub String);

impl fmt::Display for AnnounceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "announcement failed: {}", self.0)
    }
}

impl std::error::Error for AnnounceError {}

/// Screen-reader announcer.
pub trait Announcer {
    /// Announce that `(section, panel)` is now showing.
    fn announce(&mut self, section: usize, panel: usize) -> Result<(), AnnounceError>;
}

/// Announcer that logs at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&mut self, section: usize, panel: usize) -> Result<(), AnnounceError> {
        tracing::info!(target: TARGET_NAV, section, panel, "now showing");
        Ok(())
    }
}

/// Announcer that records announcements; optionally always fails.
#[derive(Debug, Clone, Default)]
pub struct RecordingAnnouncer {
    pub announced: Vec<(usize, usize)>,
    pub fail: bool,
}

impl Announcer for RecordingAnnouncer {
    fn announce(&mut self, section: usize, panel: usize) -> Result<(), AnnounceError> {
        self.announced.push((section, panel));
        if self.fail {
            return Err(AnnounceError("live region missing".into()));
        }
        Ok(())
    }
}

/// Human-readable announcement text, 1-based.
#[must_use]
pub fn announcement_text(section: usize, panel: usize, panels: usize, title: &str) -> String {
    let mut text = format!("Section {}", section + 1);
    if panels > 1 {
        text.push_str(&format!(", panel {} of {panels}", panel + 1));
    }
    if !title.is_empty() {
        text.push_str(": ");
        text.push_str(title);
    }
    text
}
