#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! The host translates browser (or native) input into these values and
//! pushes them into the runtime. All events derive `Clone` and `PartialEq`
//! for use in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Wheel deltas use the browser convention: positive `delta_y` scrolls
//!   down (towards later content).
//! - Touch coordinates are CSS pixels relative to the viewport.
//! - `KeyEventKind` defaults to `Press` when the host cannot distinguish.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

use crate::geometry::Viewport;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A wheel (mouse wheel or trackpad) event.
    Wheel(WheelEvent),

    /// A touch event.
    Touch(TouchEvent),

    /// A pagination dot was clicked or activated from the keyboard.
    DotActivated(DotTarget),

    /// The viewport was resized.
    Resize(Viewport),

    /// The device orientation changed; carries the new viewport.
    OrientationChange(Viewport),

    /// A frame tick from the host's animation clock.
    Tick,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether any of Ctrl, Alt, or Super is held.
    ///
    /// Such combinations belong to the browser (zoom, history) and are never
    /// interpreted as navigation.
    #[must_use]
    pub const fn has_command_modifier(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::CTRL.union(Modifiers::ALT).union(Modifiers::SUPER))
    }
}

/// Key codes relevant to deck navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyCode {
    /// A regular character key (space is `Char(' ')`).
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Tab key.
    Tab,

    /// Home key.
    Home,

    /// End key.
    End,

    /// Page Up key.
    PageUp,

    /// Page Down key.
    PageDown,

    /// Up arrow key.
    Up,

    /// Down arrow key.
    Down,

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A wheel event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WheelEvent {
    /// Vertical delta in pixels; positive scrolls towards later content.
    pub delta_y: f32,
}

impl WheelEvent {
    /// Create a wheel event.
    #[must_use]
    pub const fn new(delta_y: f32) -> Self {
        Self { delta_y }
    }
}

/// A touch event (single primary touch point).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TouchEvent {
    /// Phase of the touch interaction.
    pub phase: TouchPhase,

    /// Vertical position of the primary touch point in CSS pixels.
    pub y: f32,
}

impl TouchEvent {
    /// Create a touch event.
    #[must_use]
    pub const fn new(phase: TouchPhase, y: f32) -> Self {
        Self { phase, y }
    }
}

/// Touch interaction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TouchPhase {
    /// Finger down.
    Start,
    /// Finger moved.
    Move,
    /// Finger lifted.
    End,
    /// Touch interrupted by the system.
    Cancel,
}

/// The navigation target behind a pagination dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DotTarget {
    /// A section-level dot.
    Section(usize),
    /// A panel-level dot.
    Panel { section: usize, panel: usize },
}

impl DotTarget {
    /// Section index this dot belongs to.
    #[must_use]
    pub const fn section(&self) -> usize {
        match *self {
            Self::Section(section) | Self::Panel { section, .. } => section,
        }
    }
}
