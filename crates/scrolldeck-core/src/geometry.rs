#![forbid(unsafe_code)]

//! Geometry primitives in CSS pixels.
//!
//! Hosts report measurements as floating-point pixels. Negative and
//! non-finite inputs are clamped to zero at construction so downstream
//! arithmetic never has to re-check them.

/// Clamp a measurement to a finite, non-negative pixel value.
#[inline]
#[must_use]
pub fn sanitize_px(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Sides for padding/margin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sides {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Sides {
    /// Zero on every side.
    pub const ZERO: Self = Self::all(0.0);

    /// Create new sides with equal values.
    pub const fn all(val: f32) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    /// Create new sides with vertical values only.
    pub const fn vertical(val: f32) -> Self {
        Self {
            top: val,
            right: 0.0,
            bottom: val,
            left: 0.0,
        }
    }

    /// Create new sides with explicit values (CSS order).
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of top and bottom, with negative components ignored.
    #[must_use]
    pub fn vertical_sum(&self) -> f32 {
        sanitize_px(self.top) + sanitize_px(self.bottom)
    }

    /// Sum of left and right, with negative components ignored.
    #[must_use]
    pub fn horizontal_sum(&self) -> f32 {
        sanitize_px(self.left) + sanitize_px(self.right)
    }
}

impl From<f32> for Sides {
    fn from(val: f32) -> Self {
        Self::all(val)
    }
}

impl From<(f32, f32)> for Sides {
    fn from((vertical, horizontal): (f32, f32)) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

/// Viewport dimensions reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Create a viewport, clamping invalid dimensions to zero.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: sanitize_px(width),
            height: sanitize_px(height),
        }
    }

    /// Whether the viewport is taller than it is wide.
    #[must_use]
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }

    /// Whether this viewport is at most `max_width` wide.
    #[must_use]
    pub fn is_small(&self, max_width: f32) -> bool {
        self.width <= max_width
    }
}

/// Rendered box of a panel as reported by the host.
///
/// `height` is the panel's border-box height; the usable content height is
/// derived by [`PanelBox::available_height`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelBox {
    pub height: f32,
    pub content_width: f32,
    pub padding: Sides,
    pub margin: Sides,
}

impl PanelBox {
    /// Create a panel box with no padding or margin.
    #[must_use]
    pub fn new(height: f32, content_width: f32) -> Self {
        Self {
            height: sanitize_px(height),
            content_width: sanitize_px(content_width),
            padding: Sides::ZERO,
            margin: Sides::ZERO,
        }
    }

    /// Set the padding (builder).
    #[must_use]
    pub fn with_padding(mut self, padding: impl Into<Sides>) -> Self {
        self.padding = padding.into();
        self
    }

    /// Set the margin (builder).
    #[must_use]
    pub fn with_margin(mut self, margin: impl Into<Sides>) -> Self {
        self.margin = margin.into();
        self
    }

    /// Height left for content after padding, margins, and `gap_reserve`.
    ///
    /// Never negative.
    #[must_use]
    pub fn available_height(&self, gap_reserve: f32) -> f32 {
        sanitize_px(
            sanitize_px(self.height)
                - self.padding.vertical_sum()
                - self.margin.vertical_sum()
                - sanitize_px(gap_reserve),
        )
    }
}
