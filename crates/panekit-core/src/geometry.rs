#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A rectangle in panel pixel coordinates (origin at top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Rect {
    /// The zero rectangle.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge.
    #[inline]
    pub const fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub const fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if the rectangle has no positive area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Create a new rectangle inside the current one with the given margin.
    ///
    /// Width and height clamp at zero rather than going negative.
    pub fn inner(&self, margin: Sides) -> Rect {
        let width = (self.width - margin.horizontal_sum()).max(0.0);
        let height = (self.height - margin.vertical_sum()).max(0.0);
        Rect {
            x: self.x + margin.left,
            y: self.y + margin.top,
            width,
            height,
        }
    }

    /// Compare two rectangles within a per-component tolerance.
    ///
    /// Hosts hand the panel its area every frame; this decides whether the
    /// area actually changed.
    pub fn approx_eq(&self, other: &Rect, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.width - other.width).abs() <= epsilon
            && (self.height - other.height).abs() <= epsilon
    }
}

/// Sides for padding/margin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sides {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Sides {
    /// Create new sides with equal values.
    pub const fn all(val: f32) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    /// Create new sides with horizontal values only.
    pub const fn horizontal(val: f32) -> Self {
        Self {
            top: 0.0,
            right: val,
            bottom: 0.0,
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

    /// Create new sides with specific values.
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub const fn horizontal_sum(&self) -> f32 {
        self.left + self.right
    }

    /// Sum of top and bottom.
    #[inline]
    pub const fn vertical_sum(&self) -> f32 {
        self.top + self.bottom
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

impl From<(f32, f32, f32, f32)> for Sides {
    fn from((top, right, bottom, left): (f32, f32, f32, f32)) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// How an element claims extent along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMode {
    /// Take whatever the parent offers (width) or the intrinsic size (height).
    #[default]
    Auto,
    /// A declared pixel extent.
    Fixed(f32),
}

impl SizeMode {
    /// Resolve a width against the extent offered by the parent.
    ///
    /// Fixed widths clamp to `[0, available]`; an element never claims more
    /// horizontal room than it was offered.
    #[inline]
    pub fn resolve_width(self, available: f32) -> f32 {
        match self {
            SizeMode::Auto => available,
            SizeMode::Fixed(px) => px.clamp(0.0, available.max(0.0)),
        }
    }

    /// Resolve a height against an intrinsic size.
    ///
    /// Fixed heights are taken verbatim; vertical extent is owed to the
    /// element, not rationed by the parent.
    #[inline]
    pub fn resolve_height(self, intrinsic: f32) -> f32 {
        match self {
            SizeMode::Auto => intrinsic,
            SizeMode::Fixed(px) => px,
        }
    }

    /// Whether this mode defers to the context.
    #[inline]
    pub const fn is_auto(self) -> bool {
        matches!(self, SizeMode::Auto)
    }
}
