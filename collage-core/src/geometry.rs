//! Geometry primitives and pure helpers shared by every component.
//!
//! Nothing in here fails: degenerate inputs (inverted ranges, zero-sized
//! boxes, fewer than two touches) produce a safe fallback value instead.

use serde::{Deserialize, Serialize};

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// The origin, `(0, 0)`.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Normalized canvas center, `(0.5, 0.5)`.
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn offset_by(self, delta: Self) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y)
    }

    /// Vector from `other` to `self`.
    #[must_use]
    pub fn delta_from(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Multiply both dimensions by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// Whether both dimensions are strictly positive.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width and height.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open containment: the right and bottom edges belong to the
    /// neighbouring rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

/// Result of [`aspect_fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    /// Largest size with the content's aspect ratio that fits the box.
    pub size: Size,
    /// Offset that centers `size` inside the box.
    pub offset: Point,
}

/// Bound `value` to `[lo, hi]`.
///
/// When the range is inverted (`lo > hi`) the midpoint of the two bounds is
/// returned. A NaN value resolves to `lo`.
#[must_use]
pub fn clamp(value: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi {
        return (lo + hi) / 2.0;
    }
    if value.is_nan() || value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f32 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Distance between the first two touch points, or `0.0` with fewer than two.
#[must_use]
pub fn touch_distance(points: &[Point]) -> f32 {
    match points {
        [a, b, ..] => distance(*a, *b),
        _ => 0.0,
    }
}

/// Angle in radians of the line from the first to the second touch point,
/// or `0.0` with fewer than two.
#[must_use]
pub fn touch_angle(points: &[Point]) -> f32 {
    match points {
        [a, b, ..] => (b.y - a.y).atan2(b.x - a.x),
        _ => 0.0,
    }
}

/// Largest size preserving `content`'s aspect ratio that fits in `bounds`,
/// centered.
///
/// Degenerate content (a zero or negative dimension) fills the box.
#[must_use]
pub fn aspect_fit(content: Size, bounds: Size) -> Fit {
    if !content.is_positive() || !bounds.is_positive() {
        return Fit {
            size: bounds,
            offset: Point::ZERO,
        };
    }

    let content_aspect = content.width / content.height;
    let bounds_aspect = bounds.width / bounds.height;

    let size = if content_aspect > bounds_aspect {
        Size::new(bounds.width, bounds.width / content_aspect)
    } else {
        Size::new(bounds.height * content_aspect, bounds.height)
    };

    Fit {
        size,
        offset: Point::new(
            (bounds.width - size.width) / 2.0,
            (bounds.height - size.height) / 2.0,
        ),
    }
}

/// Smallest size preserving `content`'s aspect ratio that covers `bounds`.
///
/// Degenerate content fills the box.
#[must_use]
pub fn aspect_fill(content: Size, bounds: Size) -> Size {
    if !content.is_positive() || !bounds.is_positive() {
        return bounds;
    }
    let factor = (bounds.width / content.width).max(bounds.height / content.height);
    content.scaled(factor)
}

/// Convert a normalized `[0,1]` position into canvas pixels.
#[must_use]
pub fn normalized_to_pixels(point: Point, canvas: Size) -> Point {
    Point::new(point.x * canvas.width, point.y * canvas.height)
}

/// Convert a canvas pixel position into normalized `[0,1]` space.
///
/// Callers guarantee a positive canvas size through `CanvasConfig`.
#[must_use]
pub fn pixels_to_normalized(point: Point, canvas: Size) -> Point {
    Point::new(point.x / canvas.width, point.y / canvas.height)
}
