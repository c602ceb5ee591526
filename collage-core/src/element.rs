//! Canvas items - the photos and text labels placed on a collage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{aspect_fit, clamp, Point, Size};

/// Edge length of a freshly placed freeform photo, before clamping.
pub const FREEFORM_BASE_EDGE: f32 = 220.0;

/// Smallest edge a freshly placed freeform photo may have.
pub const FREEFORM_MIN_EDGE: f32 = 140.0;

/// Largest edge a freshly placed freeform photo may have.
pub const FREEFORM_MAX_EDGE: f32 = 360.0;

/// Smallest edge a freeform photo can be pinched down to.
pub const FREEFORM_MIN_SIZE: f32 = 60.0;

/// Lower zoom bound for a photo inside a grid slot.
pub const GRID_MIN_SCALE: f32 = 0.25;

/// Upper zoom bound for a photo inside a grid slot.
pub const GRID_MAX_SCALE: f32 = 4.0;

/// Lower scale bound for text.
pub const TEXT_MIN_SCALE: f32 = 0.4;

/// Upper scale bound for text.
pub const TEXT_MAX_SCALE: f32 = 4.0;

/// Content of a new text overlay.
pub const DEFAULT_TEXT: &str = "Your text here";

/// Color of a new text overlay.
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";

/// Font size of a new text overlay, in canvas pixels at scale 1.
pub const DEFAULT_FONT_SIZE: f32 = 32.0;

/// Fonts a text overlay may use. The first is the default.
pub const AVAILABLE_FONTS: &[&str] = &[
    "HelveticaNeue-Bold",
    "AvenirNext-DemiBold",
    "Futura-Medium",
    "GillSans-SemiBold",
];

/// Unique identifier for a photo or text item.
///
/// Stable for the life of the item, including across layout mode changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Create a new unique item ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a picked photo plus its intrinsic pixel size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Source URI (file path, content URI, ...).
    pub uri: String,
    /// Intrinsic width in pixels.
    pub pixel_width: u32,
    /// Intrinsic height in pixels.
    pub pixel_height: u32,
}

impl ImageRef {
    /// Create a new image reference.
    #[must_use]
    pub fn new(uri: impl Into<String>, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            uri: uri.into(),
            pixel_width,
            pixel_height,
        }
    }

    /// Intrinsic size as floating point.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size(&self) -> Size {
        Size::new(self.pixel_width as f32, self.pixel_height as f32)
    }

    /// Width over height; a zero height counts as one pixel.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        let size = self.size();
        size.width / size.height.max(1.0)
    }
}

/// Default box for a photo dropped onto the freeform canvas.
///
/// The long edge is [`FREEFORM_BASE_EDGE`], the short edge follows the
/// image's aspect ratio, and both are clamped to
/// [`FREEFORM_MIN_EDGE`]..=[`FREEFORM_MAX_EDGE`].
#[must_use]
pub fn default_freeform_size(image: &ImageRef) -> Size {
    let aspect = image.aspect_ratio().max(0.01);
    let (width, height) = if aspect >= 1.0 {
        (FREEFORM_BASE_EDGE, FREEFORM_BASE_EDGE / aspect)
    } else {
        (FREEFORM_BASE_EDGE * aspect, FREEFORM_BASE_EDGE)
    };
    Size::new(
        clamp(width, FREEFORM_MIN_EDGE, FREEFORM_MAX_EDGE),
        clamp(height, FREEFORM_MIN_EDGE, FREEFORM_MAX_EDGE),
    )
}

/// A photo on the canvas.
///
/// In a grid slot, `scale` and `offset` place the photo relative to the
/// slot's contain-fit box. On the freeform canvas, `position`, `size` and
/// `rotation` place it relative to the whole canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoItem {
    /// Unique identifier.
    pub id: ItemId,
    /// The photo source.
    pub image: ImageRef,
    /// Center, normalized to the canvas.
    pub position: Point,
    /// Freeform box in canvas pixels.
    pub size: Size,
    /// Rotation in radians.
    pub rotation: f32,
    /// Zoom relative to the slot's fit box.
    pub scale: f32,
    /// Pan inside the slot, in canvas pixels.
    pub offset: Point,
}

impl PhotoItem {
    /// Create a photo with default placement.
    #[must_use]
    pub fn new(image: ImageRef) -> Self {
        let size = default_freeform_size(&image);
        Self {
            id: ItemId::new(),
            image,
            position: Point::CENTER,
            size,
            rotation: 0.0,
            scale: 1.0,
            offset: Point::ZERO,
        }
    }

    /// Reset every placement field to its default: centered, default
    /// freeform size, unrotated, no grid zoom or pan. The ID is kept, so a
    /// photo moving between grid and freeform keeps its identity.
    #[must_use]
    pub fn with_default_placement(mut self) -> Self {
        self.position = Point::CENTER;
        self.size = default_freeform_size(&self.image);
        self.rotation = 0.0;
        self.scale = 1.0;
        self.offset = Point::ZERO;
        self
    }

    /// Largest pan in each axis at `scale`; see [`grid_pan_limit`].
    #[must_use]
    pub fn grid_pan_limit(&self, slot: Size, scale: f32) -> Point {
        grid_pan_limit(self.image.size(), slot, scale)
    }

    /// Clamp `offset` into the pan limit at `scale`.
    #[must_use]
    pub fn clamp_grid_offset(&self, slot: Size, scale: f32, offset: Point) -> Point {
        clamp_grid_offset(self.image.size(), slot, scale, offset)
    }
}

/// Largest pan in each axis that keeps an image of intrinsic size `image`,
/// contain-fit into `slot` and zoomed by `scale`, covering the slot. An axis
/// where the zoomed content is smaller than the slot cannot pan.
#[must_use]
pub fn grid_pan_limit(image: Size, slot: Size, scale: f32) -> Point {
    let content = aspect_fit(image, slot).size.scaled(scale);
    Point::new(
        ((content.width - slot.width) / 2.0).max(0.0),
        ((content.height - slot.height) / 2.0).max(0.0),
    )
}

/// Clamp a slot pan `offset` into [`grid_pan_limit`].
#[must_use]
pub fn clamp_grid_offset(image: Size, slot: Size, scale: f32, offset: Point) -> Point {
    let limit = grid_pan_limit(image, slot, scale);
    Point::new(
        clamp(offset.x, -limit.x, limit.x),
        clamp(offset.y, -limit.y, limit.y),
    )
}

/// A text label on the canvas. Independent of the layout mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    /// Unique identifier.
    pub id: ItemId,
    /// The text.
    pub content: String,
    /// Center, normalized to the canvas.
    pub position: Point,
    /// Scale applied to `base_font_size`, within
    /// [`TEXT_MIN_SCALE`]..=[`TEXT_MAX_SCALE`].
    pub scale: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Fill color as hex.
    pub color: String,
    /// Font family name.
    pub font_family: String,
    /// Font size at scale 1, in canvas pixels.
    pub base_font_size: f32,
}

impl TextItem {
    /// Create a text item at the canvas center with the default style.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            content: content.into(),
            position: Point::CENTER,
            scale: 1.0,
            rotation: 0.0,
            color: DEFAULT_TEXT_COLOR.to_string(),
            font_family: AVAILABLE_FONTS[0].to_string(),
            base_font_size: DEFAULT_FONT_SIZE,
        }
    }

    /// Effective font size.
    #[must_use]
    pub fn font_size(&self) -> f32 {
        self.base_font_size * self.scale
    }
}

impl Default for TextItem {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT)
    }
}

/// One cell of the grid. Holds at most one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSlot {
    /// Row-major position in the grid.
    pub index: usize,
    /// The occupying photo, if any.
    pub photo: Option<PhotoItem>,
}

impl GridSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn empty(index: usize) -> Self {
        Self { index, photo: None }
    }

    /// Whether the slot has no photo.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.photo.is_none()
    }
}
