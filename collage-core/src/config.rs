//! Canvas sizing, presets, and grid partitioning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size};
use crate::{CanvasError, CanvasResult};

/// Smallest canvas dimension in pixels.
pub const MIN_CANVAS_DIMENSION: u32 = 1;

/// Largest canvas dimension in pixels.
pub const MAX_CANVAS_DIMENSION: u32 = 4000;

/// Pixel dimensions of the exported canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CanvasConfig {
    /// Create a configuration, clamping both axes to
    /// [`MIN_CANVAS_DIMENSION`]..=[`MAX_CANVAS_DIMENSION`].
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.clamp(MIN_CANVAS_DIMENSION, MAX_CANVAS_DIMENSION),
            height: height.clamp(MIN_CANVAS_DIMENSION, MAX_CANVAS_DIMENSION),
        }
    }

    /// Canvas size as floating point.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Dimensions are at most 4000
    pub fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }

    /// Whether both axes are inside the allowed range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let range = MIN_CANVAS_DIMENSION..=MAX_CANVAS_DIMENSION;
        range.contains(&self.width) && range.contains(&self.height)
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        CANVAS_PRESETS[0].config()
    }
}

impl fmt::Display for CanvasConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A named canvas size for a social platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasPreset {
    /// Display name.
    pub name: &'static str,
    /// Stable identifier used on the command line.
    pub slug: &'static str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CanvasPreset {
    /// The canvas configuration for this preset.
    #[must_use]
    pub fn config(&self) -> CanvasConfig {
        CanvasConfig::new(self.width, self.height)
    }

    /// Look a preset up by slug (case-insensitive).
    #[must_use]
    pub fn find(slug: &str) -> Option<&'static Self> {
        CANVAS_PRESETS
            .iter()
            .find(|preset| preset.slug.eq_ignore_ascii_case(slug))
    }
}

/// Built-in canvas presets. The first entry is the session default.
pub const CANVAS_PRESETS: &[CanvasPreset] = &[
    CanvasPreset {
        name: "Instagram Post",
        slug: "instagram-post",
        width: 1080,
        height: 1080,
    },
    CanvasPreset {
        name: "Instagram Story",
        slug: "instagram-story",
        width: 1080,
        height: 1920,
    },
    CanvasPreset {
        name: "X Post",
        slug: "x-post",
        width: 1200,
        height: 675,
    },
    CanvasPreset {
        name: "YouTube Thumbnail",
        slug: "youtube-thumbnail",
        width: 1280,
        height: 720,
    },
    CanvasPreset {
        name: "YouTube Banner",
        slug: "youtube-banner",
        width: 1920,
        height: 1080,
    },
    CanvasPreset {
        name: "Facebook Post",
        slug: "facebook-post",
        width: 1200,
        height: 1200,
    },
    CanvasPreset {
        name: "Facebook Cover",
        slug: "facebook-cover",
        width: 1640,
        height: 720,
    },
    CanvasPreset {
        name: "Pinterest Pin",
        slug: "pinterest-pin",
        width: 1000,
        height: 1500,
    },
];

/// Largest number of rows or columns in a grid.
pub const MAX_GRID_DIMENSION: usize = 10;

/// Largest number of grid slots.
pub const MAX_SLOT_COUNT: usize = MAX_GRID_DIMENSION * MAX_GRID_DIMENSION;

/// Row/column partition of the canvas in grid mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl GridSpec {
    /// Create a grid spec, clamping both axes to
    /// `1..=`[`MAX_GRID_DIMENSION`].
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows.clamp(1, MAX_GRID_DIMENSION),
            cols: cols.clamp(1, MAX_GRID_DIMENSION),
        }
    }

    /// Derive the partition for `count` slots.
    ///
    /// Counts up to six use a fixed table; larger counts use the smallest
    /// square-ish grid with `cols = ceil(sqrt(n))`, `rows = ceil(n / cols)`.
    /// Counts above [`MAX_SLOT_COUNT`] are treated as the maximum.
    #[must_use]
    pub fn for_slot_count(count: usize) -> Self {
        match count.clamp(1, MAX_SLOT_COUNT) {
            1 => Self::new(1, 1),
            2 => Self::new(1, 2),
            3 => Self::new(1, 3),
            4 => Self::new(2, 2),
            5 | 6 => Self::new(2, 3),
            n => {
                let cols = ceil_sqrt(n);
                Self::new(n.div_ceil(cols), cols)
            }
        }
    }

    /// Total cell count, `rows * cols`, saturating at `usize::MAX` for
    /// specs built without [`GridSpec::new`].
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Whether both axes are inside `1..=`[`MAX_GRID_DIMENSION`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let range = 1..=MAX_GRID_DIMENSION;
        range.contains(&self.rows) && range.contains(&self.cols)
    }

    /// Row-major `(row, col)` of a slot index.
    #[must_use]
    pub fn cell_of(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Slot index of a `(row, col)` cell.
    #[must_use]
    pub fn index_of(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Size of one cell when the grid covers `area`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_size(&self, area: Size) -> Size {
        Size::new(area.width / self.cols as f32, area.height / self.rows as f32)
    }

    /// Rectangle of slot `index` when the grid covers `area`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_rect(&self, index: usize, area: Rect) -> Rect {
        let cell = self.cell_size(area.size());
        let (row, col) = self.cell_of(index);
        Rect::new(
            area.x + col as f32 * cell.width,
            area.y + row as f32 * cell.height,
            cell.width,
            cell.height,
        )
    }
}

impl fmt::Display for GridSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl FromStr for GridSpec {
    type Err = CanvasError;

    /// Parse `"RxC"`, e.g. `"2x3"`.
    fn from_str(s: &str) -> CanvasResult<Self> {
        let invalid = || CanvasError::InvalidOperation(format!("invalid grid layout: {s}"));
        let (rows, cols) = s
            .trim()
            .split_once(|c: char| c.eq_ignore_ascii_case(&'x'))
            .ok_or_else(invalid)?;
        let rows: usize = rows.trim().parse().map_err(|_| invalid())?;
        let cols: usize = cols.trim().parse().map_err(|_| invalid())?;
        let grid = Self { rows, cols };
        if !grid.is_valid() {
            return Err(CanvasError::InvalidOperation(format!(
                "grid layout {s} outside 1x1..={MAX_GRID_DIMENSION}x{MAX_GRID_DIMENSION}"
            )));
        }
        Ok(grid)
    }
}

/// Smallest `c` with `c * c >= n`.
fn ceil_sqrt(n: usize) -> usize {
    let mut c = 1;
    while c * c < n {
        c += 1;
    }
    c
}

/// Fixed grid layouts offered by the layout picker.
pub const GRID_LAYOUTS: &[GridSpec] = &[
    GridSpec { rows: 1, cols: 2 },
    GridSpec { rows: 2, cols: 1 },
    GridSpec { rows: 1, cols: 3 },
    GridSpec { rows: 3, cols: 1 },
    GridSpec { rows: 1, cols: 4 },
    GridSpec { rows: 4, cols: 1 },
    GridSpec { rows: 2, cols: 2 },
    GridSpec { rows: 2, cols: 3 },
    GridSpec { rows: 3, cols: 2 },
    GridSpec { rows: 3, cols: 3 },
    GridSpec { rows: 2, cols: 4 },
    GridSpec { rows: 4, cols: 2 },
    GridSpec { rows: 2, cols: 5 },
    GridSpec { rows: 5, cols: 2 },
];
