//! Mapping between screen coordinates and canvas pixels.

use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::geometry::{aspect_fit, Point, Rect, Size};

/// Where the canvas is displayed on screen.
///
/// The canvas keeps its aspect ratio; `frame` is the on-screen rectangle it
/// occupies. In grid mode the grid covers the whole frame, so the frame is
/// also the grid bounding box used for drop hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    frame: Rect,
    canvas: Size,
}

impl Viewport {
    /// Fit the canvas into `available`, leaving `padding` on every side.
    ///
    /// Padding that would leave no room is ignored.
    #[must_use]
    pub fn fit(config: &CanvasConfig, available: Rect, padding: f32) -> Self {
        let padded = Size::new(
            available.width - 2.0 * padding,
            available.height - 2.0 * padding,
        );
        let (inset, room) = if padded.is_positive() {
            (padding, padded)
        } else {
            (0.0, available.size())
        };

        let canvas = config.size();
        let fit = aspect_fit(canvas, room);
        let frame = Rect::new(
            available.x + inset + fit.offset.x,
            available.y + inset + fit.offset.y,
            fit.size.width,
            fit.size.height,
        );
        Self { frame, canvas }
    }

    /// The canvas displayed at 1:1 with its origin at the screen origin.
    #[must_use]
    pub fn identity(config: &CanvasConfig) -> Self {
        let canvas = config.size();
        Self {
            frame: Rect::new(0.0, 0.0, canvas.width, canvas.height),
            canvas,
        }
    }

    /// On-screen rectangle of the canvas.
    #[must_use]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Canvas size in canvas pixels.
    #[must_use]
    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// Screen points per canvas pixel. Falls back to 1 for an empty frame.
    #[must_use]
    pub fn display_scale(&self) -> f32 {
        if self.frame.width > 0.0 && self.canvas.width > 0.0 {
            self.frame.width / self.canvas.width
        } else {
            1.0
        }
    }

    /// Screen point to canvas pixels.
    #[must_use]
    pub fn screen_to_canvas(&self, point: Point) -> Point {
        let scale = self.display_scale();
        Point::new(
            (point.x - self.frame.x) / scale,
            (point.y - self.frame.y) / scale,
        )
    }

    /// Canvas pixels to a screen point.
    #[must_use]
    pub fn canvas_to_screen(&self, point: Point) -> Point {
        let scale = self.display_scale();
        Point::new(
            self.frame.x + point.x * scale,
            self.frame.y + point.y * scale,
        )
    }

    /// Screen-space movement to canvas-pixel movement.
    #[must_use]
    pub fn delta_to_canvas(&self, delta: Point) -> Point {
        let scale = self.display_scale();
        Point::new(delta.x / scale, delta.y / scale)
    }
}
