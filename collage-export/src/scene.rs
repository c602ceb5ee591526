//! Renderer-neutral description of what an exported collage looks like.
//!
//! Built from a [`Canvas`] snapshot with every placement resolved to canvas
//! pixels, so a renderer needs no knowledge of grid math or normalized
//! coordinates. Layers are listed in draw order: grid cells, then freeform
//! photos, then text.

use collage_core::geometry::{aspect_fit, normalized_to_pixels};
use collage_core::{Canvas, ImageRef, ItemId, LayoutMode, Point, Rect};
use serde::{Deserialize, Serialize};

/// One grid cell and its photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCellLayer {
    /// Slot index.
    pub index: usize,
    /// The cell in canvas pixels. Content is clipped to it.
    pub cell: Rect,
    /// The photo, if the slot is occupied.
    pub photo: Option<GridPhotoLayer>,
}

/// A photo drawn inside a grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPhotoLayer {
    /// Photo ID.
    pub id: ItemId,
    /// Photo source.
    pub image: ImageRef,
    /// Where the zoomed and panned photo lands, in canvas pixels. May
    /// extend past the cell.
    pub content: Rect,
}

/// A freeform photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeformLayer {
    /// Photo ID.
    pub id: ItemId,
    /// Photo source.
    pub image: ImageRef,
    /// Unrotated box in canvas pixels. The photo fills it, cropping overflow.
    pub frame: Rect,
    /// Rotation about the box center, in radians.
    pub rotation: f32,
}

/// A text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    /// Text ID.
    pub id: ItemId,
    /// The text.
    pub content: String,
    /// Center in canvas pixels.
    pub center: Point,
    /// Font size in canvas pixels, scale applied.
    pub font_size: f32,
    /// Font family.
    pub font_family: String,
    /// Fill color as hex.
    pub color: String,
    /// Rotation about the center, in radians.
    pub rotation: f32,
}

/// Everything a renderer needs to draw one collage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Background fill as hex.
    pub background_color: String,
    /// Grid cells; empty unless the canvas is in grid mode.
    pub grid: Vec<GridCellLayer>,
    /// Freeform photos; empty unless the canvas is in freeform mode.
    pub freeform: Vec<FreeformLayer>,
    /// Text labels, drawn last in both modes.
    pub text: Vec<TextLayer>,
}

impl SceneDescription {
    /// Describe the canvas as it currently stands.
    ///
    /// Only the active layout mode's photos are included; freeform photos
    /// left over in grid mode are not drawn.
    #[must_use]
    pub fn from_canvas(canvas: &Canvas) -> Self {
        let config = canvas.config();
        let area = canvas.bounds();
        let canvas_size = config.size();

        let grid = match canvas.layout_mode() {
            LayoutMode::Grid => {
                let spec = canvas.grid();
                canvas
                    .grid_slots()
                    .iter()
                    .map(|slot| {
                        let cell = spec.cell_rect(slot.index, area);
                        GridCellLayer {
                            index: slot.index,
                            cell,
                            photo: slot.photo.as_ref().map(|photo| GridPhotoLayer {
                                id: photo.id,
                                image: photo.image.clone(),
                                content: grid_content_rect(
                                    cell,
                                    &photo.image,
                                    photo.scale,
                                    photo.offset,
                                ),
                            }),
                        }
                    })
                    .collect()
            }
            LayoutMode::Freeform => Vec::new(),
        };

        let freeform = match canvas.layout_mode() {
            LayoutMode::Freeform => canvas
                .freeform_items()
                .iter()
                .map(|photo| {
                    let center = normalized_to_pixels(photo.position, canvas_size);
                    FreeformLayer {
                        id: photo.id,
                        image: photo.image.clone(),
                        frame: Rect::new(
                            center.x - photo.size.width / 2.0,
                            center.y - photo.size.height / 2.0,
                            photo.size.width,
                            photo.size.height,
                        ),
                        rotation: photo.rotation,
                    }
                })
                .collect(),
            LayoutMode::Grid => Vec::new(),
        };

        let text = canvas
            .text_items()
            .iter()
            .map(|item| TextLayer {
                id: item.id,
                content: item.content.clone(),
                center: normalized_to_pixels(item.position, canvas_size),
                font_size: item.font_size(),
                font_family: item.font_family.clone(),
                color: item.color.clone(),
                rotation: item.rotation,
            })
            .collect();

        Self {
            width: config.width,
            height: config.height,
            background_color: canvas.background_color().to_string(),
            grid,
            freeform,
            text,
        }
    }

    /// Number of photo and text layers that draw something.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.grid.iter().filter(|cell| cell.photo.is_some()).count()
            + self.freeform.len()
            + self.text.len()
    }
}

/// The contain-fit box of `image` in `cell`, zoomed about the cell center
/// and shifted by `offset`.
fn grid_content_rect(cell: Rect, image: &ImageRef, scale: f32, offset: Point) -> Rect {
    let size = aspect_fit(image.size(), cell.size()).size.scaled(scale);
    let center = cell.center().offset_by(offset);
    Rect::new(
        center.x - size.width / 2.0,
        center.y - size.height / 2.0,
        size.width,
        size.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use collage_core::{CanvasConfig, Size};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn grid_scene_resolves_cells() {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 500));
        canvas.set_grid_slot_count(2);
        canvas.add_photo(ImageRef::new("wide.jpg", 2000, 1000));
        canvas.set_grid_photo_transform(0, 2.0, Point::new(50.0, 0.0)).expect("transform");
        canvas.add_text_overlay();

        let scene = SceneDescription::from_canvas(&canvas);
        assert_eq!((scene.width, scene.height), (1000, 500));
        assert!(scene.freeform.is_empty());
        assert_eq!(scene.grid.len(), 2);
        assert_eq!(scene.grid[1].cell, Rect::new(500.0, 0.0, 500.0, 500.0));
        assert!(scene.grid[1].photo.is_none());

        // 2:1 photo in a 500x500 cell fits at 500x250, zoomed to 1000x500.
        let content = scene.grid[0].photo.as_ref().expect("photo").content;
        assert!(approx(content.width, 1000.0));
        assert!(approx(content.height, 500.0));
        assert!(approx(content.center().x, 300.0));
        assert_eq!(scene.text.len(), 1);
        assert!(approx(scene.text[0].center.x, 500.0));
        assert_eq!(scene.layer_count(), 2);
    }

    #[test]
    fn freeform_scene_skips_grid() {
        let mut canvas = Canvas::new(CanvasConfig::new(1000, 1000));
        canvas.set_layout_mode(LayoutMode::Freeform);
        let id = canvas.add_freeform_photo(ImageRef::new("a.jpg", 100, 100));
        canvas
            .set_freeform_placement(id, Point::new(0.25, 0.5), Size::new(200.0, 100.0), 0.3)
            .expect("placement");

        let scene = SceneDescription::from_canvas(&canvas);
        assert!(scene.grid.is_empty());
        let layer = &scene.freeform[0];
        assert_eq!(layer.frame, Rect::new(150.0, 450.0, 200.0, 100.0));
        assert!(approx(layer.rotation, 0.3));
    }

    #[test]
    fn residual_freeform_photos_are_not_drawn_in_grid_mode() {
        let mut canvas = Canvas::default();
        canvas.set_grid_slot_count(1);
        canvas.add_photo(ImageRef::new("a.jpg", 10, 10));
        canvas.add_photo(ImageRef::new("b.jpg", 10, 10));
        assert_eq!(canvas.freeform_items().len(), 1);

        let scene = SceneDescription::from_canvas(&canvas);
        assert!(scene.freeform.is_empty());
        assert_eq!(scene.layer_count(), 1);
    }
}
