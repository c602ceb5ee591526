//! Rasterization of a [`SceneDescription`].
//!
//! [`SceneRenderer`] is the seam the export coordinator drives; a host app
//! plugs in its own view-capture implementation. [`CompositeRenderer`] is a
//! software implementation: photos are drawn with `tiny-skia` under an
//! affine transform and a clip mask, and text goes through an SVG document
//! rendered by `resvg`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Cursor;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use collage_core::config::MAX_CANVAS_DIMENSION;
use image::{ImageFormat, Rgba, RgbaImage};
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Mask, PathBuilder, Pixmap, PixmapPaint, Transform,
};
use usvg::fontdb;

use crate::error::RenderError;
use crate::scene::{FreeformLayer, GridCellLayer, SceneDescription, TextLayer};

/// Background used when the scene's color cannot be parsed.
const FALLBACK_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Text fill used when a layer's color cannot be parsed.
const FALLBACK_TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Font every generic family resolves to, so labels render on hosts
/// without system fonts.
const BUNDLED_FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");
const BUNDLED_FONT_FAMILY: &str = "DejaVu Sans";

/// A rendered collage.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    /// Wrap an RGBA buffer.
    #[must_use]
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The pixel buffer.
    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn from_pixmap(pixmap: &Pixmap) -> Result<Self, RenderError> {
        let data = pixmap
            .pixels()
            .iter()
            .flat_map(|pixel| {
                let color = pixel.demultiply();
                [color.red(), color.green(), color.blue(), color.alpha()]
            })
            .collect();
        RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
            .map(Self::new)
            .ok_or_else(|| RenderError::Raster("pixel buffer size mismatch".to_string()))
    }
}

/// Turns a scene description into pixels.
#[async_trait]
pub trait SceneRenderer: Send + Sync {
    /// Let the presentation layer draw one frame, so state changed just
    /// before a capture (such as a cleared selection) is on screen.
    async fn yield_frame(&self) {
        tokio::task::yield_now().await;
    }

    /// Render `scene` at `width` x `height` pixels.
    async fn capture(
        &self,
        scene: &SceneDescription,
        width: u32,
        height: u32,
    ) -> Result<RasterImage, RenderError>;
}

/// Software compositor: background, grid cells, freeform photos, then text.
///
/// Grid photos are drawn contain-fit, zoomed and panned, and clipped to
/// their cell. Freeform photos fill their box, cropping overflow, and are
/// rotated about its center. Photos are sampled straight from the decoded
/// source, so no intermediate buffer is ever larger than the output.
#[derive(Debug, Clone, Copy)]
pub struct CompositeRenderer {
    filter: FilterQuality,
}

impl Default for CompositeRenderer {
    fn default() -> Self {
        Self {
            filter: FilterQuality::Bicubic,
        }
    }
}

impl CompositeRenderer {
    /// Create a renderer with bicubic sampling.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different sampling filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterQuality) -> Self {
        self.filter = filter;
        self
    }

    /// Render synchronously. Loads photos from disk; `file://` URIs are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is out of range, a photo cannot be
    /// loaded, or the text layers cannot be laid out.
    #[allow(clippy::cast_precision_loss)]
    pub fn render(
        &self,
        scene: &SceneDescription,
        width: u32,
        height: u32,
    ) -> Result<RasterImage, RenderError> {
        if width == 0 || height == 0 || width > MAX_CANVAS_DIMENSION || height > MAX_CANVAS_DIMENSION
        {
            return Err(RenderError::InvalidSize { width, height });
        }
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::InvalidSize { width, height })?;

        let background = parse_hex_color(&scene.background_color).unwrap_or_else(|| {
            tracing::warn!(
                "Unparseable background color {:?}, using white",
                scene.background_color
            );
            FALLBACK_BACKGROUND
        });
        let [r, g, b, a] = background.0;
        pixmap.fill(Color::from_rgba8(r, g, b, a));

        let scene_to_output = Transform::from_scale(
            width as f32 / scene.width.max(1) as f32,
            height as f32 / scene.height.max(1) as f32,
        );
        let mut cache = ImageCache::default();

        for cell in &scene.grid {
            self.draw_grid_cell(&mut pixmap, cell, scene_to_output, &mut cache)?;
        }
        for layer in &scene.freeform {
            self.draw_freeform(&mut pixmap, layer, scene_to_output, &mut cache)?;
        }
        draw_text(&mut pixmap, scene)?;

        tracing::debug!(
            "Rendered {width}x{height} with {} cells, {} freeform photos, {} labels",
            scene.grid.len(),
            scene.freeform.len(),
            scene.text.len()
        );
        RasterImage::from_pixmap(&pixmap)
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_grid_cell(
        &self,
        target: &mut Pixmap,
        cell: &GridCellLayer,
        scene_to_output: Transform,
        cache: &mut ImageCache,
    ) -> Result<(), RenderError> {
        let Some(photo) = &cell.photo else {
            return Ok(());
        };
        let content = photo.content;
        let area = cell.cell;
        let Some(clip) = clip_mask(
            target,
            tiny_skia::Rect::from_xywh(area.x, area.y, area.width, area.height),
            scene_to_output,
        ) else {
            return Ok(());
        };
        let has_area = content.width > 0.0 && content.height > 0.0;
        if !has_area {
            return Ok(());
        }

        let source = cache.load(&photo.image.uri)?;
        let transform = scene_to_output
            .pre_translate(content.x, content.y)
            .pre_scale(
                content.width / source.width() as f32,
                content.height / source.height() as f32,
            );
        target.draw_pixmap(0, 0, source.as_ref(), &self.paint(), transform, Some(&clip));
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_freeform(
        &self,
        target: &mut Pixmap,
        layer: &FreeformLayer,
        scene_to_output: Transform,
        cache: &mut ImageCache,
    ) -> Result<(), RenderError> {
        let frame = layer.frame;
        let center = frame.center();
        let degrees = if layer.rotation.is_finite() {
            layer.rotation.to_degrees()
        } else {
            0.0
        };
        // Frame-local space: origin at the frame center, unrotated.
        let placed = scene_to_output
            .pre_translate(center.x, center.y)
            .pre_concat(Transform::from_rotate(degrees));
        let Some(clip) = clip_mask(
            target,
            tiny_skia::Rect::from_xywh(
                -frame.width / 2.0,
                -frame.height / 2.0,
                frame.width,
                frame.height,
            ),
            placed,
        ) else {
            return Ok(());
        };

        let source = cache.load(&layer.image.uri)?;
        let (w, h) = (source.width() as f32, source.height() as f32);
        let fill = (frame.width / w).max(frame.height / h);
        let transform = placed.pre_scale(fill, fill).pre_translate(-w / 2.0, -h / 2.0);
        target.draw_pixmap(0, 0, source.as_ref(), &self.paint(), transform, Some(&clip));
        Ok(())
    }

    fn paint(&self) -> PixmapPaint {
        PixmapPaint {
            quality: self.filter,
            ..PixmapPaint::default()
        }
    }
}

#[async_trait]
impl SceneRenderer for CompositeRenderer {
    async fn capture(
        &self,
        scene: &SceneDescription,
        width: u32,
        height: u32,
    ) -> Result<RasterImage, RenderError> {
        let renderer = *self;
        let scene = scene.clone();
        tokio::task::spawn_blocking(move || renderer.render(&scene, width, height))
            .await
            .map_err(|e| RenderError::Raster(format!("render task failed: {e}")))?
    }
}

/// A mask covering `rect` under `transform`, sized to `target`. `None` when
/// the rectangle is empty.
fn clip_mask(
    target: &Pixmap,
    rect: Option<tiny_skia::Rect>,
    transform: Transform,
) -> Option<Mask> {
    let path = PathBuilder::from_rect(rect?);
    let mut mask = Mask::new(target.width(), target.height())?;
    mask.fill_path(&path, FillRule::Winding, true, transform);
    Some(mask)
}

/// Draw every text layer through one SVG document whose view box is the
/// scene, so font sizes and positions scale with the output.
fn draw_text(target: &mut Pixmap, scene: &SceneDescription) -> Result<(), RenderError> {
    let labels: Vec<&TextLayer> = scene
        .text
        .iter()
        .filter(|t| !t.content.trim().is_empty() && t.font_size.is_finite() && t.font_size > 0.0)
        .collect();
    if labels.is_empty() {
        return Ok(());
    }

    let svg = text_svg(scene, &labels, target.width(), target.height());
    let options = usvg::Options {
        fontdb: font_database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(&svg, &options)
        .map_err(|e| RenderError::Raster(format!("text layout failed: {e}")))?;
    resvg::render(&tree, Transform::default(), &mut target.as_mut());
    Ok(())
}

fn text_svg(scene: &SceneDescription, labels: &[&TextLayer], width: u32, height: u32) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {} {}\" preserveAspectRatio=\"none\">",
        scene.width.max(1),
        scene.height.max(1)
    );

    for label in labels {
        let color = parse_hex_color(&label.color).unwrap_or_else(|| {
            tracing::warn!("Unparseable text color {:?}, using black", label.color);
            FALLBACK_TEXT_COLOR
        });
        let [r, g, b, a] = color.0;
        let degrees = if label.rotation.is_finite() {
            label.rotation.to_degrees()
        } else {
            0.0
        };
        let (x, y) = (label.center.x, label.center.y);
        let _ = write!(
            svg,
            "<text x=\"{x}\" y=\"{y}\" font-size=\"{}\" font-family=\"{}, sans-serif\" \
             fill=\"rgb({r},{g},{b})\" fill-opacity=\"{}\" text-anchor=\"middle\" \
             dominant-baseline=\"central\" transform=\"rotate({degrees} {x} {y})\">{}</text>",
            label.font_size,
            escape_xml(&label.font_family),
            f32::from(a) / 255.0,
            escape_xml(&label.content),
        );
    }

    svg.push_str("</svg>");
    svg
}

/// System fonts plus the bundled fallback, loaded once per process.
fn font_database() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        db.load_font_data(BUNDLED_FONT.to_vec());
        db.set_sans_serif_family(BUNDLED_FONT_FAMILY);
        db.set_serif_family(BUNDLED_FONT_FAMILY);
        tracing::debug!("Font database ready with {} faces", db.len());
        Arc::new(db)
    }))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Decoded photos for one render, keyed by URI.
#[derive(Default)]
struct ImageCache {
    images: HashMap<String, Pixmap>,
}

impl ImageCache {
    fn load(&mut self, uri: &str) -> Result<&Pixmap, RenderError> {
        match self.images.entry(uri.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let failed = |reason: String| RenderError::ImageLoad {
                    uri: uri.to_string(),
                    reason,
                };
                let path = uri.strip_prefix("file://").unwrap_or(uri);
                let decoded = image::open(path).map_err(|e| failed(e.to_string()))?;
                let pixmap = premultiplied(&decoded.to_rgba8())
                    .ok_or_else(|| failed("image has no pixels".to_string()))?;
                Ok(entry.insert(pixmap))
            }
        }
    }
}

fn premultiplied(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
#[must_use]
pub fn parse_hex_color(hex: &str) -> Option<Rgba<u8>> {
    let trimmed = hex.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let byte = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    let nibble = |i: usize| {
        u8::from_str_radix(digits.get(i..=i)?, 16)
            .ok()
            .map(|v| v * 17)
    };

    match digits.len() {
        3 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 255])),
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}
