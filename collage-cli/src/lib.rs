//! # Collage CLI
//!
//! Command-line host for the collage engine: lists the canvas presets and
//! grid layouts, and composes a collage from image files on disk.
//!
//! ## Usage
//!
//! ```bash
//! collage presets
//! collage layouts
//! collage compose --preset x-post --layout 1x3 \
//!     --photo a.jpg --photo b.jpg --photo c.jpg --text "Summer" --out-dir out
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ComposeConfig` - Resolved settings for one compose run
//! - [`compose`] - Builds the canvas, adds photos and text, and exports it

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use clap::{Args, Parser, Subcommand, ValueEnum};
use collage_core::{
    Canvas, CanvasConfig, CanvasError, CanvasPreset, GridSpec, LayoutMode, Point, CANVAS_PRESETS,
    GRID_LAYOUTS, MAX_SLOT_COUNT,
};
use collage_export::{
    add_picked_photo, CompositeRenderer, ExportCoordinator, ExportError, ExportReport,
    FileImageSource, FilePersistence, SharedCanvas,
};
use thiserror::Error;

/// Vertical distance between stacked text labels, normalized to the canvas.
const TEXT_LINE_STEP: f32 = 0.08;

/// Command-line arguments for collage.
#[derive(Debug, Clone, Parser)]
#[command(name = "collage")]
#[command(about = "Compose grid and freeform photo collages")]
#[command(version)]
pub struct CliArgs {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List canvas size presets
    Presets,
    /// List the built-in grid layouts
    Layouts,
    /// Compose a collage and export it as PNG
    Compose(ComposeArgs),
}

/// Layout mode as given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Photos fill grid cells
    #[default]
    Grid,
    /// Photos float over the canvas
    Freeform,
}

impl From<ModeArg> for LayoutMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Grid => Self::Grid,
            ModeArg::Freeform => Self::Freeform,
        }
    }
}

/// Arguments for `compose`.
#[derive(Debug, Clone, Args)]
pub struct ComposeArgs {
    /// Canvas preset slug (see `collage presets`)
    #[arg(long, env = "COLLAGE_PRESET", default_value = "instagram-post", value_parser = parse_preset)]
    pub preset: CanvasConfig,

    /// Canvas width in pixels, overriding the preset
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels, overriding the preset
    #[arg(long)]
    pub height: Option<u32>,

    /// Number of grid slots, arranged automatically
    #[arg(long, conflicts_with = "layout", value_parser = parse_slot_count)]
    pub slots: Option<usize>,

    /// Explicit grid layout as ROWSxCOLS, e.g. 2x3
    #[arg(long)]
    pub layout: Option<GridSpec>,

    /// Layout mode
    #[arg(long, value_enum, default_value_t = ModeArg::Grid)]
    pub mode: ModeArg,

    /// Photo file to add; repeat for more photos
    #[arg(long = "photo", value_name = "FILE")]
    pub photos: Vec<PathBuf>,

    /// Text label to add; repeat for more labels
    #[arg(long = "text", value_name = "TEXT")]
    pub texts: Vec<String>,

    /// Background color as hex, e.g. #FFFFFF
    #[arg(long)]
    pub background: Option<String>,

    /// Directory for exported images
    #[arg(long, env = "COLLAGE_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,
}

/// How the grid should be partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridChoice {
    /// Keep the canvas default.
    Default,
    /// Arrange this many slots automatically.
    Slots(usize),
    /// Use this exact layout.
    Layout(GridSpec),
}

/// Resolved settings for one compose run.
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// Canvas size.
    pub canvas: CanvasConfig,
    /// Grid partition.
    pub grid: GridChoice,
    /// Layout mode photos are added in.
    pub mode: LayoutMode,
    /// Photo files, in order.
    pub photos: Vec<PathBuf>,
    /// Text labels, in order.
    pub texts: Vec<String>,
    /// Background color.
    pub background: Option<String>,
    /// Export directory.
    pub out_dir: PathBuf,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            grid: GridChoice::Default,
            mode: LayoutMode::Grid,
            photos: Vec::new(),
            texts: Vec::new(),
            background: None,
            out_dir: PathBuf::from("."),
        }
    }
}

impl From<ComposeArgs> for ComposeConfig {
    fn from(args: ComposeArgs) -> Self {
        let canvas = CanvasConfig::new(
            args.width.unwrap_or(args.preset.width),
            args.height.unwrap_or(args.preset.height),
        );
        let grid = match (args.layout, args.slots) {
            (Some(layout), _) => GridChoice::Layout(layout),
            (None, Some(slots)) => GridChoice::Slots(slots),
            (None, None) => GridChoice::Default,
        };
        Self {
            canvas,
            grid,
            mode: args.mode.into(),
            photos: args.photos,
            texts: args.texts,
            background: args.background,
            out_dir: args.out_dir,
        }
    }
}

/// Errors from a compose run.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Editing the canvas failed.
    #[error("Canvas error: {0}")]
    Canvas(#[from] CanvasError),

    /// Exporting the canvas failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Parse a preset slug into its canvas size.
///
/// # Errors
///
/// Returns a message listing the known slugs if `slug` is unknown.
pub fn parse_preset(slug: &str) -> Result<CanvasConfig, String> {
    CanvasPreset::find(slug).map(CanvasPreset::config).ok_or_else(|| {
        let known: Vec<&str> = CANVAS_PRESETS.iter().map(|p| p.slug).collect();
        format!("unknown preset '{slug}' (expected one of: {})", known.join(", "))
    })
}

/// Parse a slot count in `1..=`[`MAX_SLOT_COUNT`].
///
/// # Errors
///
/// Returns a message if `value` is not a number or is out of range.
pub fn parse_slot_count(value: &str) -> Result<usize, String> {
    let count: usize = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid slot count '{value}': {e}"))?;
    if (1..=MAX_SLOT_COUNT).contains(&count) {
        Ok(count)
    } else {
        Err(format!("slot count {count} outside 1..={MAX_SLOT_COUNT}"))
    }
}

/// The preset catalog as printable lines.
#[must_use]
pub fn preset_listing() -> String {
    let mut out = String::new();
    for preset in CANVAS_PRESETS {
        let _ = writeln!(
            out,
            "{:<18} {:<20} {}x{}",
            preset.slug, preset.name, preset.width, preset.height
        );
    }
    out
}

/// The grid layout catalog as printable lines.
#[must_use]
pub fn layout_listing() -> String {
    let mut out = String::new();
    for layout in GRID_LAYOUTS {
        let _ = writeln!(out, "{layout} ({} slots)", layout.capacity());
    }
    out
}

/// Create the canvas described by `config`, without photos or text.
#[must_use]
pub fn prepare_canvas(config: &ComposeConfig) -> Canvas {
    let mut canvas = Canvas::new(config.canvas);
    match config.grid {
        GridChoice::Default => {}
        GridChoice::Slots(count) => {
            canvas.set_grid_slot_count(count);
        }
        GridChoice::Layout(layout) => {
            canvas.apply_grid_layout(layout);
        }
    }
    if let Some(color) = &config.background {
        canvas.set_background_color(color.as_str());
    }
    canvas.set_layout_mode(config.mode);
    canvas
}

/// Add one text label per entry, stacked downwards from the canvas center.
///
/// # Errors
///
/// Returns an error if a freshly added label cannot be edited.
pub fn add_labels(canvas: &mut Canvas, texts: &[String]) -> Result<(), CanvasError> {
    let mut y: f32 = 0.5;
    for text in texts {
        let id = canvas.add_text_overlay();
        canvas.set_text_content(id, text.as_str())?;
        canvas.set_text_transform(id, Point::new(0.5, y.min(1.0)), 1.0, 0.0)?;
        y += TEXT_LINE_STEP;
    }
    Ok(())
}

/// Build the collage described by `config` and export it.
///
/// Photos that cannot be read are skipped with a warning. Grid photos that
/// do not fit in the grid overflow to the freeform layer.
///
/// # Errors
///
/// Returns an error if a label cannot be added or the export fails.
pub async fn compose(config: ComposeConfig) -> Result<ExportReport, ComposeError> {
    let canvas: SharedCanvas = Arc::new(RwLock::new(prepare_canvas(&config)));
    tracing::info!(
        "Composing {} collage in {:?} mode",
        config.canvas,
        config.mode
    );

    let requested = config.photos.len();
    let source = FileImageSource::new(config.photos);
    let mut added = 0;
    for _ in 0..requested {
        if add_picked_photo(&source, &canvas).await.is_some() {
            added += 1;
        }
    }
    if added < requested {
        tracing::warn!("Skipped {} unreadable photos", requested - added);
    }

    add_labels(
        &mut canvas.write().unwrap_or_else(PoisonError::into_inner),
        &config.texts,
    )?;

    let coordinator = ExportCoordinator::new(
        CompositeRenderer::new(),
        FilePersistence::new(config.out_dir),
    );
    Ok(coordinator.export(&canvas).await?)
}
