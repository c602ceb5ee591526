//! # Collage Export
//!
//! Turns a collage canvas into a saved raster image.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌───────────────┐   ┌─────────────┐
//! │  Canvas  │──▶│ SceneDescription │──▶│ SceneRenderer │──▶│ Persistence │
//! └──────────┘   └──────────────────┘   └───────────────┘   └─────────────┘
//!       ▲                                                          │
//!       └────────── ExportCoordinator restores selection ◀────────┘
//! ```
//!
//! The renderer, persistence target and photo picker are traits so a host
//! app can supply platform implementations. [`CompositeRenderer`],
//! [`FilePersistence`] and [`FileImageSource`] work from the filesystem.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod coordinator;
pub mod error;
pub mod persistence;
pub mod renderer;
pub mod scene;
pub mod source;

pub use coordinator::{ExportCoordinator, ExportReport, SharedCanvas};
pub use error::{ExportError, ExportResult, RenderError, SaveError};
pub use persistence::{FilePersistence, Persistence, SavedImage};
pub use renderer::{parse_hex_color, CompositeRenderer, RasterImage, SceneRenderer};
pub use scene::{FreeformLayer, GridCellLayer, GridPhotoLayer, SceneDescription, TextLayer};
pub use source::{add_picked_photo, FileImageSource, ImageSource};

/// Collage export version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
