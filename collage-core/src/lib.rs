//! # Collage Core
//!
//! The platform-independent half of a photo collage editor: the canvas
//! model, gesture handling and layout rules. No rendering, no I/O.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                collage-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Canvas          │  Gestures                │
//! │  - Grid slots    │  - Touch / recognized    │
//! │  - Freeform      │  - Drag, pinch, rotate   │
//! │  - Text, select  │  - Drop-to-swap          │
//! ├─────────────────────────────────────────────┤
//! │  Layout          │  Geometry                │
//! │  - Grid specs    │  - Fit / fill            │
//! │  - Mode convert  │  - Viewport mapping      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use collage_core::{Canvas, ImageRef, LayoutMode};
//!
//! let mut canvas = Canvas::default();
//! canvas.add_photo(ImageRef::new("beach.jpg", 4032, 3024));
//! canvas.set_layout_mode(LayoutMode::Freeform);
//! assert_eq!(canvas.freeform_items().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas;
pub mod config;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod gesture;
pub mod layout;
pub mod swap;
pub mod viewport;

pub use canvas::{Canvas, GridTap, LayoutMode, Placement, Selection};
pub use config::{
    CanvasConfig, CanvasPreset, GridSpec, CANVAS_PRESETS, GRID_LAYOUTS, MAX_GRID_DIMENSION,
    MAX_SLOT_COUNT,
};
pub use element::{GridSlot, ImageRef, ItemId, PhotoItem, TextItem};
pub use error::{CanvasError, CanvasResult};
pub use event::{Gesture, GestureEvent, InputEvent, TouchEvent, TouchPhase, TouchPoint};
pub use geometry::{Point, Rect, Size};
pub use gesture::{GestureController, GestureOutcome, GesturePhase, GestureTarget, TransformValues};
pub use layout::ConversionReport;
pub use swap::{resolve_drop_target, SwapOutcome};
pub use viewport::Viewport;

/// Collage core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
