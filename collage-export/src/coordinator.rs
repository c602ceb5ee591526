//! Export orchestration.
//!
//! An export clears the selection so no highlight reaches the output, gives
//! the renderer a frame, captures the canvas at its configured pixel size,
//! hands the image to persistence, and restores the selection whatever the
//! outcome. Only one export runs at a time; editing may continue while one
//! is in flight because the renderer works from a snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use collage_core::{Canvas, Selection};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};
use crate::persistence::{Persistence, SavedImage};
use crate::renderer::SceneRenderer;
use crate::scene::SceneDescription;

/// The canvas as shared between the editing surface and the exporter.
pub type SharedCanvas = Arc<RwLock<Canvas>>;

/// A finished export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    /// Where the image was saved.
    pub saved: SavedImage,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Photo and text layers in the scene.
    pub layers: usize,
}

/// Drives one renderer and one persistence target.
pub struct ExportCoordinator<R, P> {
    renderer: R,
    persistence: P,
    in_flight: AtomicBool,
}

impl<R, P> ExportCoordinator<R, P>
where
    R: SceneRenderer,
    P: Persistence,
{
    /// Create a coordinator.
    #[must_use]
    pub fn new(renderer: R, persistence: P) -> Self {
        Self {
            renderer,
            persistence,
            in_flight: AtomicBool::new(false),
        }
    }

    /// The renderer.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The persistence target.
    #[must_use]
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Whether an export is running.
    #[must_use]
    pub fn is_exporting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Export the canvas.
    ///
    /// The selection in place when the export started is restored
    /// afterwards, on success and failure alike, unless its target was
    /// removed in the meantime. Dropping the future before it completes
    /// restores it too.
    ///
    /// # Errors
    ///
    /// - [`ExportError::ExportInProgress`] if another export is running
    /// - [`ExportError::RenderFailure`] if the capture fails
    /// - [`ExportError::PermissionDenied`] or [`ExportError::SaveFailure`]
    ///   if saving fails
    pub async fn export(&self, canvas: &SharedCanvas) -> ExportResult<ExportReport> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::warn!("Export requested while another is running");
            return Err(ExportError::ExportInProgress);
        };

        let _selection = SelectionGuard::clear(canvas);
        let result = self.render_and_save(canvas).await;

        match &result {
            Ok(report) => tracing::info!(
                "Exported {}x{} collage to {}",
                report.width,
                report.height,
                report.saved.location
            ),
            Err(e) => tracing::warn!("Export failed: {e}"),
        }
        result
    }

    async fn render_and_save(&self, canvas: &SharedCanvas) -> ExportResult<ExportReport> {
        self.renderer.yield_frame().await;

        let scene = {
            let canvas = canvas.read().unwrap_or_else(PoisonError::into_inner);
            SceneDescription::from_canvas(&canvas)
        };
        let (width, height) = (scene.width, scene.height);
        tracing::debug!("Capturing {width}x{height} with {} layers", scene.layer_count());

        let image = self.renderer.capture(&scene, width, height).await?;
        let saved = self.persistence.save(&image).await?;

        Ok(ExportReport {
            saved,
            width: image.width(),
            height: image.height(),
            layers: scene.layer_count(),
        })
    }
}

/// Holds the in-flight flag for the lifetime of one export.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Clears the selection for one export and restores it on drop.
struct SelectionGuard<'a> {
    canvas: &'a SharedCanvas,
    previous: Selection,
}

impl<'a> SelectionGuard<'a> {
    fn clear(canvas: &'a SharedCanvas) -> Self {
        let mut guarded = canvas.write().unwrap_or_else(PoisonError::into_inner);
        let previous = guarded.selection();
        guarded.clear_selection();
        Self { canvas, previous }
    }
}

impl Drop for SelectionGuard<'_> {
    fn drop(&mut self) {
        let restored = self
            .canvas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .restore_selection(self.previous);
        if restored != self.previous {
            tracing::debug!("Selection {:?} went stale during export", self.previous);
        }
    }
}
