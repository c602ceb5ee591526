//! Photo pickers.
//!
//! A pick that is cancelled or fails yields `None`; neither is an error.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use collage_core::{ImageRef, Placement};

use crate::coordinator::SharedCanvas;

/// Supplies photos to add to the canvas.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Ask for one photo. `None` means the user cancelled or the pick
    /// failed.
    async fn pick_image(&self) -> Option<ImageRef>;
}

/// Picks files from a queue of paths, one per call, reading each file's
/// pixel dimensions.
#[derive(Debug, Default)]
pub struct FileImageSource {
    queue: Mutex<VecDeque<PathBuf>>,
}

impl FileImageSource {
    /// Queue `paths` in order.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            queue: Mutex::new(paths.into_iter().map(Into::into).collect()),
        }
    }

    /// Paths not yet picked.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Describe the image at `path`, or `None` if it cannot be read.
    #[must_use]
    pub fn describe(path: &Path) -> Option<ImageRef> {
        match image::image_dimensions(path) {
            Ok((width, height)) => Some(ImageRef::new(
                path.to_string_lossy().into_owned(),
                width,
                height,
            )),
            Err(e) => {
                tracing::warn!("Cannot read image {}: {e}", path.display());
                None
            }
        }
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn pick_image(&self) -> Option<ImageRef> {
        let path = self
            .queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()?;
        match tokio::task::spawn_blocking(move || Self::describe(&path)).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Image dimension task failed: {e}");
                None
            }
        }
    }
}

/// Pick one photo and add it to the canvas according to its layout mode.
/// Returns `None` without touching the canvas when nothing was picked.
pub async fn add_picked_photo<S>(source: &S, canvas: &SharedCanvas) -> Option<Placement>
where
    S: ImageSource + ?Sized,
{
    let image = source.pick_image().await?;
    let placement = canvas
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .add_photo(image);
    tracing::debug!("Added photo at {placement:?}");
    Some(placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use collage_core::Canvas;
    use image::{Rgba, RgbaImage};
    use std::sync::{Arc, RwLock};

    #[tokio::test]
    async fn picks_in_order_and_skips_unreadable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.png");
        RgbaImage::from_pixel(30, 10, Rgba([0, 0, 0, 255]))
            .save(&good)
            .expect("fixture");
        let source = FileImageSource::new([dir.path().join("missing.png"), good.clone()]);

        assert_eq!(source.pick_image().await, None);
        let picked = source.pick_image().await.expect("picked");
        assert_eq!((picked.pixel_width, picked.pixel_height), (30, 10));
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.pick_image().await, None);
    }

    #[tokio::test]
    async fn cancelled_pick_leaves_canvas_alone() {
        let canvas = Arc::new(RwLock::new(Canvas::default()));
        let source = FileImageSource::default();
        assert!(add_picked_photo(&source, &canvas).await.is_none());
        let guard = canvas.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        assert_eq!(guard.revision(), 0);
    }
}
