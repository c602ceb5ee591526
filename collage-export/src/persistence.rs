//! Where exported collages end up.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SaveError;
use crate::renderer::RasterImage;

/// A successfully saved export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedImage {
    /// Where the image was written (a path, an asset ID, ...).
    pub location: String,
    /// Encoded size in bytes.
    pub bytes: usize,
}

/// Stores a rendered collage.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Save `image`.
    async fn save(&self, image: &RasterImage) -> Result<SavedImage, SaveError>;
}

/// Writes PNG files into a directory, creating it on first save.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    /// Save into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&self) -> PathBuf {
        self.dir.join(format!("collage-{}.png", Uuid::new_v4()))
    }
}

#[async_trait]
impl Persistence for FilePersistence {
    async fn save(&self, image: &RasterImage) -> Result<SavedImage, SaveError> {
        let png = image
            .encode_png()
            .map_err(|e| SaveError::Failed(format!("PNG encoding failed: {e}")))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.next_path();
        tokio::fs::write(&path, &png).await?;

        tracing::info!("Saved {} bytes to {}", png.len(), path.display());
        Ok(SavedImage {
            location: path.to_string_lossy().into_owned(),
            bytes: png.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[tokio::test]
    async fn writes_png_into_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("exports");
        let persistence = FilePersistence::new(&out);
        let image = RasterImage::new(RgbaImage::from_pixel(3, 2, Rgba([9, 9, 9, 255])));

        let saved = persistence.save(&image).await.expect("save");
        assert!(saved.location.ends_with(".png"));
        let written = std::fs::read(&saved.location).expect("read back");
        assert_eq!(written.len(), saved.bytes);
        let decoded = image::load_from_memory(&written).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[tokio::test]
    async fn file_in_the_way_is_a_save_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, b"not a directory").expect("write blocker");
        let persistence = FilePersistence::new(blocker.join("inner"));
        let image = RasterImage::new(RgbaImage::new(1, 1));

        let err = persistence.save(&image).await.expect_err("cannot create dir");
        assert!(matches!(err, SaveError::Failed(_)));
    }
}
