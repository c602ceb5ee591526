//! End-to-end compose runs against files on disk.

use std::path::{Path, PathBuf};

use collage_cli::{compose, ComposeConfig, GridChoice};
use collage_core::{CanvasConfig, GridSpec, LayoutMode};
use image::{Rgba, RgbaImage};

fn fixture(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(40, 30, Rgba([200, 40, 40, 255]))
        .save(&path)
        .expect("write fixture");
    path
}

// ==========================================================================
// Grid
// ==========================================================================

#[tokio::test]
async fn test_compose_grid_writes_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("out");
    let config = ComposeConfig {
        canvas: CanvasConfig::new(300, 200),
        grid: GridChoice::Layout(GridSpec::new(1, 2)),
        photos: vec![fixture(dir.path(), "a.png"), fixture(dir.path(), "b.png")],
        texts: vec!["Hello".into()],
        out_dir: out.clone(),
        ..ComposeConfig::default()
    };

    let report = compose(config).await.expect("compose");
    assert_eq!((report.width, report.height), (300, 200));
    assert_eq!(report.layers, 3);
    assert!(Path::new(&report.saved.location).starts_with(&out));
    let written = image::open(&report.saved.location).expect("open export");
    assert_eq!((written.width(), written.height()), (300, 200));
}

#[tokio::test]
async fn test_unreadable_photos_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ComposeConfig {
        canvas: CanvasConfig::new(100, 100),
        photos: vec![dir.path().join("missing.png"), fixture(dir.path(), "a.png")],
        out_dir: dir.path().to_path_buf(),
        ..ComposeConfig::default()
    };

    let report = compose(config).await.expect("compose");
    assert_eq!(report.layers, 1);
}

// ==========================================================================
// Freeform
// ==========================================================================

#[tokio::test]
async fn test_compose_freeform() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ComposeConfig {
        canvas: CanvasConfig::new(500, 500),
        mode: LayoutMode::Freeform,
        photos: vec![fixture(dir.path(), "a.png")],
        background: Some("#000000".into()),
        out_dir: dir.path().to_path_buf(),
        ..ComposeConfig::default()
    };

    let report = compose(config).await.expect("compose");
    assert_eq!(report.layers, 1);
    let written = image::open(&report.saved.location)
        .expect("open export")
        .to_rgba8();
    assert_eq!(*written.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
}
