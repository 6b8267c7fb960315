//! End-to-end runs over temp trees: real decoding/encoding, scaled-down thresholds, and a
//! recording tiler standing in for the pyramid writer.

use anyhow::{Result, bail};
use image::{Rgb, RgbImage};
use slidemill::engine::{manifest_path, read_manifest};
use slidemill::imaging::{RustBackend, TilingEngine, dzi_path_for, tile_dir_for};
use slidemill::utils::Thresholds;
use slidemill::{Opts, RunSummary, TilerKind, process_dir, process_dir_with};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Writes the same layout as a real tiler: `<base>_files/0/0_0.jpeg` plus `<base>.dzi`.
#[derive(Default)]
struct RecordingTiler {
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl TilingEngine for RecordingTiler {
    fn generate(&self, src: &Path, output_base: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((src.to_path_buf(), output_base.to_path_buf()));
        let level = tile_dir_for(output_base).join("0");
        fs::create_dir_all(&level)?;
        fs::write(level.join("0_0.jpeg"), b"tile")?;
        fs::write(dzi_path_for(output_base), b"<Image/>")?;
        Ok(())
    }
}

/// Writes the tile directory but leaves no `.dzi` behind, so descriptor removal fails.
struct NoDescriptorTiler;

impl TilingEngine for NoDescriptorTiler {
    fn generate(&self, _src: &Path, output_base: &Path) -> Result<()> {
        fs::create_dir_all(tile_dir_for(output_base).join("0"))?;
        Ok(())
    }
}

struct FailingTiler;

impl TilingEngine for FailingTiler {
    fn generate(&self, src: &Path, _output_base: &Path) -> Result<()> {
        bail!("tiler unavailable for {}", src.display())
    }
}

/// Thresholds divided by ten: thumbnail 40, slide 200, tiles above 410.
fn scaled_opts() -> Opts {
    Opts {
        num_threads: Some(4),
        thresholds: Thresholds {
            thumbnail_height: 40,
            slide_height: 200,
            tile_min_dimension: 410,
            max_width: Thresholds::MAX_WIDTH,
        },
        ..Opts::default()
    }
}

/// Temp dir with a canonical `gallery` root inside.
fn gallery() -> (TempDir, PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("gallery");
    fs::create_dir(&root).unwrap();
    let root = root.canonicalize().unwrap();
    (tmp, root)
}

fn write_image(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save(path).unwrap();
}

fn run(root: &Path, opts: &Opts, tiler: Arc<dyn TilingEngine>) -> Result<RunSummary> {
    process_dir_with(root, opts, Arc::new(RustBackend::new()), tiler)
}

fn dims(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

#[test]
fn test_large_source_gets_every_asset() {
    let (_tmp, root) = gallery();
    write_image(&root.join("big.png"), 600, 400);
    let tiler = Arc::new(RecordingTiler::default());

    let summary = run(&root, &scaled_opts(), tiler.clone()).unwrap();
    assert_eq!(summary.processed, 1);
    assert!(summary.is_clean());

    assert_eq!(dims(&root.join("big.jpg")), (600, 400));
    assert_eq!(dims(&root.join("big-thumbnail.jpg")), (60, 40));
    assert_eq!(dims(&root.join("big-display.jpg")), (300, 200));
    assert!(root.join("big_files").is_dir());
    assert!(!root.join("big.dzi").exists());
    assert!(root.join("big.png").exists());

    let calls = tiler.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![(root.join("big.png"), root.join("big"))]);

    let manifest = read_manifest(&root).unwrap();
    let rec = &manifest["big"];
    assert_eq!(rec.full_path, root.join("big.jpg"));
    assert_eq!(rec.thumb_path, root.join("big-thumbnail.jpg"));
    assert_eq!(rec.display_path, Some(root.join("big-display.jpg")));
    assert_eq!((rec.width, rec.height), (300, 200));
    assert_eq!(rec.tiles, Some(root.join("big_files")));
    assert_eq!((rec.max_width, rec.max_height), (Some(600), Some(400)));
}

#[test]
fn test_small_jpeg_only_gets_thumbnail() {
    let (_tmp, root) = gallery();
    write_image(&root.join("small.jpg"), 30, 20);
    let before = fs::read(root.join("small.jpg")).unwrap();
    let tiler = Arc::new(RecordingTiler::default());

    run(&root, &scaled_opts(), tiler.clone()).unwrap();

    assert_eq!(fs::read(root.join("small.jpg")).unwrap(), before);
    assert_eq!(dims(&root.join("small-thumbnail.jpg")), (30, 20));
    assert!(!root.join("small-display.jpg").exists());
    assert!(tiler.calls.lock().unwrap().is_empty());

    let manifest = read_manifest(&root).unwrap();
    let rec = &manifest["small"];
    assert_eq!(rec.full_path, root.join("small.jpg"));
    assert_eq!((rec.width, rec.height), (30, 20));
    assert_eq!(rec.display_path, None);
    assert_eq!(rec.tiles, None);

    let text = fs::read_to_string(manifest_path(&root)).unwrap();
    for key in ["display_path", "tiles", "max_width", "max_height"] {
        assert!(!text.contains(key), "{key} should be omitted");
    }
}

#[test]
fn test_medium_source_gets_slide_but_no_tiles() {
    let (_tmp, root) = gallery();
    write_image(&root.join("mid.jpeg"), 300, 250);
    let tiler = Arc::new(RecordingTiler::default());

    run(&root, &scaled_opts(), tiler.clone()).unwrap();

    let rec = &read_manifest(&root).unwrap()["mid"];
    assert_eq!(rec.full_path, root.join("mid.jpeg"));
    assert_eq!(rec.display_path, Some(root.join("mid-display.jpg")));
    assert_eq!((rec.width, rec.height), (240, 200));
    assert_eq!(rec.tiles, None);
    assert!(tiler.calls.lock().unwrap().is_empty());
}

#[test]
fn test_every_accepted_directory_gets_its_own_manifest() {
    let (_tmp, root) = gallery();
    write_image(&root.join("a.png"), 30, 20);
    fs::create_dir_all(root.join("trip/day1")).unwrap();
    write_image(&root.join("trip/day1/b.png"), 30, 20);
    fs::create_dir(root.join("empty")).unwrap();
    fs::create_dir(root.join("old_files")).unwrap();
    write_image(&root.join("old_files/c.png"), 30, 20);
    fs::write(root.join("index.html"), "<html></html>").unwrap();

    let summary = run(&root, &scaled_opts(), Arc::new(RecordingTiler::default())).unwrap();
    assert_eq!(summary.processed, 2);

    let top = read_manifest(&root).unwrap();
    assert_eq!(top.keys().collect::<Vec<_>>(), vec!["a"]);
    let day1 = read_manifest(&root.join("trip/day1")).unwrap();
    assert_eq!(day1.keys().collect::<Vec<_>>(), vec!["b"]);
    assert!(read_manifest(&root.join("trip")).unwrap().is_empty());
    assert_eq!(
        fs::read_to_string(manifest_path(&root.join("empty"))).unwrap(),
        "{}"
    );

    assert!(!manifest_path(&root.join("old_files")).exists());
    assert!(!root.join("old_files/c-thumbnail.jpg").exists());

    let mut written = summary.manifests_written.clone();
    written.sort();
    assert_eq!(
        written,
        vec![
            root.clone(),
            root.join("empty"),
            root.join("trip"),
            root.join("trip/day1"),
        ]
    );
}

#[test]
fn test_second_run_produces_identical_manifest() {
    let (_tmp, root) = gallery();
    write_image(&root.join("big.png"), 600, 400);
    write_image(&root.join("small.jpg"), 30, 20);
    let opts = scaled_opts();

    let first_tiler = Arc::new(RecordingTiler::default());
    let first_summary = run(&root, &opts, first_tiler.clone()).unwrap();
    let first = fs::read_to_string(manifest_path(&root)).unwrap();
    assert_eq!(first_summary.processed, 2);
    assert_eq!(first_tiler.calls.lock().unwrap().len(), 1);

    // big.jpg now sits next to big.png; only one of them is processed.
    let second_tiler = Arc::new(RecordingTiler::default());
    let second_summary = run(&root, &opts, second_tiler.clone()).unwrap();
    let second = fs::read_to_string(manifest_path(&root)).unwrap();
    assert_eq!(second_summary.processed, 2);
    assert!(second_summary.is_clean());
    assert_eq!(
        second_tiler.calls.lock().unwrap().clone(),
        vec![(root.join("big.jpg"), root.join("big"))]
    );

    assert_eq!(first, second);
    assert!(!root.join("big-thumbnail-thumbnail.jpg").exists());
    assert!(!root.join("small-thumbnail-thumbnail.jpg").exists());
    assert!(!root.join("big_files/0/0_0-thumbnail.jpg").exists());
}

#[test]
fn test_manifest_independent_of_worker_count() {
    let mut rendered = Vec::new();
    for threads in [1, 8] {
        let (_tmp, root) = gallery();
        for i in 0..6 {
            write_image(&root.join(format!("img{i}.png")), 30 + i, 20);
        }
        write_image(&root.join("dup.jpeg"), 30, 20);
        write_image(&root.join("dup.png"), 31, 21);
        let opts = Opts {
            num_threads: Some(threads),
            queue_cap: 2,
            ..scaled_opts()
        };
        run(&root, &opts, Arc::new(RecordingTiler::default())).unwrap();
        let text = fs::read_to_string(manifest_path(&root)).unwrap();
        rendered.push(text.replace(root.to_str().unwrap(), "<root>"));
    }
    assert_eq!(rendered[0], rendered[1]);
    assert!(rendered[0].contains("\"<root>/dup.jpeg\""));
}

#[test]
fn test_user_jpeg_not_overwritten_by_same_name_source() {
    let (_tmp, root) = gallery();
    write_image(&root.join("a.jpg"), 30, 20);
    write_image(&root.join("a.png"), 50, 10);
    let before = fs::read(root.join("a.jpg")).unwrap();

    let summary = run(&root, &scaled_opts(), Arc::new(RecordingTiler::default())).unwrap();
    assert_eq!(summary.processed, 1);
    assert!(summary.is_clean());

    assert_eq!(fs::read(root.join("a.jpg")).unwrap(), before);
    let rec = &read_manifest(&root).unwrap()["a"];
    assert_eq!(rec.full_path, root.join("a.jpg"));
    assert_eq!((rec.width, rec.height), (30, 20));
    assert_eq!(dims(&root.join("a-thumbnail.jpg")), (30, 20));
}

#[test]
fn test_root_name_matching_ignore_rule_is_still_walked() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("html");
    fs::create_dir(&root).unwrap();
    let root = root.canonicalize().unwrap();
    write_image(&root.join("a.png"), 30, 20);
    fs::create_dir(root.join("thumbnails")).unwrap();
    write_image(&root.join("thumbnails/b.png"), 30, 20);

    let summary = run(&root, &scaled_opts(), Arc::new(RecordingTiler::default())).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.manifests_written, vec![root.clone()]);
    assert!(read_manifest(&root).unwrap().contains_key("a"));
    assert!(!root.join("thumbnails/b-thumbnail.jpg").exists());
}

#[test]
fn test_missing_descriptor_does_not_fail_item() {
    let (_tmp, root) = gallery();
    write_image(&root.join("big.png"), 600, 400);

    let summary = run(&root, &scaled_opts(), Arc::new(NoDescriptorTiler)).unwrap();
    assert_eq!(summary.processed, 1);
    assert!(summary.is_clean());

    let rec = &read_manifest(&root).unwrap()["big"];
    assert_eq!(rec.tiles, Some(root.join("big_files")));
    assert_eq!((rec.max_width, rec.max_height), (Some(600), Some(400)));
}

#[test]
fn test_unreadable_image_is_isolated() {
    let (_tmp, root) = gallery();
    write_image(&root.join("good.png"), 30, 20);
    fs::write(root.join("notes.txt"), "not an image").unwrap();

    let summary = run(&root, &scaled_opts(), Arc::new(RecordingTiler::default())).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed_items.len(), 1);
    assert_eq!(summary.failed_items[0].0, root.join("notes.txt"));

    let manifest = read_manifest(&root).unwrap();
    assert!(manifest.contains_key("good"));
    assert!(!manifest.contains_key("notes"));
}

#[test]
fn test_tiler_failure_fails_only_that_item() {
    let (_tmp, root) = gallery();
    write_image(&root.join("big.png"), 600, 400);
    write_image(&root.join("small.png"), 30, 20);

    let summary = run(&root, &scaled_opts(), Arc::new(FailingTiler)).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed_items.len(), 1);
    assert!(summary.failed_items[0].1.contains("tiler unavailable"));

    // Thumbnail and slide ran to completion before the failure was reported.
    assert!(root.join("big-thumbnail.jpg").exists());
    assert!(root.join("big-display.jpg").exists());

    let manifest = read_manifest(&root).unwrap();
    assert!(manifest.contains_key("small"));
    assert!(!manifest.contains_key("big"));
}

#[test]
fn test_fail_fast_turns_item_failure_fatal() {
    let (_tmp, root) = gallery();
    fs::write(root.join("broken.png"), "not an image").unwrap();
    let opts = Opts {
        fail_fast: true,
        ..scaled_opts()
    };

    let err = run(&root, &opts, Arc::new(RecordingTiler::default())).unwrap_err();
    assert!(format!("{err:#}").contains("broken.png"));
}

#[test]
fn test_root_must_be_a_directory() {
    let (_tmp, root) = gallery();
    let file = root.join("a.png");
    write_image(&file, 10, 10);
    assert!(run(&root.join("missing"), &scaled_opts(), Arc::new(FailingTiler)).is_err());
    assert!(run(&file, &scaled_opts(), Arc::new(FailingTiler)).is_err());
}

#[test]
fn test_default_engines_write_real_pyramid() {
    let (_tmp, root) = gallery();
    write_image(&root.join("big.png"), 600, 400);
    let opts = Opts {
        tiler: TilerKind::Native,
        ..scaled_opts()
    };

    process_dir(&root, &opts).unwrap();

    assert!(root.join("big_files/10/0_0.jpeg").exists());
    assert!(root.join("big_files/0/0_0.jpeg").exists());
    assert!(!root.join("big.dzi").exists());
    let rec = &read_manifest(&root).unwrap()["big"];
    assert_eq!(rec.tiles, Some(root.join("big_files")));
}
