use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

fn png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    bytes
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| Rgba([(x * 2) as u8, (y * 2) as u8, 128, 255]))
}

fn write(root: &Path, path: &str, bytes: &[u8]) {
    let full_path = root.join(path);
    std::fs::create_dir_all(full_path.parent().unwrap()).unwrap();
    std::fs::write(full_path, bytes).unwrap();
}

mod compare_tests {
    use super::*;
    use snapdiff::{compare, DiffError};

    #[test]
    fn test_same_buffer_has_no_difference() {
        let bytes = png(&gradient(100, 100));
        let result = compare(&bytes, &bytes).unwrap();
        assert_eq!(result.pixel_count(), 0);
    }

    #[test]
    fn test_half_height_candidate() {
        let baseline = gradient(100, 100);
        let candidate = RgbaImage::from_fn(100, 50, |x, y| *baseline.get_pixel(x, y));

        let result = compare(&png(&baseline), &png(&candidate)).unwrap();

        assert_eq!((result.width(), result.height()), (100, 100));
        assert_eq!(result.pixel_count(), 100 * 50);

        let diff = image::load_from_memory(result.buffer()).unwrap().into_rgba8();
        assert_eq!(diff.dimensions(), (100, 100));
        assert_eq!(*diff.get_pixel(10, 75), Rgba([255, 0, 0, 255]));
        assert_ne!(*diff.get_pixel(10, 25), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_diff_of_diff_is_stable() {
        let baseline = gradient(60, 40);
        let mut candidate = baseline.clone();
        for x in 10..20 {
            candidate.put_pixel(x, 5, Rgba([0, 0, 0, 255]));
        }

        let first = compare(&png(&baseline), &png(&candidate)).unwrap();
        let second = compare(&png(&baseline), &png(&candidate)).unwrap();
        assert_eq!(first.pixel_count(), 10);

        let diff_of_diffs = compare(first.buffer(), second.buffer()).unwrap();
        assert_eq!(diff_of_diffs.pixel_count(), 0);
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let valid = png(&gradient(4, 4));
        let err = compare(&valid, b"\x89PNG truncated").unwrap_err();
        assert!(matches!(err, DiffError::Decode { .. }));
    }
}

mod review_tests {
    use super::*;
    use snapdiff::review::{review_snapshots, DirSink, DirSource, ReviewConfig, SnapshotStatus};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_review_writes_diff_tree() -> anyhow::Result<()> {
        let baseline_root = tempdir()?;
        let candidate_root = tempdir()?;
        let out = tempdir()?;

        let base = gradient(40, 40);
        let mut changed = base.clone();
        changed.put_pixel(1, 1, Rgba([255, 255, 255, 255]));

        write(baseline_root.path(), "snapshots/button/button-primary-snap.png", &png(&base));
        write(candidate_root.path(), "snapshots/button/button-primary-snap.png", &png(&changed));
        write(candidate_root.path(), "snapshots/card/card-default-snap.png", &png(&base));
        write(baseline_root.path(), "snapshots/menu/menu-open-snap.png", b"corrupt");
        // no baseline, so this is never decoded even though it is not a PNG
        write(candidate_root.path(), "snapshots/badge/badge-dot-snap.png", b"not png");
        write(candidate_root.path(), "snapshots/menu/menu-open-snap.png", &png(&base));

        let config = ReviewConfig {
            snapshots_dir: "snapshots/".to_string(),
            diff_dir: out.path().join("snapshot-diff"),
            branch_name: Some("feature/buttons".to_string()),
            pr_number: Some(42),
            origin_url: Some("https://github.com/acme/ui.git".to_string()),
            ..Default::default()
        };

        let source = Arc::new(DirSource::new(
            baseline_root.path(),
            candidate_root.path(),
            config.snapshots_dir.clone(),
        ));
        let mut sink = DirSink::new(
            config.clone(),
            &[baseline_root.path(), candidate_root.path()],
        )?;
        let summary = review_snapshots(source, &mut sink, &config).await?;

        assert_eq!(summary.len(), 4);
        let statuses: Vec<_> = summary.snapshots.iter().map(|r| (r.story_id.as_str(), &r.status)).collect();
        assert_eq!(statuses[0], ("badge", &SnapshotStatus::New));
        assert_eq!(statuses[1], ("button", &SnapshotStatus::Updated { pixel_count: 1 }));
        assert_eq!(statuses[2], ("card", &SnapshotStatus::New));
        assert!(matches!(statuses[3], ("menu", SnapshotStatus::Failed { .. })));
        assert!(summary.ensure_no_failures().is_err());

        let diff_dir = out.path().join("snapshot-diff");
        assert!(diff_dir.join("button/button-primary-diff.png").is_file());
        assert_eq!(
            std::fs::read(diff_dir.join("card/card-default-new.png"))?,
            png(&base)
        );
        assert_eq!(std::fs::read(diff_dir.join("badge/badge-dot-new.png"))?, b"not png".to_vec());
        assert!(!diff_dir.join("menu").exists());

        let index = std::fs::read_to_string(diff_dir.join("README.md"))?;
        assert!(index.starts_with(
            "# Image snapshot diff files for [feature/buttons](https://github.com/acme/ui/pull/42)"
        ));
        assert!(index.contains("## New snapshots\n- [badge](./badge)\n- [card](./card)"));
        assert!(index.contains("## Updated snapshots\n- [button](./button)"));
        assert!(index.contains("## Failed snapshots"));
        Ok(())
    }

    #[tokio::test]
    async fn test_review_with_no_changes() -> anyhow::Result<()> {
        let baseline_root = tempdir()?;
        let candidate_root = tempdir()?;
        let out = tempdir()?;

        let bytes = png(&gradient(8, 8));
        write(baseline_root.path(), "snapshots/a/a-snap.png", &bytes);
        write(candidate_root.path(), "snapshots/a/a-snap.png", &bytes);

        let config = ReviewConfig {
            snapshots_dir: "snapshots/".to_string(),
            diff_dir: out.path().join("diff"),
            ..Default::default()
        };
        let source = Arc::new(DirSource::new(baseline_root.path(), candidate_root.path(), "snapshots/"));
        let mut sink = DirSink::new(config.clone(), &[])?;

        let summary = review_snapshots(source, &mut sink, &config).await?;
        assert!(summary.is_empty());
        assert!(out.path().join("diff/README.md").is_file());
        Ok(())
    }
}
