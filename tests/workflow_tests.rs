// tests/workflow_tests.rs
use autolabel_core::{BoxValidator, read_labels};
use autolabel_cv::localize::label_directory;
use autolabel_cv::{
    AugmentConfig, AugmentationDriver, ContourLocalizer, Corpus, CorpusPaths, PipelineConfig,
    TransformPipeline,
};
use image::{Rgb, RgbImage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Dark page with one bright rectangle at `(x, y, w, h)`.
fn write_scene(path: &Path, rect: (u32, u32, u32, u32)) {
    let (x0, y0, w, h) = rect;
    let mut image = RgbImage::from_pixel(240, 180, Rgb([25, 25, 30]));
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            image.put_pixel(x, y, Rgb([235, 230, 220]));
        }
    }
    image.save(path).unwrap();
}

fn seed_corpus(root: &Path) -> CorpusPaths {
    let paths = CorpusPaths {
        image_dir: root.join("raw"),
        label_dir: root.join("labels"),
        output_image_dir: root.join("aug/images"),
        output_label_dir: root.join("aug/labels"),
    };
    fs::create_dir_all(&paths.image_dir).unwrap();

    write_scene(&paths.image_dir.join("page_a.png"), (40, 30, 160, 120));
    write_scene(&paths.image_dir.join("page_b.png"), (20, 50, 120, 100));
    write_scene(&paths.image_dir.join("page_c.png"), (90, 20, 130, 140));
    paths
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[test]
fn test_label_then_augment() {
    let dir = TempDir::new().unwrap();
    let paths = seed_corpus(dir.path());

    let report = label_directory(
        &ContourLocalizer::default(),
        &paths.image_dir,
        &paths.label_dir,
        1,
        None,
    )
    .unwrap();
    assert_eq!(report.labeled.len(), 3);

    let a = read_labels(paths.label_dir.join("page_a.txt")).unwrap();
    assert_eq!(a.len(), 1);
    assert!((a[0].bbox.center_x - 0.5).abs() < 0.02);
    assert!((a[0].bbox.width - 160.0 / 240.0).abs() < 0.02);

    let config = AugmentConfig {
        target_count: 15,
        seed: Some(2024),
        output_extension: "png".to_string(),
        ..Default::default()
    };
    let pipeline = TransformPipeline::new(&config.pipeline).unwrap();
    let corpus = Corpus::scan(&paths.image_dir, &paths.label_dir).unwrap();
    let driver = AugmentationDriver::new(&config, &pipeline, &paths);
    let run = driver
        .run(&corpus, &mut StdRng::seed_from_u64(2024))
        .unwrap();

    assert_eq!(run.accepted, 15);
    assert_eq!(count_files(&paths.output_image_dir), 15);
    assert_eq!(count_files(&paths.output_label_dir), 15);

    let validator = BoxValidator::new(config.min_extent);
    for pair in &run.outputs {
        let labels = read_labels(&pair.label).unwrap();
        assert!(!labels.is_empty());
        assert!(labels.iter().all(|l| l.class_id == 1));
        assert!(labels.iter().all(|l| validator.is_valid(&l.bbox)));
    }
}

#[test]
fn test_identity_pipeline_preserves_labels() {
    let dir = TempDir::new().unwrap();
    let paths = seed_corpus(dir.path());
    label_directory(
        &ContourLocalizer::default(),
        &paths.image_dir,
        &paths.label_dir,
        4,
        None,
    )
    .unwrap();

    let config = AugmentConfig {
        target_count: 4,
        output_extension: "png".to_string(),
        pipeline: PipelineConfig::identity(),
        ..Default::default()
    };
    let pipeline = TransformPipeline::new(&config.pipeline).unwrap();
    let corpus = Corpus::scan(&paths.image_dir, &paths.label_dir).unwrap();
    let run = AugmentationDriver::new(&config, &pipeline, &paths)
        .run(&corpus, &mut StdRng::seed_from_u64(9))
        .unwrap();

    for pair in &run.outputs {
        let stem = pair.source.file_stem().unwrap().to_string_lossy().into_owned();
        let source = read_labels(paths.label_dir.join(format!("{stem}.txt"))).unwrap();
        let output = read_labels(&pair.label).unwrap();

        assert_eq!(source.len(), output.len());
        for (s, o) in source.iter().zip(&output) {
            assert_eq!(s.class_id, o.class_id);
            assert!((s.bbox.center_x - o.bbox.center_x).abs() < 1e-5);
            assert!((s.bbox.center_y - o.bbox.center_y).abs() < 1e-5);
            assert!((s.bbox.width - o.bbox.width).abs() < 1e-5);
            assert!((s.bbox.height - o.bbox.height).abs() < 1e-5);
        }
    }
}

#[test]
fn test_cli_label_and_augment() {
    let dir = TempDir::new().unwrap();
    let paths = seed_corpus(dir.path());
    let report_path = dir.path().join("report.json");
    let bin = env!("CARGO_BIN_EXE_autolabel");

    let status = Command::new(bin)
        .arg("label")
        .arg("--images")
        .arg(&paths.image_dir)
        .arg("--labels")
        .arg(&paths.label_dir)
        .arg("--class-id")
        .arg("2")
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(count_files(&paths.label_dir), 3);

    let status = Command::new(bin)
        .arg("augment")
        .arg("--images")
        .arg(&paths.image_dir)
        .arg("--labels")
        .arg(&paths.label_dir)
        .arg("--out-images")
        .arg(&paths.output_image_dir)
        .arg("--out-labels")
        .arg(&paths.output_label_dir)
        .args(["--count", "6", "--seed", "17"])
        .arg("--report")
        .arg(&report_path)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(count_files(&paths.output_image_dir), 6);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["requested"], 6);
    assert_eq!(report["accepted"], 6);
    assert_eq!(report["outputs"].as_array().unwrap().len(), 6);
}

#[test]
fn test_cli_fails_on_empty_corpus() {
    let dir = TempDir::new().unwrap();
    let images = dir.path().join("images");
    fs::create_dir_all(&images).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_autolabel"))
        .arg("augment")
        .arg("--images")
        .arg(&images)
        .arg("--labels")
        .arg(dir.path().join("labels"))
        .arg("--out-images")
        .arg(dir.path().join("out_images"))
        .arg("--out-labels")
        .arg(dir.path().join("out_labels"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no source images"));
}
