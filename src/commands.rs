//! Subcommand implementations

use crate::cli::{AugmentArgs, LabelArgs};
use crate::config::{DEFAULT_CLASS_ID, FileConfig};
use anyhow::{Context, Result, bail};
use autolabel_cv::localize::label_directory;
use autolabel_cv::traits::Augment;
use autolabel_cv::{
    AugmentConfig, AugmentationDriver, ContourLocalizer, Corpus, CorpusPaths, DriverError,
    RunReport, TransformPipeline,
};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::{Path, PathBuf};

pub fn augment(args: AugmentArgs, file: FileConfig) -> Result<()> {
    let FileConfig {
        paths: file_paths,
        augment: mut config,
        ..
    } = file;

    let paths = CorpusPaths {
        image_dir: resolve(args.images, file_paths.image_dir, "--images")?,
        label_dir: resolve(args.labels, file_paths.label_dir, "--labels")?,
        output_image_dir: resolve(args.out_images, file_paths.output_image_dir, "--out-images")?,
        output_label_dir: resolve(args.out_labels, file_paths.output_label_dir, "--out-labels")?,
    };

    if let Some(count) = args.count {
        config.target_count = count;
    }
    if let Some(min_visibility) = args.min_visibility {
        config.pipeline.bbox_policy.min_visibility = min_visibility;
    }
    if let Some(min_extent) = args.min_extent {
        config.min_extent = min_extent;
    }
    if args.max_attempts.is_some() {
        config.max_attempts = args.max_attempts;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let pipeline =
        TransformPipeline::new(&config.pipeline).context("Invalid pipeline configuration")?;
    let corpus = Corpus::scan(&paths.image_dir, &paths.label_dir)?;

    info!(
        "Generating {} samples from {} source images ({} pipeline steps)",
        config.target_count,
        corpus.len(),
        pipeline.len()
    );

    let driver = AugmentationDriver::new(&config, &pipeline, &paths);
    let report = run_driver(&driver, &corpus, &config, args.parallel)?;

    println!(
        "Generated {}/{} samples in {} attempts ({} abandoned)",
        report.accepted,
        report.requested,
        report.attempts,
        report.abandoned.total()
    );

    if let Some(path) = args.report {
        write_report(&path, &report)?;
    }

    Ok(())
}

fn run_driver<A: Augment + Sync>(
    driver: &AugmentationDriver<'_, A>,
    corpus: &Corpus,
    config: &AugmentConfig,
    parallel: bool,
) -> std::result::Result<RunReport, DriverError> {
    #[cfg(feature = "parallel")]
    if parallel {
        let seed = config.seed.unwrap_or_else(rand::random);
        return driver.run_parallel(corpus, seed);
    }

    #[cfg(not(feature = "parallel"))]
    if parallel {
        log::warn!("Built without the `parallel` feature; running sequentially");
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    driver.run(corpus, &mut rng)
}

fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

pub fn label(args: LabelArgs, file: FileConfig) -> Result<()> {
    let mut localizer_config = file.localizer;
    if let Some(ratio) = args.min_area_ratio {
        localizer_config.min_area_ratio = ratio;
    }

    let image_dir = resolve(args.images, file.paths.image_dir, "--images")?;
    let label_dir = resolve(args.labels, file.paths.label_dir, "--labels")?;
    let class_id = args.class_id.or(file.class_id).unwrap_or(DEFAULT_CLASS_ID);
    let edges_dir = args.edges_dir.or(file.edges_dir);

    let localizer = ContourLocalizer::new(localizer_config);
    let report = label_directory(
        &localizer,
        &image_dir,
        &label_dir,
        class_id,
        edges_dir.as_deref(),
    )?;

    println!(
        "Labeled {} images ({} without an object, {} unreadable, {} failed)",
        report.labeled.len(),
        report.unlabeled.len(),
        report.unreadable.len(),
        report.failed.len()
    );

    Ok(())
}

/// Flag value, else the config file value, else an error naming the flag.
fn resolve(flag: Option<PathBuf>, configured: PathBuf, name: &str) -> Result<PathBuf> {
    match flag {
        Some(path) => Ok(path),
        None if !configured.as_os_str().is_empty() => Ok(configured),
        None => bail!("{name} is required (or set it in the config file)"),
    }
}
