//! Batch labeling of an image directory

use super::localizer::{ContourLocalizer, NoDetection};
use crate::Result;
use crate::utils::ImageUtils;
use anyhow::Context;
use autolabel_core::{Label, label_path_for, write_labels};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a labeling pass, one entry per image.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LabelingReport {
    /// Label files written
    pub labeled: Vec<PathBuf>,
    /// Images with no qualifying object
    pub unlabeled: Vec<PathBuf>,
    /// Images that could not be decoded
    pub unreadable: Vec<PathBuf>,
    /// Images whose edge map or label file could not be written
    pub failed: Vec<PathBuf>,
}

impl LabelingReport {
    pub fn total(&self) -> usize {
        self.labeled.len() + self.unlabeled.len() + self.unreadable.len() + self.failed.len()
    }
}

/// Localize the dominant object of every supported image in `image_dir`
/// and write a one-line label file per detection into `label_dir`.
pub fn label_directory(
    localizer: &ContourLocalizer,
    image_dir: &Path,
    label_dir: &Path,
    class_id: u32,
    edges_dir: Option<&Path>,
) -> Result<LabelingReport> {
    let images = ImageUtils::list_images(image_dir)?;

    fs::create_dir_all(label_dir)
        .with_context(|| format!("Failed to create label directory: {}", label_dir.display()))?;
    if let Some(dir) = edges_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create edges directory: {}", dir.display()))?;
    }

    let mut report = LabelingReport::default();

    for image_path in images {
        let image = match ImageUtils::load(&image_path) {
            Ok(image) => image,
            Err(err) => {
                warn!("Skipping unreadable image {}: {}", image_path.display(), err);
                report.unreadable.push(image_path);
                continue;
            }
        };

        let stem = ImageUtils::stem(&image_path);
        let edges = localizer.edge_map(&image);

        if let Some(dir) = edges_dir {
            let edges_path = dir.join(format!("{stem}_edges.png"));
            if let Err(err) = ImageUtils::save_gray(&edges, &edges_path) {
                warn!("Failed to save edge map {}: {}", edges_path.display(), err);
                report.failed.push(image_path);
                continue;
            }
        }

        match localizer.detect_in_edges(&edges) {
            Ok(detection) => {
                let Some(label_path) = label_path_for(&image_path, label_dir) else {
                    warn!("No file stem in {}", image_path.display());
                    report.failed.push(image_path);
                    continue;
                };
                if let Err(err) = write_labels(&label_path, &[Label::new(class_id, detection.bbox)]) {
                    warn!("{}: {}", err, error_source(&err));
                    report.failed.push(image_path);
                    continue;
                }
                info!(
                    "Labeled {} (area ratio {:.3}, {} contours)",
                    image_path.display(),
                    detection.area_ratio,
                    detection.contour_count
                );
                report.labeled.push(label_path);
            }
            Err(NoDetection::NoContours) => {
                info!("No object found in {}", image_path.display());
                report.unlabeled.push(image_path);
            }
            Err(err @ NoDetection::TooSmall { .. }) => {
                info!("No object found in {}: {}", image_path.display(), err);
                report.unlabeled.push(image_path);
            }
        }
    }

    info!(
        "Labeled {} of {} images ({} unreadable, {} failed)",
        report.labeled.len(),
        report.total(),
        report.unreadable.len(),
        report.failed.len()
    );

    Ok(report)
}

fn error_source(err: &dyn std::error::Error) -> String {
    err.source().map(|cause| cause.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use autolabel_core::read_labels;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_scene(path: &Path, with_object: bool) {
        let mut image = RgbImage::from_pixel(200, 160, Rgb([20, 20, 20]));
        if with_object {
            for y in 40..120 {
                for x in 50..150 {
                    image.put_pixel(x, y, Rgb([230, 230, 230]));
                }
            }
        }
        image.save(path).unwrap();
    }

    #[test]
    fn test_label_directory_writes_one_line_per_detection() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");
        let edges = dir.path().join("edges");
        fs::create_dir_all(&images).unwrap();

        write_scene(&images.join("object.png"), true);
        write_scene(&images.join("blank.png"), false);
        fs::write(images.join("broken.jpg"), b"not an image").unwrap();
        fs::write(images.join("notes.txt"), b"ignored").unwrap();

        let report = label_directory(
            &ContourLocalizer::default(),
            &images,
            &labels,
            1,
            Some(&edges),
        )
        .unwrap();

        assert_eq!(report.labeled, vec![labels.join("object.txt")]);
        assert_eq!(report.unlabeled, vec![images.join("blank.png")]);
        assert_eq!(report.unreadable, vec![images.join("broken.jpg")]);
        assert_eq!(report.total(), 3);

        let written = read_labels(labels.join("object.txt")).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].class_id, 1);
        assert!((written[0].bbox.center_x - 0.5).abs() < 0.02);
        assert!((written[0].bbox.center_y - 0.5).abs() < 0.02);

        assert!(!labels.join("blank.txt").exists());
        assert!(edges.join("object_edges.png").exists());
        assert!(edges.join("blank_edges.png").exists());
    }

    #[test]
    fn test_write_failures_do_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let images = dir.path().join("images");
        let labels = dir.path().join("labels");
        let edges = dir.path().join("edges");
        fs::create_dir_all(&images).unwrap();

        write_scene(&images.join("a.png"), true);
        write_scene(&images.join("b.png"), true);
        write_scene(&images.join("c.png"), true);
        // directories squatting on the output paths make those writes fail
        fs::create_dir_all(labels.join("a.txt")).unwrap();
        fs::create_dir_all(edges.join("b_edges.png")).unwrap();

        let report = label_directory(
            &ContourLocalizer::default(),
            &images,
            &labels,
            1,
            Some(&edges),
        )
        .unwrap();

        assert_eq!(report.failed, vec![images.join("a.png"), images.join("b.png")]);
        assert_eq!(report.labeled, vec![labels.join("c.txt")]);
        assert_eq!(report.total(), 3);
        assert!(!labels.join("b.txt").exists());
        assert_eq!(read_labels(labels.join("c.txt")).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_image_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = label_directory(
            &ContourLocalizer::default(),
            &dir.path().join("absent"),
            &dir.path().join("labels"),
            0,
            None,
        );
        assert!(result.is_err());
    }
}
