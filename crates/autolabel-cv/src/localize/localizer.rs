//! Single-object localization from edges and outer contours

use super::config::LocalizerConfig;
use autolabel_core::NormalizedBox;
use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::contours::{Contour, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use imageproc::point::Point;
use serde::Serialize;
use thiserror::Error;

/// Accepted localization with its diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: NormalizedBox,
    /// Selected contour area over image area
    pub area_ratio: f64,
    /// Number of outermost contours considered
    pub contour_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum NoDetection {
    #[error("no contour found")]
    NoContours,

    #[error("largest contour covers only {area_ratio:.4} of the image")]
    TooSmall { area_ratio: f64 },
}

/// Finds the dominant object of an image: smooth, detect edges, take the
/// outermost contour of largest area, and box it.
#[derive(Debug, Clone, Default)]
pub struct ContourLocalizer {
    config: LocalizerConfig,
}

impl ContourLocalizer {
    pub fn new(config: LocalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalizerConfig {
        &self.config
    }

    /// Binary edge map the contours are traced on.
    pub fn edge_map(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        let smoothed = if self.config.blur_sigma > 0.0 {
            gaussian_blur_f32(&gray, self.config.blur_sigma)
        } else {
            gray
        };

        let edges = canny(&smoothed, self.config.canny_low, self.config.canny_high);
        if self.config.edge_dilation > 0 {
            dilate(&edges, Norm::LInf, self.config.edge_dilation)
        } else {
            edges
        }
    }

    pub fn detect(&self, image: &DynamicImage) -> Result<Detection, NoDetection> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(NoDetection::NoContours);
        }

        self.detect_in_edges(&self.edge_map(image))
    }

    /// Contour selection on an edge map already produced by [`edge_map`](Self::edge_map).
    pub fn detect_in_edges(&self, edges: &GrayImage) -> Result<Detection, NoDetection> {
        let (width, height) = edges.dimensions();
        if width == 0 || height == 0 {
            return Err(NoDetection::NoContours);
        }

        let contours: Vec<Contour<i32>> = find_contours(edges);
        let outer: Vec<&Contour<i32>> = contours.iter().filter(|c| c.parent.is_none()).collect();

        // first contour wins among equal areas
        let mut best: Option<(&Contour<i32>, f64)> = None;
        for contour in &outer {
            let area = polygon_area(&contour.points);
            if best.is_none_or(|(_, best_area)| area > best_area) {
                best = Some((contour, area));
            }
        }

        let Some((largest, area)) = best else {
            return Err(NoDetection::NoContours);
        };

        let area_ratio = area / (width as f64 * height as f64);
        if area_ratio < self.config.min_area_ratio {
            return Err(NoDetection::TooSmall { area_ratio });
        }

        let (x, y, w, h) = bounding_rect(&largest.points).ok_or(NoDetection::NoContours)?;
        let (img_w, img_h) = (width as f64, height as f64);
        let bbox = NormalizedBox::new(
            (x + w / 2.0) / img_w,
            (y + h / 2.0) / img_h,
            w / img_w,
            h / img_h,
        );

        Ok(Detection {
            bbox,
            area_ratio,
            contour_count: outer.len(),
        })
    }

    /// `None` when no qualifying contour exists.
    pub fn locate(&self, image: &DynamicImage) -> Option<NormalizedBox> {
        self.detect(image).ok().map(|detection| detection.bbox)
    }
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    twice.abs() as f64 / 2.0
}

/// `(x, y, width, height)` of the pixels covered by `points`.
fn bounding_rect(points: &[Point<i32>]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;
    let (mut x_min, mut y_min, mut x_max, mut y_max) = (first.x, first.y, first.x, first.y);

    for p in points {
        x_min = x_min.min(p.x);
        y_min = y_min.min(p.y);
        x_max = x_max.max(p.x);
        y_max = y_max.max(p.y);
    }

    Some((
        x_min as f64,
        y_min as f64,
        (x_max - x_min + 1) as f64,
        (y_max - y_min + 1) as f64,
    ))
}
