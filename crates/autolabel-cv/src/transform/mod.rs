//! Randomized image + box transforms
//!
//! A pipeline is an ordered list of [`PipelineStep`]s. Each step is either a
//! single [`TransformSpec`] firing with its own probability, or a
//! [`ChoiceGroup`] of mutually exclusive variants sharing one trigger
//! probability. Geometric operations move boxes; photometric operations only
//! touch pixels.

pub mod config;
pub mod geometric;
pub mod photometric;
pub mod pipeline;

pub use config::{BboxPolicy, PipelineConfig, VisibilityMetric};
pub use pipeline::TransformPipeline;

use crate::bbox::PixelRect;
use crate::error::TransformError;
use crate::sample::LabeledImage;
use autolabel_core::Label;
use image::RgbImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Whether an operation moves boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Geometric,
    Photometric,
}

/// One named randomized operation with its parameter limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOp {
    HorizontalFlip,
    VerticalFlip,
    /// Rotation about the image center by an angle drawn from
    /// `[-limit, limit]` degrees; uncovered pixels are black.
    Rotate { limit: f64 },
    /// Translation by up to `shift_limit` of each dimension, scaling by
    /// `1 ± scale_limit` and rotation within `±rotate_limit` degrees.
    ShiftScaleRotate {
        shift_limit: f64,
        scale_limit: f64,
        rotate_limit: f64,
    },
    /// Cut up to the given fraction of each edge away; the image shrinks.
    CropFromBorders {
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
    },
    BrightnessContrast {
        brightness_limit: f64,
        contrast_limit: f64,
    },
    /// Hue in degrees, saturation and value on the 0-255 scale.
    HueSaturationValue {
        hue_shift_limit: f64,
        sat_shift_limit: f64,
        val_shift_limit: f64,
    },
    /// Gaussian blur with an odd kernel size drawn from `3..=kernel_limit`.
    GaussianBlur { kernel_limit: u32 },
}

impl TransformOp {
    pub fn name(&self) -> &'static str {
        match self {
            TransformOp::HorizontalFlip => "horizontal_flip",
            TransformOp::VerticalFlip => "vertical_flip",
            TransformOp::Rotate { .. } => "rotate",
            TransformOp::ShiftScaleRotate { .. } => "shift_scale_rotate",
            TransformOp::CropFromBorders { .. } => "crop_from_borders",
            TransformOp::BrightnessContrast { .. } => "brightness_contrast",
            TransformOp::HueSaturationValue { .. } => "hue_saturation_value",
            TransformOp::GaussianBlur { .. } => "gaussian_blur",
        }
    }

    pub fn kind(&self) -> OpKind {
        match self {
            TransformOp::BrightnessContrast { .. }
            | TransformOp::HueSaturationValue { .. }
            | TransformOp::GaussianBlur { .. } => OpKind::Photometric,
            _ => OpKind::Geometric,
        }
    }

    /// Border crop keeping only the `edge` side in play.
    pub fn crop_edge(edge: Edge, fraction: f64) -> Self {
        let pick = |e: Edge| if e == edge { fraction } else { 0.0 };
        TransformOp::CropFromBorders {
            left: pick(Edge::Left),
            right: pick(Edge::Right),
            top: pick(Edge::Top),
            bottom: pick(Edge::Bottom),
        }
    }

    /// Draw this operation's parameters from `rng` and apply it.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        canvas: &mut Canvas,
        rng: &mut R,
    ) -> Result<(), TransformError> {
        match *self {
            TransformOp::HorizontalFlip => geometric::horizontal_flip(canvas),
            TransformOp::VerticalFlip => geometric::vertical_flip(canvas),
            TransformOp::Rotate { limit } => {
                let angle = symmetric(rng, limit);
                geometric::rotate(canvas, angle)?;
            }
            TransformOp::ShiftScaleRotate {
                shift_limit,
                scale_limit,
                rotate_limit,
            } => {
                let dx = symmetric(rng, shift_limit);
                let dy = symmetric(rng, shift_limit);
                let scale = 1.0 + symmetric(rng, scale_limit);
                let angle = symmetric(rng, rotate_limit);
                geometric::shift_scale_rotate(canvas, dx, dy, scale, angle)?;
            }
            TransformOp::CropFromBorders {
                left,
                right,
                top,
                bottom,
            } => {
                let (w, h) = canvas.image.dimensions();
                let borders = geometric::Borders {
                    left: up_to(rng, left, w),
                    right: up_to(rng, right, w),
                    top: up_to(rng, top, h),
                    bottom: up_to(rng, bottom, h),
                };
                geometric::crop_from_borders(canvas, borders)?;
            }
            TransformOp::BrightnessContrast {
                brightness_limit,
                contrast_limit,
            } => {
                let alpha = 1.0 + symmetric(rng, contrast_limit);
                let beta = symmetric(rng, brightness_limit);
                photometric::brightness_contrast(&mut canvas.image, alpha, beta);
            }
            TransformOp::HueSaturationValue {
                hue_shift_limit,
                sat_shift_limit,
                val_shift_limit,
            } => {
                let hue = symmetric(rng, hue_shift_limit);
                let sat = symmetric(rng, sat_shift_limit);
                let val = symmetric(rng, val_shift_limit);
                photometric::hue_saturation_value(&mut canvas.image, hue, sat, val);
            }
            TransformOp::GaussianBlur { kernel_limit } => {
                let largest = kernel_limit.max(3);
                let choices = (largest - 3) / 2 + 1;
                let kernel = 3 + 2 * rng.gen_range(0..choices);
                canvas.image = photometric::gaussian_blur(&canvas.image, kernel);
            }
        }
        Ok(())
    }
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, limit: f64) -> f64 {
    let limit = limit.abs();
    rng.gen_range(-limit..=limit)
}

/// Whole pixels, at most `fraction` of `extent`.
fn up_to<R: Rng + ?Sized>(rng: &mut R, fraction: f64, extent: u32) -> u32 {
    let max = (fraction.clamp(0.0, 1.0) * extent as f64).floor() as u32;
    rng.gen_range(0..=max)
}

/// Image edge targeted by a single-edge border crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// An operation with its own Bernoulli trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub op: TransformOp,
    pub probability: f64,
}

impl TransformSpec {
    pub fn new(op: TransformOp, probability: f64) -> Self {
        Self { op, probability }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceVariant {
    pub op: TransformOp,
    pub weight: f64,
}

/// Mutually exclusive variants: when the group fires, exactly one variant
/// is drawn by relative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceGroup {
    pub probability: f64,
    pub variants: Vec<ChoiceVariant>,
}

impl ChoiceGroup {
    /// Equally weighted variants
    pub fn uniform(probability: f64, ops: impl IntoIterator<Item = TransformOp>) -> Self {
        Self {
            probability,
            variants: ops
                .into_iter()
                .map(|op| ChoiceVariant { op, weight: 1.0 })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Single(TransformSpec),
    OneOf(ChoiceGroup),
}

/// A box followed through geometric transforms, in pixels of the current
/// image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedBox {
    pub class_id: u32,
    pub rect: PixelRect,
    /// Pixel area at the last visibility checkpoint.
    pub reference_area: f64,
}

/// Working state of one pipeline run.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub image: RgbImage,
    pub boxes: Vec<TrackedBox>,
}

impl Canvas {
    pub fn from_sample(sample: LabeledImage) -> Self {
        let (image, labels) = sample.into_parts();
        let (w, h) = image.dimensions();
        let boxes = labels
            .iter()
            .map(|label| {
                let rect = PixelRect::from_normalized(&label.bbox, w, h);
                TrackedBox {
                    class_id: label.class_id,
                    rect,
                    reference_area: rect.area(),
                }
            })
            .collect();

        Self { image, boxes }
    }

    pub fn into_sample(self) -> LabeledImage {
        let (w, h) = self.image.dimensions();
        let labels = self
            .boxes
            .iter()
            .map(|tracked| Label::new(tracked.class_id, tracked.rect.to_normalized(w, h)))
            .collect();

        LabeledImage::new(self.image, labels)
    }

    pub fn bounds(&self) -> PixelRect {
        let (w, h) = self.image.dimensions();
        PixelRect::image(w, h)
    }
}
