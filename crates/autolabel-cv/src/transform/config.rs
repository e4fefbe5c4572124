//! Pipeline configuration

use super::{Canvas, ChoiceGroup, Edge, PipelineStep, TrackedBox, TransformOp, TransformSpec};
use serde::{Deserialize, Serialize};

/// Slack when deciding whether an unclipped box still lies in the image.
const BOUNDS_TOLERANCE: f64 = 1e-6;

/// Denominator of the visibility fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityMetric {
    /// Clipped area over the box area before the transforms ran.
    PreTransform,
    /// Clipped area over the transformed, unclipped area.
    Transformed,
}

/// How boxes are handled once geometric transforms moved them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BboxPolicy {
    /// Boxes keeping less than this fraction of their area are dropped.
    pub min_visibility: f64,
    /// Clamp boxes into the image; otherwise any box leaving it is dropped.
    pub clip: bool,
    /// Filter after every geometric step instead of once at the end.
    pub check_each_transform: bool,
    pub visibility: VisibilityMetric,
}

impl Default for BboxPolicy {
    fn default() -> Self {
        Self {
            min_visibility: 0.7,
            clip: true,
            check_each_transform: false,
            visibility: VisibilityMetric::PreTransform,
        }
    }
}

impl BboxPolicy {
    /// Fraction of `tracked` still visible once clipped to `clipped_area`.
    pub fn visibility(&self, tracked: &TrackedBox, clipped_area: f64) -> f64 {
        let denominator = match self.visibility {
            VisibilityMetric::PreTransform => tracked.reference_area,
            VisibilityMetric::Transformed => tracked.rect.area(),
        };

        if denominator <= 0.0 {
            return 0.0;
        }
        clipped_area / denominator
    }

    /// Clip or reject boxes against the image, drop boxes below the
    /// visibility threshold, and start a new checkpoint for the survivors.
    pub fn filter(&self, canvas: &mut Canvas) {
        let bounds = canvas.bounds();

        canvas.boxes.retain_mut(|tracked| {
            if !self.clip && !tracked.rect.is_within(&bounds, BOUNDS_TOLERANCE) {
                return false;
            }

            let Some(clipped) = tracked.rect.intersection(&bounds) else {
                return false;
            };

            if self.visibility(tracked, clipped.area()) < self.min_visibility {
                return false;
            }

            tracked.rect = clipped;
            tracked.reference_area = clipped.area();
            true
        });
    }
}

/// Declarative pipeline: ordered steps plus the box policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub steps: Vec<PipelineStep>,
    pub bbox_policy: BboxPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::document_capture()
    }
}

impl PipelineConfig {
    /// Flips, mild rotation and shift/scale, a single-edge "fold" crop that
    /// simulates partial capture, then colour and blur jitter.
    pub fn document_capture() -> Self {
        let fold = 0.3;
        let steps = vec![
            PipelineStep::OneOf(ChoiceGroup::uniform(
                0.3,
                [TransformOp::HorizontalFlip, TransformOp::VerticalFlip],
            )),
            PipelineStep::Single(TransformSpec::new(TransformOp::Rotate { limit: 15.0 }, 0.5)),
            PipelineStep::Single(TransformSpec::new(
                TransformOp::ShiftScaleRotate {
                    shift_limit: 0.05,
                    scale_limit: 0.15,
                    rotate_limit: 10.0,
                },
                0.5,
            )),
            PipelineStep::OneOf(ChoiceGroup::uniform(
                0.3,
                [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom]
                    .map(|edge| TransformOp::crop_edge(edge, fold)),
            )),
            PipelineStep::Single(TransformSpec::new(
                TransformOp::BrightnessContrast {
                    brightness_limit: 0.2,
                    contrast_limit: 0.2,
                },
                0.4,
            )),
            PipelineStep::Single(TransformSpec::new(
                TransformOp::HueSaturationValue {
                    hue_shift_limit: 20.0,
                    sat_shift_limit: 30.0,
                    val_shift_limit: 20.0,
                },
                0.3,
            )),
            PipelineStep::Single(TransformSpec::new(
                TransformOp::GaussianBlur { kernel_limit: 3 },
                0.2,
            )),
        ];

        Self {
            steps,
            bbox_policy: BboxPolicy::default(),
        }
    }

    /// No steps: boxes only go through the policy.
    pub fn identity() -> Self {
        Self {
            steps: Vec::new(),
            bbox_policy: BboxPolicy::default(),
        }
    }
}
