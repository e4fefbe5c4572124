//! Ordered composition of randomized transforms

use super::config::{BboxPolicy, PipelineConfig};
use super::{Canvas, OpKind, PipelineStep, TransformOp};
use crate::error::TransformError;
use crate::sample::LabeledImage;
use crate::traits::Augment;
use log::trace;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

#[derive(Debug, Clone)]
enum CompiledStep {
    Single {
        op: TransformOp,
        probability: f64,
    },
    OneOf {
        probability: f64,
        ops: Vec<TransformOp>,
        index: WeightedIndex<f64>,
    },
}

impl CompiledStep {
    /// Operation firing this run, if any.
    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&TransformOp> {
        match self {
            CompiledStep::Single { op, probability } => rng.gen_bool(*probability).then_some(op),
            CompiledStep::OneOf {
                probability,
                ops,
                index,
            } => {
                if !rng.gen_bool(*probability) {
                    return None;
                }
                ops.get(index.sample(rng))
            }
        }
    }
}

/// Validated, immutable transform pipeline.
///
/// Every geometric step precedes every photometric step. Boxes are clipped
/// and filtered by the [`BboxPolicy`] after the composition (or after each
/// geometric step when the policy asks for it); box/label pairs may be
/// dropped but are never added.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    steps: Vec<CompiledStep>,
    policy: BboxPolicy,
}

impl TransformPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self, TransformError> {
        check_probability(config.bbox_policy.min_visibility)?;

        let mut steps = Vec::with_capacity(config.steps.len());
        let mut seen_photometric = false;

        for step in &config.steps {
            let compiled = compile(step)?;
            let (kind, name) = match &compiled {
                CompiledStep::Single { op, .. } => (op.kind(), op.name()),
                CompiledStep::OneOf { ops, .. } => (ops[0].kind(), ops[0].name()),
            };

            match kind {
                OpKind::Photometric => seen_photometric = true,
                OpKind::Geometric if seen_photometric => {
                    return Err(TransformError::OutOfOrder(name));
                }
                OpKind::Geometric => {}
            }
            steps.push(compiled);
        }

        Ok(Self {
            steps,
            policy: config.bbox_policy.clone(),
        })
    }

    pub fn policy(&self) -> &BboxPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply<R: Rng + ?Sized>(
        &self,
        sample: LabeledImage,
        rng: &mut R,
    ) -> Result<LabeledImage, TransformError> {
        let mut canvas = Canvas::from_sample(sample);

        for step in &self.steps {
            let Some(op) = step.pick(rng) else {
                continue;
            };
            trace!("applying {}", op.name());
            op.apply(&mut canvas, rng)?;

            if self.policy.check_each_transform && op.kind() == OpKind::Geometric {
                self.policy.filter(&mut canvas);
            }
        }

        self.policy.filter(&mut canvas);
        Ok(canvas.into_sample())
    }
}

impl Augment for TransformPipeline {
    fn augment<R: Rng + ?Sized>(
        &self,
        sample: LabeledImage,
        rng: &mut R,
    ) -> Result<LabeledImage, TransformError> {
        self.apply(sample, rng)
    }
}

fn check_probability(p: f64) -> Result<(), TransformError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(TransformError::InvalidProbability(p))
    }
}

fn check_op(op: &TransformOp) -> Result<(), TransformError> {
    let limits: &[f64] = match op {
        TransformOp::Rotate { limit } => &[*limit],
        TransformOp::ShiftScaleRotate {
            shift_limit,
            scale_limit,
            rotate_limit,
        } => &[*shift_limit, *scale_limit, *rotate_limit],
        TransformOp::CropFromBorders {
            left,
            right,
            top,
            bottom,
        } => &[*left, *right, *top, *bottom],
        TransformOp::BrightnessContrast {
            brightness_limit,
            contrast_limit,
        } => &[*brightness_limit, *contrast_limit],
        TransformOp::HueSaturationValue {
            hue_shift_limit,
            sat_shift_limit,
            val_shift_limit,
        } => &[*hue_shift_limit, *sat_shift_limit, *val_shift_limit],
        _ => &[],
    };

    match limits.iter().find(|value| !value.is_finite()) {
        Some(_) => Err(TransformError::InvalidParameter(op.name())),
        None => Ok(()),
    }
}

fn compile(step: &PipelineStep) -> Result<CompiledStep, TransformError> {
    match step {
        PipelineStep::Single(spec) => {
            check_probability(spec.probability)?;
            check_op(&spec.op)?;
            Ok(CompiledStep::Single {
                op: spec.op.clone(),
                probability: spec.probability,
            })
        }
        PipelineStep::OneOf(group) => {
            check_probability(group.probability)?;

            let variants: Vec<_> = group
                .variants
                .iter()
                .filter(|variant| variant.weight > 0.0)
                .collect();
            let Some(first) = variants.first() else {
                return Err(TransformError::EmptyChoice);
            };
            if variants.iter().any(|v| v.op.kind() != first.op.kind()) {
                return Err(TransformError::MixedChoice);
            }
            for variant in &variants {
                check_op(&variant.op)?;
            }

            let index = WeightedIndex::new(variants.iter().map(|v| v.weight))
                .map_err(|_| TransformError::EmptyChoice)?;

            Ok(CompiledStep::OneOf {
                probability: group.probability,
                ops: variants.iter().map(|v| v.op.clone()).collect(),
                index,
            })
        }
    }
}
