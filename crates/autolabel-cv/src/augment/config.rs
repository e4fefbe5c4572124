//! Run configuration for the augmentation driver

use crate::transform::PipelineConfig;
use autolabel_core::BoxValidator;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Number of accepted samples to produce
    pub target_count: usize,
    /// Hard ceiling on attempts; derived from `attempts_per_sample` when unset
    pub max_attempts: Option<usize>,
    pub attempts_per_sample: usize,
    /// Width and height must exceed this to keep a box
    pub min_extent: f64,
    pub seed: Option<u64>,
    /// Extension, and therefore encoding, of generated images
    pub output_extension: String,
    pub pipeline: PipelineConfig,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            target_count: 100,
            max_attempts: None,
            attempts_per_sample: 50,
            min_extent: 1e-4,
            seed: None,
            output_extension: "jpg".to_string(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AugmentConfig {
    pub fn attempt_budget(&self) -> usize {
        self.max_attempts
            .unwrap_or_else(|| self.target_count.saturating_mul(self.attempts_per_sample))
    }

    pub fn validator(&self) -> BoxValidator {
        BoxValidator::new(self.min_extent)
    }
}

/// Source and destination directories of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusPaths {
    pub image_dir: PathBuf,
    pub label_dir: PathBuf,
    pub output_image_dir: PathBuf,
    pub output_label_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_budget() {
        let config = AugmentConfig {
            target_count: 10,
            attempts_per_sample: 20,
            ..Default::default()
        };
        assert_eq!(config.attempt_budget(), 200);

        let bounded = AugmentConfig {
            max_attempts: Some(7),
            ..config
        };
        assert_eq!(bounded.attempt_budget(), 7);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AugmentConfig =
            serde_json::from_str(r#"{ "target_count": 12, "seed": 9 }"#).unwrap();

        assert_eq!(config.target_count, 12);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.attempts_per_sample, 50);
        assert_eq!(config.output_extension, "jpg");
        assert_eq!(config.pipeline.steps.len(), 7);
    }
}
