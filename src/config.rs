//! Optional JSON configuration file

use anyhow::{Context, Result};
use autolabel_cv::{AugmentConfig, CorpusPaths, LocalizerConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Class id the labeler writes unless told otherwise.
pub const DEFAULT_CLASS_ID: u32 = 1;

/// Any subset of the run configuration; missing sections keep defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub paths: CorpusPaths,
    pub augment: AugmentConfig,
    pub localizer: LocalizerConfig,
    pub class_id: Option<u32>,
    pub edges_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_gives_defaults() {
        let config = FileConfig::load(None).unwrap();
        assert_eq!(config.augment.target_count, 100);
        assert_eq!(config.localizer.min_area_ratio, 0.05);
        assert!(config.class_id.is_none());
    }

    #[test]
    fn test_partial_file() {
        let config = FileConfig::parse(
            r#"{
                "paths": { "image_dir": "data/images", "label_dir": "data/labels" },
                "augment": { "target_count": 40, "pipeline": { "bbox_policy": { "min_visibility": 0.5 } } },
                "localizer": { "canny_high": 120.0 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.paths.image_dir, PathBuf::from("data/images"));
        assert_eq!(config.augment.target_count, 40);
        assert_eq!(config.augment.pipeline.bbox_policy.min_visibility, 0.5);
        assert!(config.augment.pipeline.bbox_policy.clip);
        assert_eq!(config.augment.pipeline.steps.len(), 7);
        assert_eq!(config.localizer.canny_high, 120.0);
        assert_eq!(config.localizer.canny_low, 50.0);
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        assert!(FileConfig::load(Some(Path::new("/nonexistent/run.json"))).is_err());
        assert!(FileConfig::parse("{ not json").is_err());
    }
}
