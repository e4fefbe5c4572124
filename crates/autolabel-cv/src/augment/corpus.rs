use crate::Result;
use crate::utils::ImageUtils;
use autolabel_core::label_path_for;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// One source image and the label file it is paired with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub image_path: PathBuf,
    /// Expected location; the file itself may be missing
    pub label_path: PathBuf,
    pub stem: String,
}

/// Read-only list of source images for a run.
#[derive(Debug, Clone)]
pub struct Corpus {
    image_dir: PathBuf,
    sources: Vec<SourceImage>,
}

impl Corpus {
    /// Pair every supported image in `image_dir` with `<label_dir>/<stem>.txt`.
    pub fn scan(image_dir: &Path, label_dir: &Path) -> Result<Self> {
        let mut sources = Vec::new();

        for image_path in ImageUtils::list_images(image_dir)? {
            let Some(label_path) = label_path_for(&image_path, label_dir) else {
                warn!("Skipping image without a file stem: {}", image_path.display());
                continue;
            };

            sources.push(SourceImage {
                stem: ImageUtils::stem(&image_path),
                image_path,
                label_path,
            });
        }

        info!("Found {} source images in {}", sources.len(), image_dir.display());

        Ok(Self {
            image_dir: image_dir.to_path_buf(),
            sources,
        })
    }

    pub fn from_sources(image_dir: impl Into<PathBuf>, sources: Vec<SourceImage>) -> Self {
        Self {
            image_dir: image_dir.into(),
            sources,
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn sources(&self) -> &[SourceImage] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
