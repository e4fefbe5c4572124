//! Image file helpers shared by the labeler and the augmentation driver

use crate::Result;
use anyhow::Context;
use image::{DynamicImage, GrayImage, ImageResult, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions treated as source images, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Does `path` carry one of the supported image extensions?
    pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Supported images directly inside `dir`, sorted by path
    pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {:?}", dir))?;

        let mut images = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && Self::is_supported(&path) {
                images.push(path);
            }
        }

        images.sort();
        Ok(images)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ImageResult<DynamicImage> {
        image::open(path)
    }

    /// Decode as 8-bit RGB, whatever the stored layout
    pub fn load_rgb<P: AsRef<Path>>(path: P) -> ImageResult<RgbImage> {
        Ok(image::open(path)?.to_rgb8())
    }

    /// Save with the format implied by the extension
    pub fn save_rgb<P: AsRef<Path>>(image: &RgbImage, path: P) -> ImageResult<()> {
        image.save(path)
    }

    pub fn save_gray<P: AsRef<Path>>(image: &GrayImage, path: P) -> ImageResult<()> {
        image.save(path)
    }

    /// File stem as an owned string, lossy for non-UTF-8 names
    pub fn stem<P: AsRef<Path>>(path: P) -> String {
        path.as_ref()
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(ImageUtils::is_supported("a/b/photo.JPG"));
        assert!(ImageUtils::is_supported("scan.Jpeg"));
        assert!(ImageUtils::is_supported("note.png"));
        assert!(!ImageUtils::is_supported("labels.txt"));
        assert!(!ImageUtils::is_supported("no_extension"));
    }

    #[test]
    fn test_list_images_sorted_and_filtered() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let image = RgbImage::new(4, 4);
        ImageUtils::save_rgb(&image, dir.path().join("b.png"))?;
        ImageUtils::save_rgb(&image, dir.path().join("a.jpg"))?;
        fs::write(dir.path().join("notes.txt"), "x")?;
        fs::create_dir(dir.path().join("nested.png"))?;

        let names: Vec<_> = ImageUtils::list_images(dir.path())?
            .iter()
            .map(ImageUtils::stem)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_load_rgb_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pixel.png");
        ImageUtils::save_rgb(&RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3])), &path)?;

        let loaded = ImageUtils::load_rgb(&path)?;
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(2, 1), &image::Rgb([1, 2, 3]));
        Ok(())
    }
}
