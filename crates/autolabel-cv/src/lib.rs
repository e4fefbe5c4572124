//! Autolabel Computer Vision Library
//!
//! Bounding-box aware augmentation and contour-based bootstrapping of
//! labels for single-object detection datasets.

pub mod augment;
pub mod bbox;
pub mod error;
pub mod localize;
pub mod sample;
pub mod transform;
pub mod utils;

// Re-export commonly used types
pub use augment::{AugmentConfig, AugmentationDriver, Corpus, CorpusPaths, RunReport};
pub use bbox::PixelRect;
pub use error::{AbandonReason, AttemptError, DriverError, TransformError};
pub use localize::{ContourLocalizer, Detection, LocalizerConfig, NoDetection};
pub use sample::LabeledImage;
pub use transform::{BboxPolicy, PipelineConfig, TransformPipeline};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the CV system
pub mod traits {
    use super::*;
    use rand::Rng;

    /// Randomized image + box transformation driven by the augmentation loop.
    ///
    /// Implementations may drop box/label pairs but never add or duplicate
    /// them, and must keep every surviving class id paired with its box.
    pub trait Augment {
        fn augment<R: Rng + ?Sized>(
            &self,
            sample: LabeledImage,
            rng: &mut R,
        ) -> std::result::Result<LabeledImage, TransformError>;
    }
}
