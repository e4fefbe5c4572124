//! Contour-based bootstrapping of single-object labels

pub mod config;
pub mod labeler;
pub mod localizer;

pub use config::LocalizerConfig;
pub use labeler::{LabelingReport, label_directory};
pub use localizer::{ContourLocalizer, Detection, NoDetection};
