//! Data layer for the auto-labeling toolkit.
//!
//! Holds the normalized bounding box type, the validity predicate applied to
//! every synthesized box, and the plain-text label format shared by the
//! localizer and the augmentation driver.

pub mod boxes;
pub mod labels;

pub use boxes::{BoxValidator, NormalizedBox, is_valid};
pub use labels::{
    Label, LabelError, format_labels, label_path_for, parse_labels, read_labels, write_labels,
};
