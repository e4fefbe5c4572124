//! Plain-text label files, one object per line:
//!
//! ```text
//! <class_id> <center_x> <center_y> <width> <height>
//! ```
//!
//! Coordinates are written with exactly six decimals.

use crate::boxes::{NormalizedBox, round6};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Minimum token count of a usable label line.
const FIELDS: usize = 5;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to access label file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid number '{token}' at line {line} of {source_name}")]
    InvalidNumber {
        source_name: String,
        line: usize,
        token: String,
    },
}

/// One labeled object: a class id paired with its box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub class_id: u32,
    pub bbox: NormalizedBox,
}

impl Label {
    pub fn new(class_id: u32, bbox: NormalizedBox) -> Self {
        Self { class_id, bbox }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bbox;
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, b.center_x, b.center_y, b.width, b.height
        )
    }
}

/// Parse the contents of a label file.
///
/// Blank lines are ignored. Lines with fewer than five tokens are skipped
/// with a warning; tokens past the fifth are ignored. `source_name` only
/// feeds diagnostics.
pub fn parse_labels(text: &str, source_name: &str) -> Result<Vec<Label>, LabelError> {
    let mut labels = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        if parts.len() < FIELDS {
            warn!(
                "Skipping invalid line {} in {}: expected {} fields, found {}",
                line_no,
                source_name,
                FIELDS,
                parts.len()
            );
            continue;
        }

        let invalid = |token: &str| LabelError::InvalidNumber {
            source_name: source_name.to_string(),
            line: line_no,
            token: token.to_string(),
        };

        let class_id = parts[0].parse::<u32>().map_err(|_| invalid(parts[0]))?;

        let mut coords = [0.0f64; 4];
        for (slot, &token) in coords.iter_mut().zip(&parts[1..FIELDS]) {
            let value = token.parse::<f64>().map_err(|_| invalid(token))?;
            *slot = round6(value);
        }

        let [x, y, w, h] = coords;
        labels.push(Label::new(class_id, NormalizedBox::new(x, y, w, h)));
    }

    Ok(labels)
}

/// Render labels in file form, one newline-terminated line each.
pub fn format_labels(labels: &[Label]) -> String {
    labels.iter().map(|label| format!("{label}\n")).collect()
}

pub fn read_labels<P: AsRef<Path>>(path: P) -> Result<Vec<Label>, LabelError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LabelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_labels(&text, &path.display().to_string())
}

pub fn write_labels<P: AsRef<Path>>(path: P, labels: &[Label]) -> Result<(), LabelError> {
    let path = path.as_ref();
    fs::write(path, format_labels(labels)).map_err(|source| LabelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Label file paired with an image: same stem, `.txt` extension.
pub fn label_path_for<P: AsRef<Path>>(image_path: P, label_dir: &Path) -> Option<PathBuf> {
    let stem = image_path.as_ref().file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".txt");
    Some(label_dir.join(name))
}
