use serde::{Deserialize, Serialize};

/// Axis-aligned box in image-normalized coordinates, origin top-left.
///
/// All four values are fractions of the image width/height. Boxes are plain
/// values: transforms build new boxes instead of mutating existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedBox {
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Build from `(x_min, y_min, x_max, y_max)` corners.
    pub fn from_corners(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            center_x: (x_min + x_max) / 2.0,
            center_y: (y_min + y_max) / 2.0,
            width: x_max - x_min,
            height: y_max - y_min,
        }
    }

    /// Corners as `(x_min, y_min, x_max, y_max)`.
    pub fn corners(&self) -> (f64, f64, f64, f64) {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        (
            self.center_x - half_w,
            self.center_y - half_h,
            self.center_x + half_w,
            self.center_y + half_h,
        )
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Mirror across the vertical axis of the image.
    pub fn flip_horizontal(&self) -> Self {
        Self {
            center_x: 1.0 - self.center_x,
            ..*self
        }
    }

    /// Mirror across the horizontal axis of the image.
    pub fn flip_vertical(&self) -> Self {
        Self {
            center_y: 1.0 - self.center_y,
            ..*self
        }
    }

    /// Clamp the corners into the unit square.
    pub fn clamped(&self) -> Self {
        let (x_min, y_min, x_max, y_max) = self.corners();
        Self::from_corners(
            x_min.clamp(0.0, 1.0),
            y_min.clamp(0.0, 1.0),
            x_max.clamp(0.0, 1.0),
            y_max.clamp(0.0, 1.0),
        )
    }

    /// Round every coordinate to six decimals, the precision of label files.
    pub fn rounded(&self) -> Self {
        Self {
            center_x: round6(self.center_x),
            center_y: round6(self.center_y),
            width: round6(self.width),
            height: round6(self.height),
        }
    }
}

pub(crate) fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Is `bbox` well-formed and large enough to keep?
///
/// Width and height must be strictly greater than `min_extent` and lie in
/// `(0, 1]`; the center must lie in `[0, 1]` on both axes.
pub fn is_valid(bbox: &NormalizedBox, min_extent: f64) -> bool {
    let NormalizedBox {
        center_x,
        center_y,
        width,
        height,
    } = *bbox;

    if width <= min_extent || height <= min_extent {
        return false;
    }

    if !((0.0..=1.0).contains(&center_x) && (0.0..=1.0).contains(&center_y)) {
        return false;
    }

    width > 0.0 && width <= 1.0 && height > 0.0 && height <= 1.0
}

/// Validity filter carrying its minimum extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxValidator {
    pub min_extent: f64,
}

impl BoxValidator {
    pub fn new(min_extent: f64) -> Self {
        Self { min_extent }
    }

    pub fn is_valid(&self, bbox: &NormalizedBox) -> bool {
        is_valid(bbox, self.min_extent)
    }

    /// Keep only the items whose box passes, preserving order.
    pub fn retain<T, F>(&self, items: Vec<T>, bbox_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &NormalizedBox,
    {
        items
            .into_iter()
            .filter(|item| self.is_valid(bbox_of(item)))
            .collect()
    }
}

impl Default for BoxValidator {
    fn default() -> Self {
        Self::new(1e-4)
    }
}
