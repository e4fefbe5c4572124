//! Localizer configuration

use serde::{Deserialize, Serialize};

/// Fixed edge/contour parameters; a localization pass is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizerConfig {
    /// Gaussian sigma applied to the intensity image before edge detection
    pub blur_sigma: f32,
    /// Canny hysteresis thresholds
    pub canny_low: f32,
    pub canny_high: f32,
    /// Dilation radius (L-infinity, pixels) closing gaps in the edge map
    pub edge_dilation: u8,
    /// Largest contour area over image area must reach this
    pub min_area_ratio: f64,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
            edge_dilation: 1,
            min_area_ratio: 0.05,
        }
    }
}
