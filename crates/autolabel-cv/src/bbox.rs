//! Pixel-space rectangles
//!
//! Boxes travel through geometric transforms in pixel units so that crops
//! and rotations of non-square images stay exact; they are converted back to
//! normalized form once the composition is done.

use autolabel_core::NormalizedBox;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates, `min` inclusive edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl PixelRect {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Create from a top-left corner and size
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Rectangle covering a whole `width` x `height` image
    pub fn image(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    /// Scale a normalized box onto a `width` x `height` image
    pub fn from_normalized(bbox: &NormalizedBox, width: u32, height: u32) -> Self {
        let (x_min, y_min, x_max, y_max) = bbox.corners();
        let (w, h) = (width as f64, height as f64);
        Self::new(x_min * w, y_min * h, x_max * w, y_max * h)
    }

    /// Express relative to a `width` x `height` image
    pub fn to_normalized(&self, width: u32, height: u32) -> NormalizedBox {
        let (w, h) = (width as f64, height as f64);
        NormalizedBox::from_corners(
            self.x_min / w,
            self.y_min / h,
            self.x_max / w,
            self.y_max / h,
        )
    }

    /// Smallest rectangle containing every point
    pub fn hull(points: &[(f64, f64)]) -> Option<Self> {
        let (&(x0, y0), rest) = points.split_first()?;
        let init = Self::new(x0, y0, x0, y0);

        Some(rest.iter().fold(init, |acc, &(x, y)| {
            Self::new(acc.x_min.min(x), acc.y_min.min(y), acc.x_max.max(x), acc.y_max.max(y))
        }))
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Area, zero for inverted rectangles
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Four corners, clockwise from top-left
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.x_min, self.y_min),
            (self.x_max, self.y_min),
            (self.x_max, self.y_max),
            (self.x_min, self.y_max),
        ]
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x_min + dx, self.y_min + dy, self.x_max + dx, self.y_max + dy)
    }

    /// Overlapping region, `None` when the rectangles only touch or are apart
    pub fn intersection(&self, other: &PixelRect) -> Option<Self> {
        let x1 = self.x_min.max(other.x_min);
        let y1 = self.y_min.max(other.y_min);
        let x2 = self.x_max.min(other.x_max);
        let y2 = self.y_max.min(other.y_max);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(Self::new(x1, y1, x2, y2))
    }

    /// Does this rectangle lie within `other`, up to `tolerance` pixels?
    pub fn is_within(&self, other: &PixelRect, tolerance: f64) -> bool {
        self.x_min >= other.x_min - tolerance
            && self.y_min >= other.y_min - tolerance
            && self.x_max <= other.x_max + tolerance
            && self.y_max <= other.y_max + tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_round_trip() {
        let bbox = NormalizedBox::new(0.25, 0.5, 0.2, 0.4);
        let rect = PixelRect::from_normalized(&bbox, 200, 100);

        let expected = PixelRect::new(30.0, 30.0, 70.0, 70.0);
        for (got, want) in rect.corners().iter().zip(expected.corners()) {
            assert!((got.0 - want.0).abs() < 1e-9 && (got.1 - want.1).abs() < 1e-9);
        }

        let back = rect.to_normalized(200, 100);
        assert!((back.center_x - 0.25).abs() < 1e-12);
        assert!((back.height - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_intersection() {
        let a = PixelRect::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = PixelRect::from_xywh(5.0, 5.0, 10.0, 10.0);

        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap.area(), 25.0);

        let apart = PixelRect::from_xywh(20.0, 0.0, 5.0, 5.0);
        assert!(a.intersection(&apart).is_none());
    }

    #[test]
    fn test_hull() {
        let hull = PixelRect::hull(&[(3.0, 1.0), (-2.0, 4.0), (1.0, -1.0)]).unwrap();
        assert_eq!(hull, PixelRect::new(-2.0, -1.0, 3.0, 4.0));
        assert!(PixelRect::hull(&[]).is_none());
    }

    #[test]
    fn test_is_within() {
        let canvas = PixelRect::image(100, 50);
        assert!(PixelRect::new(0.0, 0.0, 100.0, 50.0).is_within(&canvas, 1e-9));
        assert!(!PixelRect::new(-1.0, 0.0, 10.0, 10.0).is_within(&canvas, 1e-9));
    }
}
