//! Geometric transforms: move pixels and boxes together.

use super::Canvas;
use crate::bbox::PixelRect;
use crate::error::TransformError;
use image::{Rgb, imageops};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};

/// Fill for pixels uncovered by a rotation or shift.
const BORDER_FILL: Rgb<u8> = Rgb([0, 0, 0]);

/// 2x3 affine map in continuous pixel coordinates, where pixel `(i, j)`
/// covers `[i, i + 1) x [j, j + 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    m: [f64; 6],
}

impl Affine {
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        }
    }

    /// Rotation by `angle` degrees (counter-clockwise on screen) and uniform
    /// scaling, both about `(cx, cy)`.
    pub fn rotation_about(cx: f64, cy: f64, angle: f64, scale: f64) -> Self {
        let rad = angle.to_radians();
        let a = scale * rad.cos();
        let b = scale * rad.sin();

        Self {
            m: [
                a,
                b,
                (1.0 - a) * cx - b * cy,
                -b,
                a,
                b * cx + (1.0 - a) * cy,
            ],
        }
    }

    pub fn then_translate(mut self, tx: f64, ty: f64) -> Self {
        self.m[2] += tx;
        self.m[5] += ty;
        self
    }

    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let m = &self.m;
        (m[0] * x + m[1] * y + m[2], m[3] * x + m[4] * y + m[5])
    }

    /// Axis-aligned hull of the mapped corners.
    pub fn map_rect(&self, rect: &PixelRect) -> PixelRect {
        let corners = rect.corners().map(|p| self.apply(p));
        // four corners are always present
        PixelRect::hull(&corners).unwrap_or(*rect)
    }

    /// Projection in imageproc's convention, where pixel centers sit on
    /// integer coordinates.
    fn to_projection(self) -> Option<Projection> {
        let [a, b, c, d, e, f] = self.m;
        let tx = c + 0.5 * (a + b) - 0.5;
        let ty = f + 0.5 * (d + e) - 0.5;

        Projection::from_matrix([
            a as f32, b as f32, tx as f32, d as f32, e as f32, ty as f32, 0.0, 0.0, 1.0,
        ])
    }
}

pub fn horizontal_flip(canvas: &mut Canvas) {
    imageops::flip_horizontal_in_place(&mut canvas.image);
    let width = canvas.image.width() as f64;
    for tracked in &mut canvas.boxes {
        let r = tracked.rect;
        tracked.rect = PixelRect::new(width - r.x_max, r.y_min, width - r.x_min, r.y_max);
    }
}

pub fn vertical_flip(canvas: &mut Canvas) {
    imageops::flip_vertical_in_place(&mut canvas.image);
    let height = canvas.image.height() as f64;
    for tracked in &mut canvas.boxes {
        let r = tracked.rect;
        tracked.rect = PixelRect::new(r.x_min, height - r.y_max, r.x_max, height - r.y_min);
    }
}

/// Warp image and boxes through `affine`, keeping the image size.
pub fn apply_affine(
    canvas: &mut Canvas,
    affine: Affine,
    name: &'static str,
) -> Result<(), TransformError> {
    let projection = affine.to_projection().ok_or(TransformError::Singular(name))?;
    canvas.image = warp(&canvas.image, &projection, Interpolation::Bilinear, BORDER_FILL);

    for tracked in &mut canvas.boxes {
        tracked.rect = affine.map_rect(&tracked.rect);
    }
    Ok(())
}

pub fn rotate(canvas: &mut Canvas, angle: f64) -> Result<(), TransformError> {
    let (w, h) = canvas.image.dimensions();
    let affine = Affine::rotation_about(w as f64 / 2.0, h as f64 / 2.0, angle, 1.0);
    apply_affine(canvas, affine, "rotate")
}

/// `dx`/`dy` are fractions of the image width/height.
pub fn shift_scale_rotate(
    canvas: &mut Canvas,
    dx: f64,
    dy: f64,
    scale: f64,
    angle: f64,
) -> Result<(), TransformError> {
    let (w, h) = canvas.image.dimensions();
    let (w, h) = (w as f64, h as f64);
    let affine = Affine::rotation_about(w / 2.0, h / 2.0, angle, scale).then_translate(dx * w, dy * h);
    apply_affine(canvas, affine, "shift_scale_rotate")
}

/// Pixels removed from each edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Borders {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

pub fn crop_from_borders(canvas: &mut Canvas, borders: Borders) -> Result<(), TransformError> {
    let (w, h) = canvas.image.dimensions();
    let width = w.saturating_sub(borders.left.saturating_add(borders.right));
    let height = h.saturating_sub(borders.top.saturating_add(borders.bottom));

    if width == 0 || height == 0 {
        return Err(TransformError::DegenerateCrop { width, height });
    }

    canvas.image = imageops::crop_imm(&canvas.image, borders.left, borders.top, width, height).to_image();

    let (dx, dy) = (-(borders.left as f64), -(borders.top as f64));
    for tracked in &mut canvas.boxes {
        tracked.rect = tracked.rect.translate(dx, dy);
    }
    Ok(())
}
