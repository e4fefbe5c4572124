//! Photometric transforms: pixels only, boxes untouched.

use image::{Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;

/// `out = alpha * in + beta * 255`, saturating.
pub fn brightness_contrast(image: &mut RgbImage, alpha: f64, beta: f64) {
    let offset = beta * 255.0;
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = saturate(alpha * *channel as f64 + offset);
        }
    }
}

/// Shift hue by `hue` degrees and saturation/value by amounts on the 0-255
/// scale.
pub fn hue_saturation_value(image: &mut RgbImage, hue: f64, sat: f64, val: f64) {
    for pixel in image.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(*pixel);
        let h = (h + hue).rem_euclid(360.0);
        let s = (s + sat / 255.0).clamp(0.0, 1.0);
        let v = (v + val / 255.0).clamp(0.0, 1.0);
        *pixel = hsv_to_rgb(h, s, v);
    }
}

/// Sigma an odd `kernel` size implies when none is given explicitly.
pub fn sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

pub fn gaussian_blur(image: &RgbImage, kernel: u32) -> RgbImage {
    gaussian_blur_f32(image, sigma_for_kernel(kernel.max(3)))
}

fn saturate(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Hue in degrees, saturation and value in `[0, 1]`.
fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> (f64, f64, f64) {
    let (r, g, b) = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (hue, saturation, max)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb([
        saturate((r + m) * 255.0),
        saturate((g + m) * 255.0),
        saturate((b + m) * 255.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_contrast_saturates() {
        let mut image = RgbImage::from_pixel(2, 2, Rgb([100, 200, 0]));
        brightness_contrast(&mut image, 1.5, 0.1);

        // 1.5 * 100 + 25.5, 1.5 * 200 + 25.5 clipped, 0 + 25.5
        assert_eq!(image.get_pixel(0, 0), &Rgb([176, 255, 26]));
    }

    #[test]
    fn test_hsv_round_trip() {
        for color in [[255, 0, 0], [12, 200, 90], [128, 128, 128], [0, 0, 0], [40, 10, 250]] {
            let (h, s, v) = rgb_to_hsv(Rgb(color));
            assert_eq!(hsv_to_rgb(h, s, v), Rgb(color));
        }
    }

    #[test]
    fn test_hue_shift_rotates_primaries() {
        let mut image = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        hue_saturation_value(&mut image, 120.0, 0.0, 0.0);
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 255, 0]));
    }

    #[test]
    fn test_blur_keeps_size_and_smooths() {
        let mut image = RgbImage::new(9, 9);
        image.put_pixel(4, 4, Rgb([255, 255, 255]));

        let blurred = gaussian_blur(&image, 3);
        assert_eq!(blurred.dimensions(), (9, 9));
        assert!(blurred.get_pixel(4, 4)[0] < 255);
        assert!(blurred.get_pixel(4, 5)[0] > 0);
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
    }
}
