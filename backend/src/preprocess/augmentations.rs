use std::f32::consts::TAU;

use image::{imageops, Rgb, RgbImage};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipMode {
    None,
    Horizontal,
    Vertical,
    HorizontalAndVertical,
}

/// How pixels sampled outside the source are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    Reflect,
    Nearest,
    Constant,
}

/// Random flip, rotation and zoom applied to training images.
///
/// `rotation_factor` is a fraction of a full turn: the angle is drawn from
/// `[-factor, factor] * 2π`. `zoom_factor` draws a scale from
/// `[1 - factor, 1 + factor]`, where values above one zoom out.
#[derive(Debug, Clone, PartialEq)]
pub struct Augmenter {
    pub flip: FlipMode,
    pub rotation_factor: f32,
    pub zoom_factor: f32,
    pub fill_mode: FillMode,
}

impl Augmenter {
    pub fn is_identity(&self) -> bool {
        self.flip == FlipMode::None && self.rotation_factor == 0.0 && self.zoom_factor == 0.0
    }

    pub fn apply<R: Rng + ?Sized>(&self, image: &RgbImage, rng: &mut R) -> RgbImage {
        let mut out = image.clone();

        let (horizontal, vertical) = match self.flip {
            FlipMode::None => (false, false),
            FlipMode::Horizontal => (true, false),
            FlipMode::Vertical => (false, true),
            FlipMode::HorizontalAndVertical => (true, true),
        };
        if horizontal && rng.random_bool(0.5) {
            imageops::flip_horizontal_in_place(&mut out);
        }
        if vertical && rng.random_bool(0.5) {
            imageops::flip_vertical_in_place(&mut out);
        }

        let angle = if self.rotation_factor > 0.0 {
            rng.random_range(-self.rotation_factor..=self.rotation_factor) * TAU
        } else {
            0.0
        };
        let zoom = if self.zoom_factor > 0.0 {
            1.0 + rng.random_range(-self.zoom_factor..=self.zoom_factor)
        } else {
            1.0
        };

        if angle != 0.0 || zoom != 1.0 {
            out = warp(&out, angle, zoom, self.fill_mode);
        }
        out
    }
}

/// Rotates by `angle` radians and scales by `zoom` around the image centre,
/// sampling bilinearly.
fn warp(image: &RgbImage, angle: f32, zoom: f32, fill: FillMode) -> RgbImage {
    let (w, h) = image.dimensions();
    let cx = (w as f32 - 1.0) / 2.0;
    let cy = (h as f32 - 1.0) / 2.0;
    let (sin, cos) = angle.sin_cos();

    RgbImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let sx = zoom * (cos * dx + sin * dy) + cx;
        let sy = zoom * (-sin * dx + cos * dy) + cy;
        sample_bilinear(image, sx, sy, fill)
    })
}

fn sample_bilinear(image: &RgbImage, x: f32, y: f32, fill: FillMode) -> Rgb<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let corners = [
        (fetch(image, x0, y0, fill), (1.0 - fx) * (1.0 - fy)),
        (fetch(image, x0 + 1, y0, fill), fx * (1.0 - fy)),
        (fetch(image, x0, y0 + 1, fill), (1.0 - fx) * fy),
        (fetch(image, x0 + 1, y0 + 1, fill), fx * fy),
    ];

    let mut px = [0u8; 3];
    for (c, out) in px.iter_mut().enumerate() {
        let v: f32 = corners.iter().map(|(p, wgt)| f32::from(p[c]) * wgt).sum();
        *out = v.round().clamp(0.0, 255.0) as u8;
    }
    Rgb(px)
}

fn fetch(image: &RgbImage, x: i64, y: i64, fill: FillMode) -> Rgb<u8> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let inside = (0..w).contains(&x) && (0..h).contains(&y);
    let (x, y) = match fill {
        _ if inside => (x, y),
        FillMode::Constant => return Rgb([0, 0, 0]),
        FillMode::Nearest => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        FillMode::Reflect => (reflect(x, w), reflect(y, h)),
    };
    *image.get_pixel(x as u32, y as u32)
}

// d c b a | a b c d | d c b a
fn reflect(i: i64, n: i64) -> i64 {
    let m = i.rem_euclid(2 * n);
    if m < n { m } else { 2 * n - 1 - m }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f32::consts::PI;

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 128]))
    }

    fn identity() -> Augmenter {
        Augmenter {
            flip: FlipMode::None,
            rotation_factor: 0.0,
            zoom_factor: 0.0,
            fill_mode: FillMode::Reflect,
        }
    }

    #[test]
    fn identity_augmenter_keeps_pixels() {
        let image = gradient(12, 9);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(identity().apply(&image, &mut rng), image);
    }

    #[test]
    fn half_turn_equals_double_flip() {
        let image = gradient(11, 7);
        let rotated = warp(&image, PI, 1.0, FillMode::Constant);
        let mut flipped = image.clone();
        imageops::flip_horizontal_in_place(&mut flipped);
        imageops::flip_vertical_in_place(&mut flipped);
        assert_eq!(rotated, flipped);
    }

    #[test]
    fn flips_only_ever_produce_one_of_four_orientations() {
        let image = gradient(6, 5);
        let augmenter = Augmenter {
            flip: FlipMode::HorizontalAndVertical,
            ..identity()
        };
        let h = imageops::flip_horizontal(&image);
        let v = imageops::flip_vertical(&image);
        let hv = imageops::flip_vertical(&h);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..32 {
            let out = augmenter.apply(&image, &mut rng);
            assert!(out == image || out == h || out == v || out == hv);
        }
    }

    #[test]
    fn random_warps_keep_dimensions() {
        let image = gradient(20, 14);
        let augmenter = Augmenter {
            flip: FlipMode::HorizontalAndVertical,
            rotation_factor: 0.2,
            zoom_factor: 0.2,
            fill_mode: FillMode::Reflect,
        };
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..8 {
            assert_eq!(augmenter.apply(&image, &mut rng).dimensions(), (20, 14));
        }
    }

    #[test]
    fn zoom_out_with_constant_fill_blackens_corners() {
        let image = RgbImage::from_pixel(16, 16, Rgb([255, 255, 255]));
        let out = warp(&image, 0.0, 2.0, FillMode::Constant);
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(8, 8), &Rgb([255, 255, 255]));
    }

    #[test]
    fn reflect_mirrors_including_the_edge() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
    }
}
