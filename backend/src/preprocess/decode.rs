use std::io::Cursor;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageReader, RgbImage};
use ndarray::{Array4, ArrayView4};

use crate::config::UploadLimits;
use crate::error::InferenceError;

/// Side length of the square classifier input.
pub const INPUT_SIZE: u32 = 224;
pub const INPUT_CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeLimits {
    pub max_dimension: u32,
    pub max_alloc_bytes: u64,
}

impl From<&UploadLimits> for DecodeLimits {
    fn from(limits: &UploadLimits) -> Self {
        Self {
            max_dimension: limits.max_image_dimension,
            max_alloc_bytes: limits.max_decode_alloc_bytes,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::from(&UploadLimits::default())
    }
}

/// Decodes an uploaded image and converts it to 8-bit RGB.
///
/// Grayscale is replicated across channels, alpha is dropped and 16-bit
/// samples are scaled down, so every image reaching the classifier has
/// exactly three channels.
///
/// A recognized header that declares dimensions or a buffer beyond `limits`
/// fails as `ImageTooLarge`, even if the rest of the file is corrupt.
/// Unrecognized or malformed data fails as `Decode`.
pub fn decode_image(bytes: &[u8], limits: &DecodeLimits) -> Result<RgbImage, InferenceError> {
    if bytes.is_empty() {
        return Err(InferenceError::Decode("upload is empty".to_string()));
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| InferenceError::Decode(e.to_string()))?;
    if reader.format().is_none() {
        return Err(InferenceError::Decode("unrecognized image format".to_string()));
    }

    let mut decode_limits = image::Limits::default();
    decode_limits.max_image_width = Some(limits.max_dimension);
    decode_limits.max_image_height = Some(limits.max_dimension);
    decode_limits.max_alloc = Some(limits.max_alloc_bytes);
    reader.limits(decode_limits);

    let image = reader.decode()?;
    Ok(image.to_rgb8())
}

/// A (1, 224, 224, 3) NHWC batch with every value in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor(Array4<f32>);

impl NormalizedTensor {
    pub const SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS];

    /// Bilinear resize to the input size, then scale by 1/255.
    pub fn from_rgb(image: &RgbImage) -> Self {
        let resized;
        let source = if image.dimensions() == (INPUT_SIZE, INPUT_SIZE) {
            image
        } else {
            resized = imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
            &resized
        };

        let side = INPUT_SIZE as usize;
        let data = Array4::from_shape_fn((1, side, side, INPUT_CHANNELS), |(_, y, x, c)| {
            f32::from(source.get_pixel(x as u32, y as u32)[c]) / 255.0
        });
        Self(data)
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    /// Channels-first copy for frameworks that expect NCHW.
    pub fn to_nchw(&self) -> Array4<f32> {
        self.0
            .view()
            .permuted_axes([0, 3, 1, 2])
            .as_standard_layout()
            .into_owned()
    }

    /// Contiguous NHWC values.
    pub fn to_vec(&self) -> Vec<f32> {
        self.0.iter().copied().collect()
    }
}

/// Decodes, converts and normalizes an upload in one step.
pub fn preprocess(bytes: &[u8], limits: &DecodeLimits) -> Result<NormalizedTensor, InferenceError> {
    let image = decode_image(bytes, limits)?;
    Ok(NormalizedTensor::from_rgb(&image))
}

/// Loads an image file for offline use (dataset inspection, fixtures).
pub fn load_image_path(path: impl AsRef<Path>) -> image::ImageResult<NormalizedTensor> {
    let image = image::open(path)?.to_rgb8();
    Ok(NormalizedTensor::from_rgb(&image))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, Rgba, RgbaImage};

    pub(crate) fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn empty_bytes_are_a_decode_error() {
        let err = decode_image(&[], &DecodeLimits::default()).unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let err = decode_image(b"definitely not a png", &DecodeLimits::default()).unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }

    #[test]
    fn recognized_header_with_huge_declared_size_is_too_large() {
        // "GIF89a" then width/height bytes "-n" and "ot": 28205 x 29807.
        let err = decode_image(b"GIF89a-not-really", &DecodeLimits::default()).unwrap_err();
        assert!(matches!(err, InferenceError::ImageTooLarge(_)));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([1, 2, 3]))),
            ImageFormat::Png,
        );
        let err = decode_image(&png[..png.len() / 2], &DecodeLimits::default()).unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }

    #[test]
    fn oversized_dimensions_hit_the_limit() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::new(300, 10)),
            ImageFormat::Png,
        );
        let limits = DecodeLimits {
            max_dimension: 256,
            max_alloc_bytes: u64::MAX,
        };
        let err = decode_image(&png, &limits).unwrap_err();
        assert!(matches!(err, InferenceError::ImageTooLarge(_)));
    }

    #[test]
    fn grayscale_and_rgba_become_rgb() {
        let gray = encode(
            DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([200]))),
            ImageFormat::Png,
        );
        let rgb = decode_image(&gray, &DecodeLimits::default()).unwrap();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([200, 200, 200]));

        let rgba = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 0]))),
            ImageFormat::Png,
        );
        let rgb = decode_image(&rgba, &DecodeLimits::default()).unwrap();
        assert_eq!(rgb.get_pixel(3, 3), &Rgb([10, 20, 30]));
    }

    #[test]
    fn tensor_shape_and_range_hold_for_any_input_size() {
        for (w, h) in [(1, 1), (224, 224), (640, 97), (31, 500)] {
            let image = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 255]));
            let tensor = NormalizedTensor::from_rgb(&image);
            assert_eq!(tensor.view().shape(), &NormalizedTensor::SHAPE);
            assert!(tensor.view().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn values_are_scaled_by_255() {
        let image = RgbImage::from_pixel(224, 224, Rgb([0, 51, 255]));
        let tensor = NormalizedTensor::from_rgb(&image);
        let view = tensor.view();
        assert_eq!(view[[0, 10, 10, 0]], 0.0);
        assert!((view[[0, 10, 10, 1]] - 0.2).abs() < 1e-6);
        assert_eq!(view[[0, 223, 223, 2]], 1.0);
    }

    #[test]
    fn nchw_moves_channels_forward() {
        let image = RgbImage::from_fn(224, 224, |x, _| Rgb([x as u8, 7, 9]));
        let tensor = NormalizedTensor::from_rgb(&image);
        let nchw = tensor.to_nchw();
        assert_eq!(nchw.shape(), &[1, 3, 224, 224]);
        assert_eq!(nchw[[0, 0, 5, 100]], tensor.view()[[0, 5, 100, 0]]);
        assert_eq!(nchw[[0, 2, 0, 0]], 9.0 / 255.0);
        assert_eq!(tensor.to_vec().len(), 224 * 224 * 3);
    }

    #[test]
    fn jpeg_round_trip_through_preprocess() {
        let jpeg = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 80, Rgb([30, 160, 40]))),
            ImageFormat::Jpeg,
        );
        let tensor = preprocess(&jpeg, &DecodeLimits::default()).unwrap();
        assert_eq!(tensor.view().shape(), &NormalizedTensor::SHAPE);
    }
}
