//! skinscan‑preprocess – square rescale + normalize lesion photos.
//!
//! Any decodable image goes in, a `[1, side, side, 3]` f32 tensor comes out:
//! row‑major pixels, interleaved R,G,B, each channel divided by 255.
//! Aspect ratio is discarded (scale, never crop) and alpha is dropped.

use image::{DynamicImage, RgbImage, RgbaImage};
use ndarray::{Array4, ArrayView4};
use resize::{new, Pixel, Type};
use rgb::FromSlice;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input resolution the bundled lesion model was trained on.
pub const DEFAULT_SIDE: u32 = 224;

/// Channels emitted per pixel (R, G, B).
pub const CHANNELS: usize = 3;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("target side must be positive, got {0}")]
    InvalidSide(u32),
    #[error("target side {0} is too large for an in-memory tensor")]
    SideTooLarge(u32),
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("expected a {side}x{side} image, got {width}x{height}")]
    Dimensions { side: u32, width: u32, height: u32 },
    #[error("raw RGBA buffer holds {actual} bytes, {width}x{height} needs {expected}")]
    RawBuffer { width: u32, height: u32, expected: usize, actual: usize },
    #[error("resize failed: {0}")]
    Resize(#[from] resize::Error),
    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, PreprocessError>;

/// Resampling kernel used for the square rescale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    /// Unfiltered nearest-pixel sampling.
    #[default]
    Nearest,
    Triangle,
    Lanczos3,
}

impl ResizeFilter {
    fn kernel(self) -> Type {
        match self {
            ResizeFilter::Nearest => Type::Point,
            ResizeFilter::Triangle => Type::Triangle,
            ResizeFilter::Lanczos3 => Type::Lanczos3,
        }
    }
}

impl std::str::FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "triangle" => Ok(ResizeFilter::Triangle),
            "lanczos3" => Ok(ResizeFilter::Lanczos3),
            other => Err(format!("unknown resize filter `{other}`")),
        }
    }
}

/// Normalized model input, always shaped `[1, side, side, 3]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Array4<f32>,
}

impl InputTensor {
    pub fn side(&self) -> u32 {
        self.data.shape()[1] as u32
    }

    /// NHWC shape handed to the inference runtime.
    pub fn shape(&self) -> [usize; 4] {
        let s = self.data.shape();
        [s[0], s[1], s[2], s[3]]
    }

    /// Number of floats, always `side * side * 3`.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// Flat row-major sequence: R,G,B of pixel (0,0), then (0,1), …
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    side: u32,
    filter: ResizeFilter,
}

impl Preprocessor {
    /// Create a pre‑processor that outputs side×side RGB (0‑1.0f32).
    pub fn new(side: u32) -> Result<Self> {
        Self::with_filter(side, ResizeFilter::default())
    }

    pub fn with_filter(side: u32, filter: ResizeFilter) -> Result<Self> {
        if side == 0 {
            return Err(PreprocessError::InvalidSide(side));
        }
        tensor_len(side).ok_or(PreprocessError::SideTooLarge(side))?;
        Ok(Self { side, filter })
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn filter(&self) -> ResizeFilter {
        self.filter
    }

    /// Scale + pack in one go.
    pub fn run(&self, image: &DynamicImage) -> Result<InputTensor> {
        let scaled = self.scale(image)?;
        self.pack(&scaled)
    }

    /// Convert to 8-bit RGB and rescale to side×side, ignoring aspect ratio.
    pub fn scale(&self, image: &DynamicImage) -> Result<RgbImage> {
        let (w, h) = (image.width(), image.height());
        if w == 0 || h == 0 {
            return Err(PreprocessError::EmptyImage { width: w, height: h });
        }

        // 1. any pixel format → RGB8 (alpha dropped, 16-bit/float narrowed)
        let rgb = image.to_rgb8();
        if w == self.side && h == self.side {
            return Ok(rgb);
        }

        // 2. resize to dst size
        let len = tensor_len(self.side).ok_or(PreprocessError::SideTooLarge(self.side))?;
        let side = self.side as usize;
        let mut dst = vec![0u8; len];
        let mut resizer = new(
            w as usize,
            h as usize,
            side,
            side,
            Pixel::RGB8,
            self.filter.kernel(),
        )?;
        resizer.resize(rgb.as_raw().as_rgb(), dst.as_rgb_mut())?;

        log::debug!("scaled {}x{} image to {}x{} ({:?})", w, h, side, side, self.filter);

        // dst was allocated for exactly side×side×3 bytes
        RgbImage::from_raw(self.side, self.side, dst).ok_or(PreprocessError::Dimensions {
            side: self.side,
            width: self.side,
            height: self.side,
        })
    }

    /// Pack an already scaled side×side image into the normalized tensor.
    pub fn pack(&self, image: &RgbImage) -> Result<InputTensor> {
        if image.width() != self.side || image.height() != self.side {
            return Err(PreprocessError::Dimensions {
                side: self.side,
                width: image.width(),
                height: image.height(),
            });
        }

        let side = self.side as usize;
        let values: Vec<f32> = image.as_raw().iter().map(|&px| px as f32 / 255.0).collect();
        let data = Array4::from_shape_vec((1, side, side, CHANNELS), values)?;
        Ok(InputTensor { data })
    }
}

/// `side * side * 3`, or `None` if that overflows `usize`.
fn tensor_len(side: u32) -> Option<usize> {
    let side = usize::try_from(side).ok()?;
    side.checked_mul(side)?.checked_mul(CHANNELS)
}

/// Resize `image` to side×side and flatten it to `side*side*3` floats in [0,1].
pub fn normalize(image: &DynamicImage, side: u32) -> Result<Vec<f32>> {
    Ok(Preprocessor::new(side)?.run(image)?.to_vec())
}

/// Wrap a raw RGBA8 bitmap (as handed over by a capture source) into an image.
pub fn rgba8_image(width: u32, height: u32, bytes: Vec<u8>) -> Result<DynamicImage> {
    // saturates; a Vec can never hold usize::MAX bytes
    let expected = (width as usize).saturating_mul(height as usize).saturating_mul(4);
    let actual = bytes.len();
    RgbaImage::from_raw(width, height, bytes)
        .filter(|_| actual == expected)
        .map(DynamicImage::ImageRgba8)
        .ok_or(PreprocessError::RawBuffer { width, height, expected, actual })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, Rgba};

    #[test]
    fn zero_side_rejected() {
        assert!(matches!(Preprocessor::new(0), Err(PreprocessError::InvalidSide(0))));
    }

    #[test]
    fn empty_image_rejected() {
        let pp = Preprocessor::new(8).unwrap();
        let err = pp.run(&DynamicImage::new_rgb8(0, 5)).unwrap_err();
        assert!(matches!(err, PreprocessError::EmptyImage { width: 0, height: 5 }));
    }

    #[test]
    fn pack_rejects_wrong_size() {
        let pp = Preprocessor::new(4).unwrap();
        let err = pp.pack(&RgbImage::new(4, 5)).unwrap_err();
        assert!(matches!(err, PreprocessError::Dimensions { side: 4, width: 4, height: 5 }));
    }

    #[test]
    fn pixel_order_is_row_major_rgb() {
        // 2x2 already at target size → no resampling involved
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 255]));
        img.put_pixel(1, 1, Rgb([51, 102, 204]));

        let out = normalize(&DynamicImage::ImageRgb8(img), 2).unwrap();
        assert_eq!(
            out,
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.2, 0.4, 0.8]
        );
    }

    #[test]
    fn alpha_is_dropped() {
        let img = ImageBuffer::from_pixel(3, 3, Rgba([255u8, 128, 0, 10]));
        let out = normalize(&DynamicImage::ImageRgba8(img), 3).unwrap();
        assert_eq!(out.len(), 3 * 3 * 3);
        for px in out.chunks(3) {
            assert_eq!(px, &[1.0, 128.0 / 255.0, 0.0]);
        }
    }

    #[test]
    fn grayscale_is_expanded_to_rgb() {
        let img = ImageBuffer::from_pixel(10, 6, Luma([255u8]));
        let out = normalize(&DynamicImage::ImageLuma8(img), 4).unwrap();
        assert_eq!(out.len(), 4 * 4 * 3);
        assert!(out.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn sixteen_bit_is_narrowed() {
        let img = ImageBuffer::from_pixel(5, 5, Rgb([u16::MAX, 0, u16::MAX]));
        let out = normalize(&DynamicImage::ImageRgb16(img), 5).unwrap();
        for px in out.chunks(3) {
            assert_eq!(px, &[1.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn tensor_shape_is_nhwc() {
        let pp = Preprocessor::new(224).unwrap();
        let t = pp.run(&DynamicImage::new_rgb8(31, 17)).unwrap();
        assert_eq!(t.shape(), [1, 224, 224, 3]);
        assert_eq!(t.side(), 224);
        assert_eq!(t.len(), 224 * 224 * 3);
    }

    #[test]
    fn raw_rgba_buffer_length_checked() {
        assert!(rgba8_image(2, 2, vec![0; 16]).is_ok());
        let err = rgba8_image(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, PreprocessError::RawBuffer { expected: 16, actual: 15, .. }));
        let err = rgba8_image(2, 2, vec![0; 20]).unwrap_err();
        assert!(matches!(err, PreprocessError::RawBuffer { expected: 16, actual: 20, .. }));
    }

    #[test]
    fn oversized_side_rejected() {
        assert_eq!(tensor_len(224), Some(224 * 224 * 3));
        assert_eq!(tensor_len(u32::MAX), None);
        let err = Preprocessor::new(u32::MAX).unwrap_err();
        assert!(matches!(err, PreprocessError::SideTooLarge(u32::MAX)));
    }

    #[test]
    fn oversized_raw_dimensions_rejected() {
        let err = rgba8_image(u32::MAX, u32::MAX, vec![0; 16]).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::RawBuffer { expected: usize::MAX, actual: 16, .. }
        ));
    }

    #[test]
    fn filter_parses_from_str() {
        assert_eq!("Lanczos3".parse::<ResizeFilter>(), Ok(ResizeFilter::Lanczos3));
        assert_eq!("nearest".parse::<ResizeFilter>(), Ok(ResizeFilter::Nearest));
        assert!("bicubic".parse::<ResizeFilter>().is_err());
    }
}
