//! Label crop geometry.
//!
//! Label captures keep only the guide region drawn over the viewfinder: 70%
//! of the frame width and 60% of its height, centered on both axes. Fruit
//! captures are never cropped.

#[cfg(feature = "processing")]
use crate::{ImageError, Result};
use serde::{Deserialize, Serialize};

/// Guide region width as a percentage of the frame width.
pub const LABEL_WIDTH_PERCENT: f64 = 70.0;

/// Guide region height as a percentage of the frame height.
pub const LABEL_HEIGHT_PERCENT: f64 = 60.0;

/// A crop rectangle in (possibly fractional) pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub origin_x: f64,
    /// Top edge
    pub origin_y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Snap to whole pixels inside a `image_width` x `image_height` frame.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelRect {
        let x = (self.origin_x.max(0.0).round() as u32).min(image_width);
        let y = (self.origin_y.max(0.0).round() as u32).min(image_height);
        let width = (self.width.max(0.0).round() as u32).min(image_width - x);
        let height = (self.height.max(0.0).round() as u32).min(image_height - y);
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

/// A crop rectangle in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

/// Compute the label guide-region crop for a frame.
///
/// # Example
/// ```
/// use nutrivision_image::compute_label_crop;
///
/// let rect = compute_label_crop(1000, 2000);
/// assert_eq!((rect.width, rect.height), (700.0, 1200.0));
/// assert_eq!((rect.origin_x, rect.origin_y), (150.0, 400.0));
/// ```
pub fn compute_label_crop(image_width: u32, image_height: u32) -> Rect {
    let image_width = f64::from(image_width);
    let image_height = f64::from(image_height);

    // Multiply before dividing so round sizes stay exact.
    let width = image_width * LABEL_WIDTH_PERCENT / 100.0;
    let height = image_height * LABEL_HEIGHT_PERCENT / 100.0;

    Rect {
        origin_x: (image_width - width) / 2.0,
        origin_y: (image_height - height) / 2.0,
        width,
        height,
    }
}

/// Crop encoded image bytes to `rect` and re-encode as JPEG.
#[cfg(feature = "processing")]
pub fn crop_to_rect(data: &[u8], rect: &Rect, quality: u8) -> Result<Vec<u8>> {
    use image::{DynamicImage, ImageOutputFormat};
    use std::io::Cursor;

    let img = image::load_from_memory(data)?;
    let pixels = rect.to_pixels(img.width(), img.height());

    if pixels.width == 0 || pixels.height == 0 {
        return Err(ImageError::CropOutOfBounds {
            x: pixels.x,
            y: pixels.y,
            width: pixels.width,
            height: pixels.height,
            image_width: img.width(),
            image_height: img.height(),
        });
    }

    let cropped = img.crop_imm(pixels.x, pixels.y, pixels.width, pixels.height);
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(cropped.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_label_crop_portrait() {
        let rect = compute_label_crop(1000, 2000);
        assert_eq!(rect.width, 700.0);
        assert_eq!(rect.height, 1200.0);
        assert_eq!(rect.origin_x, 150.0);
        assert_eq!(rect.origin_y, 400.0);
    }

    #[test]
    fn test_label_crop_odd_sizes_are_fractional() {
        let rect = compute_label_crop(1001, 7);
        assert!((rect.width - 700.7).abs() < 1e-9);
        assert!((rect.origin_x - 150.15).abs() < 1e-9);
        assert!((rect.height - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_to_pixels_stays_inside_frame() {
        let rect = Rect {
            origin_x: 90.0,
            origin_y: -5.0,
            width: 50.0,
            height: 500.0,
        };
        let px = rect.to_pixels(100, 100);
        assert_eq!(px, PixelRect { x: 90, y: 0, width: 10, height: 100 });
    }

    #[cfg(feature = "processing")]
    #[test]
    fn test_crop_to_rect_dimensions() {
        use image::{ImageOutputFormat, Rgb, RgbImage};
        use std::io::Cursor;

        let frame = RgbImage::from_pixel(100, 200, Rgb([200, 180, 20]));
        let mut encoded = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(frame)
            .write_to(&mut encoded, ImageOutputFormat::Png)
            .unwrap();

        let rect = compute_label_crop(100, 200);
        let jpeg = crop_to_rect(encoded.get_ref(), &rect, 90).unwrap();

        let cropped = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (70, 120));
        assert_eq!(crate::detect_format(&jpeg).unwrap(), crate::ImageFormat::Jpeg);
    }

    proptest! {
        #[test]
        fn prop_label_crop_is_centered_and_inside(w in 1u32..10_000, h in 1u32..10_000) {
            let rect = compute_label_crop(w, h);
            prop_assert!(rect.origin_x >= 0.0 && rect.origin_y >= 0.0);
            prop_assert!(rect.origin_x + rect.width <= f64::from(w) + 1e-6);
            prop_assert!(rect.origin_y + rect.height <= f64::from(h) + 1e-6);
            let left = rect.origin_x;
            let right = f64::from(w) - rect.origin_x - rect.width;
            prop_assert!((left - right).abs() < 1e-6);
        }
    }
}
