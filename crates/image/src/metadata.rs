//! Header-only metadata, enough to plan a crop without decoding pixels.

use crate::crop::{compute_label_crop, Rect};
use crate::{detect_format, ImageFormat};
use serde::{Deserialize, Serialize};

/// Frame orientation as the preview screen labels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide
    Vertical,
    /// Wider than tall
    Horizontal,
    /// Equal sides
    Square,
}

/// Image metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// File size in bytes
    pub size_bytes: usize,
}

impl ImageMetadata {
    /// Orientation of the frame.
    pub fn orientation(&self) -> Orientation {
        match self.width.cmp(&self.height) {
            std::cmp::Ordering::Less => Orientation::Vertical,
            std::cmp::Ordering::Greater => Orientation::Horizontal,
            std::cmp::Ordering::Equal => Orientation::Square,
        }
    }

    /// Guide-region crop a label capture of this frame would use.
    pub fn label_crop(&self) -> Rect {
        compute_label_crop(self.width, self.height)
    }
}

/// Read dimensions from the file header.
///
/// Supports JPEG, PNG and GIF; other formats return `None` and need a full
/// decode.
pub fn extract_metadata(data: &[u8]) -> Option<ImageMetadata> {
    let format = detect_format(data).ok()?;

    let (width, height) = match format {
        ImageFormat::Jpeg => jpeg_dimensions(data)?,
        ImageFormat::Png => png_dimensions(data)?,
        ImageFormat::Gif => gif_dimensions(data)?,
        _ => return None,
    };

    Some(ImageMetadata {
        width,
        height,
        format,
        size_bytes: data.len(),
    })
}

/// Walk JPEG segments until a start-of-frame marker.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;

    while i + 4 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            let height = u32::from(u16::from_be_bytes([data[i + 5], data[i + 6]]));
            let width = u32::from(u16::from_be_bytes([data[i + 7], data[i + 8]]));
            return Some((width, height));
        }

        // Standalone markers carry no length field
        if marker == 0xD8 || marker == 0xD9 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            i += 2;
        } else if i + 3 < data.len() {
            let length = usize::from(u16::from_be_bytes([data[i + 2], data[i + 3]]));
            i += 2 + length;
        } else {
            break;
        }
    }

    None
}

fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // 8-byte signature, then the IHDR chunk: length, type, width, height
    if data.len() < 24 || &data[12..16] != b"IHDR" {
        return None;
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);

    Some((width, height))
}

fn gif_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 10 {
        return None;
    }

    let width = u32::from(u16::from_le_bytes([data[6], data[7]]));
    let height = u32::from(u16::from_le_bytes([data[8], data[9]]));

    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data
    }

    #[test]
    fn test_png_header_dimensions() {
        let meta = extract_metadata(&png_header(1000, 2000)).unwrap();
        assert_eq!((meta.width, meta.height), (1000, 2000));
        assert_eq!(meta.format, ImageFormat::Png);
        assert_eq!(meta.orientation(), Orientation::Vertical);
    }

    #[test]
    fn test_label_crop_from_header() {
        let meta = extract_metadata(&png_header(1000, 2000)).unwrap();
        let rect = meta.label_crop();
        assert_eq!(rect.width, 700.0);
        assert_eq!(rect.height, 1200.0);
    }

    #[test]
    fn test_gif_header_dimensions() {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&640u16.to_le_bytes());
        data.extend_from_slice(&480u16.to_le_bytes());
        let meta = extract_metadata(&data).unwrap();
        assert_eq!((meta.width, meta.height), (640, 480));
        assert_eq!(meta.orientation(), Orientation::Horizontal);
    }

    #[test]
    fn test_truncated_header() {
        assert!(extract_metadata(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]).is_none());
    }
}
