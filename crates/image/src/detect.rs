//! Image format detection from magic bytes and file names.

use crate::{ImageError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Content type used when a file name carries no extension.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(\w+)$").expect("valid regex"));

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image
    Gif,
    /// WebP image
    WebP,
    /// BMP image
    Bmp,
    /// HEIC/HEIF image
    Heic,
}

impl ImageFormat {
    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Heic => "image/heic",
        }
    }

    /// Get common file extensions for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ImageFormat::Jpeg => &["jpg", "jpeg"],
            ImageFormat::Png => &["png"],
            ImageFormat::Gif => &["gif"],
            ImageFormat::WebP => &["webp"],
            ImageFormat::Bmp => &["bmp"],
            ImageFormat::Heic => &["heic", "heif"],
        }
    }

    /// Look up a format by file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        [
            ImageFormat::Jpeg,
            ImageFormat::Png,
            ImageFormat::Gif,
            ImageFormat::WebP,
            ImageFormat::Bmp,
            ImageFormat::Heic,
        ]
        .into_iter()
        .find(|format| format.extensions().contains(&ext.as_str()))
    }
}

/// Infer the upload content type from a file name.
///
/// The extension suffix decides: known formats map to their canonical MIME
/// type, any other extension becomes `image/<ext>`, and a name without an
/// extension falls back to [`DEFAULT_CONTENT_TYPE`].
///
/// # Example
/// ```
/// use nutrivision_image::infer_content_type;
///
/// assert_eq!(infer_content_type("label.PNG"), "image/png");
/// assert_eq!(infer_content_type("IMG_0001.jpg"), "image/jpeg");
/// assert_eq!(infer_content_type("scan.tiff"), "image/tiff");
/// assert_eq!(infer_content_type("capture"), "image/jpeg");
/// ```
pub fn infer_content_type(file_name: &str) -> String {
    match EXTENSION_RE.captures(file_name) {
        Some(caps) => {
            let ext = &caps[1];
            ImageFormat::from_extension(ext).map_or_else(
                || format!("image/{}", ext.to_ascii_lowercase()),
                |format| format.mime_type().to_string(),
            )
        }
        None => DEFAULT_CONTENT_TYPE.to_string(),
    }
}

/// Detect image format from magic bytes.
///
/// # Arguments
/// * `data` - First few bytes of the image file (at least 12 bytes recommended)
///
/// # Example
/// ```
/// use nutrivision_image::detect_format;
///
/// let jpeg_data = [0xFF, 0xD8, 0xFF, 0xE0];
/// assert!(matches!(detect_format(&jpeg_data), Ok(nutrivision_image::ImageFormat::Jpeg)));
/// ```
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 4 {
        return Err(ImageError::InvalidData("Not enough data for format detection".into()));
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(ImageFormat::Jpeg);
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(ImageFormat::Png);
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Ok(ImageFormat::Gif);
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Ok(ImageFormat::WebP);
    }

    if data.starts_with(b"BM") {
        return Ok(ImageFormat::Bmp);
    }

    // HEIC: ....ftypheic / heix / mif1 (what phone cameras write)
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        let brand = &data[8..12];
        if brand == b"heic" || brand == b"heix" || brand == b"mif1" {
            return Ok(ImageFormat::Heic);
        }
    }

    Err(ImageError::UnknownFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_jpeg() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
        assert_eq!(detect_format(&data).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_detect_png() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];
        assert_eq!(detect_format(&data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_heic() {
        let data = b"\x00\x00\x00\x18ftypheic\x00\x00";
        assert_eq!(detect_format(data).unwrap(), ImageFormat::Heic);
    }

    #[test]
    fn test_unknown_format() {
        let data = [0x00, 0x00, 0x00, 0x00];
        assert!(detect_format(&data).is_err());
    }

    #[test]
    fn test_infer_known_extensions() {
        assert_eq!(infer_content_type("a.jpeg"), "image/jpeg");
        assert_eq!(infer_content_type("a.JPG"), "image/jpeg");
        assert_eq!(infer_content_type("a.webp"), "image/webp");
        assert_eq!(infer_content_type("IMG_1234.HEIC"), "image/heic");
    }

    #[test]
    fn test_infer_uses_last_suffix_only() {
        assert_eq!(infer_content_type("archive.tar.png"), "image/png");
        assert_eq!(infer_content_type("photo.jpg.bak"), "image/bak");
    }

    #[test]
    fn test_infer_defaults_to_jpeg() {
        assert_eq!(infer_content_type(""), DEFAULT_CONTENT_TYPE);
        assert_eq!(infer_content_type("001"), DEFAULT_CONTENT_TYPE);
        assert_eq!(infer_content_type("trailing."), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(ImageFormat::from_extension("heif"), Some(ImageFormat::Heic));
        assert_eq!(ImageFormat::from_extension("tiff"), None);
    }
}
