//! Captured images and the capture collaborator.
//!
//! A capture is a reference to image bytes plus the mode it was taken in.
//! Label captures are cropped to the guide region before they ever reach the
//! upload client; fruit captures keep the full frame.

use crate::detect::infer_content_type;
use crate::uri::{file_name_from_uri, local_path};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Capacity of the in-memory recent captures strip.
pub const DEFAULT_RECENT_CAPACITY: usize = 5;

/// What the camera was pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// A nutrition label; cropped to the guide region
    #[default]
    Label,
    /// A piece of fruit; full frame
    Fruit,
}

impl CaptureMode {
    /// Whether captures in this mode are cropped before upload.
    pub fn is_cropped(self) -> bool {
        matches!(self, Self::Label)
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label => write!(f, "label"),
            Self::Fruit => write!(f, "fruit"),
        }
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "label" | "labels" => Ok(Self::Label),
            "fruit" | "fruits" => Ok(Self::Fruit),
            other => Err(format!("unknown capture mode: {other}")),
        }
    }
}

/// A reference to captured image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedImage {
    /// Local path, `file://` URI or platform asset identifier
    pub uri: String,
    /// Capture mode
    pub mode: CaptureMode,
    /// Explicit upload file name; inferred from `uri` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Explicit content type; inferred from the file name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl CapturedImage {
    /// Reference an image taken in `mode`.
    pub fn new(uri: impl Into<String>, mode: CaptureMode) -> Self {
        Self {
            uri: uri.into(),
            mode,
            file_name: None,
            content_type: None,
        }
    }

    /// Reference a label capture.
    pub fn label(uri: impl Into<String>) -> Self {
        Self::new(uri, CaptureMode::Label)
    }

    /// Reference a fruit capture.
    pub fn fruit(uri: impl Into<String>) -> Self {
        Self::new(uri, CaptureMode::Fruit)
    }

    /// Override the upload file name.
    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Override the upload content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// File name sent with the upload part.
    pub fn upload_file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| file_name_from_uri(&self.uri))
    }

    /// Content type sent with the upload part.
    pub fn upload_content_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| infer_content_type(&self.upload_file_name()))
    }

    /// Local file backing this capture, if the URI points at one.
    pub fn local_path(&self) -> Option<PathBuf> {
        local_path(&self.uri)
    }
}

/// Something that produces captures.
pub trait Capture {
    /// Take one capture in `mode`.
    fn capture(&self, mode: CaptureMode) -> crate::Result<CapturedImage>;
}

/// Most-recent-first list of captures with a fixed capacity.
///
/// Pushing onto a full list drops the oldest entry.
#[derive(Debug, Clone)]
pub struct RecentCaptures {
    items: VecDeque<CapturedImage>,
    capacity: usize,
}

impl RecentCaptures {
    /// Empty list holding at most `capacity` captures (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a capture at the front, evicting the oldest if full.
    pub fn push(&mut self, image: CapturedImage) {
        self.items.push_front(image);
        self.items.truncate(self.capacity);
    }

    /// Remove the capture at `index` (0 is the newest).
    pub fn remove(&mut self, index: usize) -> Option<CapturedImage> {
        self.items.remove(index)
    }

    /// Capture at `index`.
    pub fn get(&self, index: usize) -> Option<&CapturedImage> {
        self.items.get(index)
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &CapturedImage> {
        self.items.iter()
    }

    /// Number of captures held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of captures held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy out the captures, newest first.
    pub fn to_vec(&self) -> Vec<CapturedImage> {
        self.items.iter().cloned().collect()
    }
}

impl Default for RecentCaptures {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY)
    }
}

impl Extend<CapturedImage> for RecentCaptures {
    fn extend<T: IntoIterator<Item = CapturedImage>>(&mut self, iter: T) {
        for image in iter {
            self.push(image);
        }
    }
}

/// Capture collaborator backed by an image file on disk.
///
/// Label captures decode the file, crop the guide region and write a JPEG
/// into `output_dir`; fruit captures reference the source file directly.
#[cfg(feature = "processing")]
#[derive(Debug, Clone)]
pub struct FileCapture {
    source: PathBuf,
    output_dir: PathBuf,
    jpeg_quality: u8,
}

#[cfg(feature = "processing")]
impl FileCapture {
    /// Capture from `source`, writing crops into `output_dir`.
    pub fn new(source: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output_dir: output_dir.into(),
            jpeg_quality: 100,
        }
    }

    /// JPEG quality for cropped output.
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    fn cropped_path(&self) -> PathBuf {
        let stem = self
            .source
            .file_stem()
            .map_or_else(|| "capture".to_string(), |s| s.to_string_lossy().into_owned());
        let stamp = chrono::Utc::now().timestamp_millis();
        self.output_dir.join(format!("{stem}-label-{stamp}.jpg"))
    }
}

#[cfg(feature = "processing")]
impl Capture for FileCapture {
    fn capture(&self, mode: CaptureMode) -> crate::Result<CapturedImage> {
        let data = std::fs::read(&self.source)?;

        if !mode.is_cropped() {
            crate::detect_format(&data)?;
            tracing::debug!(source = %self.source.display(), "Fruit capture uses the full frame");
            return Ok(CapturedImage::fruit(self.source.to_string_lossy()));
        }

        crate::detect_format(&data)?;
        let (width, height) = match crate::extract_metadata(&data) {
            Some(meta) => (meta.width, meta.height),
            None => {
                let frame = image::load_from_memory(&data)?;
                (frame.width(), frame.height())
            }
        };
        let rect = crate::compute_label_crop(width, height);
        let cropped = crate::crop_to_rect(&data, &rect, self.jpeg_quality)?;

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.cropped_path();
        std::fs::write(&path, cropped)?;

        tracing::debug!(
            source = %self.source.display(),
            output = %path.display(),
            width = rect.width,
            height = rect.height,
            "Label capture cropped to guide region"
        );

        Ok(CapturedImage::label(path.to_string_lossy()))
    }
}
