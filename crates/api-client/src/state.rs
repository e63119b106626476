//! Observable state of an extraction client.

use crate::nutrients::ExtractionResult;
use nutrivision_image::CapturedImage;
use serde::Serialize;
use std::fmt;

/// Lifecycle of the most recent submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Nothing submitted, or reset
    #[default]
    Idle,
    /// A submission is in flight
    Uploading,
    /// The last submission produced a result
    Success,
    /// The last submission failed
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Snapshot of an extraction client.
///
/// `result` is only set in [`Status::Success`] and `error` only in
/// [`Status::Failed`]. The fields are private so no other combination can be
/// built.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExtractionClientState {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<CapturedImage>,
}

impl ExtractionClientState {
    /// Idle with nothing recorded.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Upload in flight.
    pub fn uploading() -> Self {
        Self {
            status: Status::Uploading,
            ..Self::default()
        }
    }

    /// Successful upload of `images`.
    pub fn succeeded(result: ExtractionResult, images: Vec<CapturedImage>) -> Self {
        Self {
            status: Status::Success,
            result: Some(result),
            error: None,
            images,
        }
    }

    /// Failed upload.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Parsed result of the last successful upload.
    pub fn result(&self) -> Option<&ExtractionResult> {
        self.result.as_ref()
    }

    /// Message describing the last failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Images the current result was extracted from.
    pub fn images(&self) -> &[CapturedImage] {
        &self.images
    }

    /// Whether a submission is in flight.
    pub fn is_uploading(&self) -> bool {
        self.status == Status::Uploading
    }
}
