//! Source metadata.
//!
//! [`VideoMetadata`] is read once when a source is opened and stays fixed
//! for the lifetime of that source.

use std::time::Duration;

use crate::error::GifCutError;
use crate::timeline::TimeRange;

/// Metadata for the video stream of an opened source.
///
/// # Example
///
/// ```
/// use gifcut::VideoMetadata;
///
/// let metadata = VideoMetadata::new(1920, 1080, 30.0, 300);
/// assert_eq!(metadata.duration_seconds(), 10.0);
/// assert_eq!(metadata.frame_number_at(2.5), 75);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (average rate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Total number of frames.
    pub frame_count: u64,
    /// `frame_count / frames_per_second`.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"gif"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"gif"`).
    pub format: String,
}

impl VideoMetadata {
    /// Build metadata from the four stream properties, deriving the
    /// duration. Codec and format are left as `"unknown"`.
    pub fn new(width: u32, height: u32, frames_per_second: f64, frame_count: u64) -> Self {
        let duration = if frames_per_second > 0.0 {
            Duration::from_secs_f64(frame_count as f64 / frames_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            width,
            height,
            frames_per_second,
            frame_count,
            duration,
            codec: "unknown".to_string(),
            format: "unknown".to_string(),
        }
    }

    /// Set the codec and container names.
    pub fn with_names(mut self, codec: impl Into<String>, format: impl Into<String>) -> Self {
        self.codec = codec.into();
        self.format = format.into();
        self
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f64 / self.height as f64
    }

    /// Nearest frame index for a time in seconds, clamped to the valid
    /// index range. Returns 0 for an empty source.
    pub fn frame_number_at(&self, seconds: f64) -> u64 {
        if self.frame_count == 0 || !seconds.is_finite() {
            return 0;
        }
        let raw = (seconds * self.frames_per_second).round();
        if raw <= 0.0 {
            0
        } else {
            (raw as u64).min(self.frame_count - 1)
        }
    }

    /// The range covering the whole source.
    ///
    /// # Errors
    ///
    /// Returns [`GifCutError::InvalidRange`] when the source has zero duration.
    pub fn full_range(&self) -> Result<TimeRange, GifCutError> {
        TimeRange::new(0.0, self.duration_seconds())
    }
}
