//! Error types for the `gifcut` crate.
//!
//! [`GifCutError`] is returned by every fallible operation, from opening a
//! source to writing the final GIF. Per-frame decode failures are recovered
//! inside the assembler and only surface through logging; everything else
//! propagates to the caller.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `gifcut` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GifCutError {
    /// The source could not be opened or probed.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The requested frame number is past the last frame.
    #[error("Frame {frame_number} is out of range (video has {total_frames} frames)")]
    FrameOutOfRange {
        /// The frame number that was requested.
        frame_number: u64,
        /// The total number of frames in the video.
        total_frames: u64,
    },

    /// A time range whose start is not strictly before its end, or that
    /// contains a non-finite bound.
    #[error("Invalid range: start ({start}) must be less than end ({end})")]
    InvalidRange {
        /// The start of the range, in seconds.
        start: f64,
        /// The end of the range, in seconds.
        end: f64,
    },

    /// The playback speed factor is zero, negative, or not finite.
    #[error("Speed factor must be a positive finite number, got {0}")]
    InvalidSpeedFactor(f64),

    /// Quality is outside `[0, 1]`.
    #[error("Quality must be within 0.0..=1.0, got {0}")]
    InvalidQuality(f32),

    /// The output frame rate is zero.
    #[error("Output frame rate must be greater than zero")]
    InvalidFrameRate,

    /// Output dimensions are zero or exceed what a GIF can hold.
    #[error("Invalid output dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Every sampled frame failed to decode, or no segment produced samples.
    #[error("No frames produced ({segments} segment(s), {samples} sample(s) attempted)")]
    NoFramesProduced {
        /// Number of effective segments that were planned.
        segments: usize,
        /// Number of sample positions that were attempted.
        samples: usize,
    },

    /// GIF encoding failed.
    #[error("GIF encoding error: {0}")]
    GifEncodeError(String),

    /// A session operation was called before any source was loaded.
    #[error("No source loaded")]
    NoSourceLoaded,

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for GifCutError {
    fn from(error: FfmpegError) -> Self {
        GifCutError::FfmpegError(error.to_string())
    }
}
