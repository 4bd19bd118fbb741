//! Random-access frame sources.
//!
//! [`FrameSource`] is the seam between the sampling engine and the decoder.
//! [`MediaSource`](crate::MediaSource) implements it on top of FFmpeg; tests
//! and benches implement it over synthetic frames.

use std::path::Path;

use image::RgbImage;

use crate::error::GifCutError;
use crate::metadata::VideoMetadata;

/// A decoded frame: 8-bit RGB, row-major, no padding.
pub type FrameBuffer = RgbImage;

/// File extensions offered when picking an input.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["mp4", "avi", "mov", "mkv", "webm", "wmv", "flv", "gif"];

/// `true` if the path carries one of [`SUPPORTED_EXTENSIONS`], ignoring case.
pub fn is_supported_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(extension))
        })
}

/// A source of decoded frames addressed by index.
///
/// Requests may arrive in any order. Implementations hide the cost of
/// seeking backward.
pub trait FrameSource {
    /// Metadata read when the source was opened.
    fn metadata(&self) -> &VideoMetadata;

    /// Decode frame `frame_number` (0-indexed).
    ///
    /// # Errors
    ///
    /// [`GifCutError::FrameOutOfRange`] past the last frame, or any decode
    /// failure.
    fn decode_frame(&mut self, frame_number: u64) -> Result<FrameBuffer, GifCutError>;

    /// Like [`decode_frame`](Self::decode_frame), but failures are logged
    /// and turned into `None`.
    fn frame(&mut self, frame_number: u64) -> Option<FrameBuffer> {
        match self.decode_frame(frame_number) {
            Ok(frame) => Some(frame),
            Err(error) => {
                log::warn!("Skipping frame {frame_number}: {error}");
                None
            }
        }
    }

    /// The frame nearest to `seconds`, with the index clamped into the
    /// source's frame range.
    fn frame_at(&mut self, seconds: f64) -> Option<FrameBuffer> {
        let frame_number = self.metadata().frame_number_at(seconds);
        self.frame(frame_number)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn metadata(&self) -> &VideoMetadata {
        (**self).metadata()
    }

    fn decode_frame(&mut self, frame_number: u64) -> Result<FrameBuffer, GifCutError> {
        (**self).decode_frame(frame_number)
    }
}
