//! Timeline thumbnails.
//!
//! A handful of evenly spaced frames, scaled to a fixed height, for drawing
//! a timeline strip. Frames that fail to decode are left out.
//!
//! # Example
//!
//! ```no_run
//! use gifcut::{MediaSource, ThumbnailGenerator, ThumbnailOptions};
//!
//! let mut source = MediaSource::open("input.mp4")?;
//! let thumbnails = ThumbnailGenerator::thumbnails(&mut source, &ThumbnailOptions::new());
//! if let Some(strip) = ThumbnailGenerator::strip(&thumbnails) {
//!     strip.save("timeline.png")?;
//! }
//! # Ok::<(), gifcut::GifCutError>(())
//! ```

use image::imageops;

use crate::configuration::BuildOptions;
use crate::error::GifCutError;
use crate::progress::{OperationType, ProgressTracker};
use crate::source::{FrameBuffer, FrameSource};
use crate::transform::{self, Dimensions};

/// How many thumbnails, and how tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct ThumbnailOptions {
    /// Maximum number of thumbnails.
    pub count: usize,
    /// Height of each thumbnail in pixels.
    pub height: u32,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            count: 10,
            height: 60,
        }
    }
}

impl ThumbnailOptions {
    /// Ten thumbnails, 60 pixels tall.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of thumbnails.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the thumbnail height. Clamped to at least 1.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height.max(1);
        self
    }
}

/// Frame indices to sample: every frame when there are no more than
/// `count`, otherwise every `frame_count / count`-th frame.
pub fn thumbnail_frame_numbers(frame_count: u64, count: usize) -> Vec<u64> {
    let count = count as u64;
    if count == 0 {
        return Vec::new();
    }
    if frame_count <= count {
        return (0..frame_count).collect();
    }
    let step = frame_count / count;
    (0..count).map(|index| index * step).collect()
}

/// Thumbnail shape for a source shape: fixed height, width scaled to keep
/// the aspect ratio (truncated, at least 1).
pub fn thumbnail_size(source: Dimensions, height: u32) -> Dimensions {
    if source.height == 0 {
        return Dimensions::new(height, height);
    }
    let width = (u64::from(source.width) * u64::from(height) / u64::from(source.height)) as u32;
    Dimensions::new(width.max(1), height)
}

/// Thumbnail helpers.
pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    /// Decode and scale the thumbnails. Never fails; bad frames are skipped.
    pub fn thumbnails<S: FrameSource + ?Sized>(
        source: &mut S,
        options: &ThumbnailOptions,
    ) -> Vec<FrameBuffer> {
        let frame_numbers = thumbnail_frame_numbers(source.metadata().frame_count, options.count);
        let size = Self::size_for(source, options);
        frame_numbers
            .into_iter()
            .filter_map(|frame_number| source.frame(frame_number))
            .map(|frame| transform::conform(frame, size))
            .collect()
    }

    /// Like [`thumbnails`](Self::thumbnails), with progress reporting and
    /// cancellation.
    ///
    /// # Errors
    ///
    /// [`GifCutError::Cancelled`] if the token fires.
    pub fn thumbnails_with_options<S: FrameSource + ?Sized>(
        source: &mut S,
        options: &ThumbnailOptions,
        build_options: &BuildOptions,
    ) -> Result<Vec<FrameBuffer>, GifCutError> {
        let frame_numbers = thumbnail_frame_numbers(source.metadata().frame_count, options.count);
        let size = Self::size_for(source, options);
        let mut tracker = ProgressTracker::new(
            build_options.progress.clone(),
            OperationType::ThumbnailGeneration,
            frame_numbers.len() as u64,
            (0, 100),
            build_options.batch_size,
        );

        let mut thumbnails = Vec::with_capacity(frame_numbers.len());
        for frame_number in frame_numbers {
            build_options.check_cancelled()?;
            if let Some(frame) = source.frame(frame_number) {
                thumbnails.push(transform::conform(frame, size));
            }
            tracker.advance(None);
        }
        tracker.finish_band();

        log::debug!("Generated {} thumbnail(s) at {size}", thumbnails.len());
        Ok(thumbnails)
    }

    /// Place thumbnails side by side, left to right. `None` if empty.
    pub fn strip(thumbnails: &[FrameBuffer]) -> Option<FrameBuffer> {
        let height = thumbnails.iter().map(FrameBuffer::height).max()?;
        let width = thumbnails.iter().map(FrameBuffer::width).sum();

        let mut strip = FrameBuffer::new(width, height);
        let mut x = 0_i64;
        for thumbnail in thumbnails {
            imageops::replace(&mut strip, thumbnail, x, 0);
            x += i64::from(thumbnail.width());
        }
        Some(strip)
    }

    fn size_for<S: FrameSource + ?Sized>(source: &S, options: &ThumbnailOptions) -> Dimensions {
        let metadata = source.metadata();
        thumbnail_size(
            Dimensions::new(metadata.width, metadata.height),
            options.height.max(1),
        )
    }
}
