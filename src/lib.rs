//! # gifcut
//!
//! Cut a stretch of video into an animated GIF.
//!
//! `gifcut` opens a video with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), lets you pick a
//! time range and punch holes in it, then samples the surviving segments at
//! a target frame rate and speed, crops and scales every frame, and writes
//! the result with the [`gif`](https://crates.io/crates/gif) crate.
//!
//! ## Quick Start
//!
//! ### Export a clip
//!
//! ```no_run
//! use gifcut::{BuildOptions, Dimensions, EditSession, GifWriter, OutputSpec, TimeRange};
//!
//! let mut session = EditSession::new();
//! session.open("input.mp4")?;
//! session.set_primary(TimeRange::new(3.0, 9.0)?)?;
//!
//! let output = OutputSpec::new(15, Dimensions::new(480, 270)).with_speed_factor(1.5);
//! let summary = session.export(output, "clip.gif", &GifWriter::new(), &BuildOptions::new())?;
//! println!("{} frames", summary.frame_count);
//! # Ok::<(), gifcut::GifCutError>(())
//! ```
//!
//! ### Plan without decoding
//!
//! ```
//! use gifcut::{TimeRange, effective_segments, output_frame_count};
//!
//! let primary = TimeRange::new(0.0, 10.0)?;
//! let cut = [TimeRange::new(2.0, 4.0)?];
//! let segments = effective_segments(&primary, &cut);
//! assert_eq!(segments.len(), 2);
//!
//! let frames: usize = segments
//!     .iter()
//!     .map(|segment| output_frame_count(segment.duration(), 10.0, 1.0))
//!     .sum();
//! assert_eq!(frames, 80);
//! # Ok::<(), gifcut::GifCutError>(())
//! ```
//!
//! ## Features
//!
//! - **Trim and exclude**: one primary range, any number of merged exclusions
//! - **Frame-rate and speed control**: evenly spaced sampling per segment
//! - **Crop and scale**: clamped crop rectangles, presets, custom sizes
//! - **Random-access decoding**: keyframe seeks for video, sequential
//!   replay for animated-image inputs
//! - **Progress & cancellation**: monotonic percentages, cooperative
//!   `CancellationToken`
//! - **Validation**: check a request before spending time on it
//! - **Thumbnails**: evenly spaced timeline thumbnails and strips
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `ExportTask`: exports on a Tokio blocking thread |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod assembler;
pub mod configuration;
pub mod error;
pub mod ffmpeg;
pub mod gif;
pub mod media;
pub mod metadata;
pub mod probe;
pub mod progress;
pub mod sampler;
pub mod session;
pub mod source;
#[cfg(feature = "async")]
pub mod task;
pub mod thumbnail;
pub mod timeline;
pub mod transform;
mod utilities;
pub mod validation;

pub use assembler::{AssembledFrames, ExportRequest, ExportSummary, GifAssembler};
pub use configuration::{
    BuildOptions, DEFAULT_QUALITY, ExportPreset, OutputSpec, RECOMMENDED_SPEED_RANGE,
    ResolutionPreset,
};
pub use error::GifCutError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use crate::gif::{EncodeParameters, GifEncoder, GifWriter, frame_delays};
pub use media::{DecodeStrategy, MediaSource};
pub use metadata::VideoMetadata;
pub use probe::MediaProbe;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{
    FrameRateMode, SamplePlan, encoder_frame_rate, output_frame_count, sample_plan,
};
pub use session::{EditSession, TrimSelection};
pub use source::{FrameBuffer, FrameSource, SUPPORTED_EXTENSIONS, is_supported_path};
#[cfg(feature = "async")]
pub use task::ExportTask;
pub use thumbnail::{ThumbnailGenerator, ThumbnailOptions};
pub use timeline::{
    ExcludedSegments, TimeRange, effective_duration, effective_segments, format_timecode,
    merge_ranges,
};
pub use transform::{CropRect, Dimensions};
pub use validation::{ValidationReport, validate_metadata, validate_request};
